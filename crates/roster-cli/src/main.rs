//! `roster` CLI — expand schedules and check staff conflicts from the command line.
//!
//! Every subcommand reads an event snapshot (a JSON array of schedule events)
//! from a file or stdin and prints plain text, or JSON with `--json`.
//!
//! ## Usage
//!
//! ```sh
//! # Dates one event occupies in January
//! roster expand -i schedule.json --event series-am --from 2024-01-01 --to 2024-01-31
//!
//! # Ids of every double-booked event
//! roster conflicts -i schedule.json --from 2024-01-01 --to 2024-01-31
//!
//! # Overlapping pairs with overlap minutes
//! roster conflicts -i schedule.json --from 2024-01-01 --to 2024-01-31 --pairs
//!
//! # What would a proposed event collide with?
//! roster check -i schedule.json --candidate consult.json --from 2024-01-01 --to 2024-01-31
//! ```
//!
//! Logs go to stderr; set `RUST_LOG=roster_engine=debug` to see why events
//! were skipped.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use roster_engine::conflict::{self, CandidateCheck, EditScope};
use roster_engine::{expander, snapshot, DateWindow, EngineConfig, ExceptionIndex, ScheduleEvent};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "roster",
    version,
    about = "Expand recurring shifts and detect staff double-bookings"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Years after its start at which an open-ended recurrence stops
    #[arg(long, global = true, env = "ROSTER_HORIZON_YEARS")]
    horizon_years: Option<u32>,

    /// Days of padding around a candidate's own dates when checking it
    #[arg(long, global = true, env = "ROSTER_PADDING_DAYS")]
    padding_days: Option<u32>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

/// Snapshot source and date window shared by every subcommand.
#[derive(Args)]
struct WindowArgs {
    /// Event snapshot JSON file (reads from stdin if omitted)
    #[arg(short, long)]
    input: Option<String>,
    /// First day of the window (YYYY-MM-DD)
    #[arg(long)]
    from: NaiveDate,
    /// Last day of the window, inclusive (YYYY-MM-DD)
    #[arg(long)]
    to: NaiveDate,
}

#[derive(Subcommand)]
enum Commands {
    /// List the dates one event occupies within the window
    Expand {
        #[command(flatten)]
        window: WindowArgs,
        /// Id of the event to expand
        #[arg(long)]
        event: String,
    },
    /// Report every event that overlaps another event of the same staff member
    Conflicts {
        #[command(flatten)]
        window: WindowArgs,
        /// Print each overlapping pair instead of just event ids
        #[arg(long)]
        pairs: bool,
    },
    /// Check a proposed event against the snapshot before saving it
    Check {
        #[command(flatten)]
        window: WindowArgs,
        /// Proposed event JSON file
        #[arg(long)]
        candidate: String,
        /// What kind of edit the candidate is
        #[arg(long, value_enum, default_value_t = ScopeArg::New)]
        scope: ScopeArg,
        /// Series the new exception belongs to (with --scope exception)
        #[arg(long)]
        series_id: Option<String>,
        /// Occurrence date the new exception replaces (with --scope exception)
        #[arg(long)]
        replaces: Option<NaiveDate>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ScopeArg {
    /// A brand-new event or series
    New,
    /// A new exception replacing one occurrence of a series
    Exception,
    /// An edit of one existing event or exception instance
    Single,
    /// An edit of a whole series
    Series,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = EngineConfig::default();
    if let Some(years) = cli.horizon_years {
        config.horizon_years = years;
    }
    if let Some(days) = cli.padding_days {
        config.candidate_padding_days = days;
    }

    let output = match cli.command {
        Commands::Expand { window, event } => {
            let (events, window) = load(&window)?;
            let target = events
                .iter()
                .find(|e| e.id == event)
                .with_context(|| format!("No event with id '{}' in snapshot", event))?;
            let exceptions = ExceptionIndex::from_events(&events);
            let dates: Vec<String> =
                expander::expand_occurrences_with_config(target, &window, &exceptions, &config)
                    .iter()
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .collect();
            render(&dates, cli.json)?
        }
        Commands::Conflicts { window, pairs } => {
            let (events, window) = load(&window)?;
            if pairs {
                let pairs = conflict::detect_conflict_pairs_with_config(&events, &window, &config);
                if cli.json {
                    serde_json::to_string_pretty(&pairs)?
                } else {
                    pairs
                        .iter()
                        .map(|c| {
                            format!(
                                "{} {} {} <-> {} ({} min)",
                                c.slot_a.staff,
                                c.slot_a.start.format("%Y-%m-%d %H:%M"),
                                c.slot_a.event_id,
                                c.slot_b.event_id,
                                c.overlap_minutes
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            } else {
                let ids: Vec<String> = conflict::detect_all_with_config(&events, &window, &config)
                    .into_iter()
                    .collect();
                render(&ids, cli.json)?
            }
        }
        Commands::Check {
            window,
            candidate,
            scope,
            series_id,
            replaces,
        } => {
            let (events, window) = load(&window)?;
            let json = read_input(Some(candidate.as_str()))?;
            let proposed = snapshot::parse_event(&json)
                .with_context(|| format!("Failed to parse candidate event: {}", candidate))?;
            let scope = edit_scope(scope, series_id, replaces)?;
            let labels = CandidateCheck::new(&proposed, scope)
                .with_config(config)
                .conflict_labels(&events, &window);
            render(&labels, cli.json)?
        }
    };

    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

fn load(args: &WindowArgs) -> Result<(Vec<ScheduleEvent>, DateWindow)> {
    let window = DateWindow::new(args.from, args.to).context("Invalid --from/--to window")?;
    let json = read_input(args.input.as_deref())?;
    let events = snapshot::parse_snapshot(&json).context("Failed to parse event snapshot")?;
    tracing::debug!(events = events.len(), from = %args.from, to = %args.to, "loaded snapshot");
    Ok((events, window))
}

fn edit_scope(
    scope: ScopeArg,
    series_id: Option<String>,
    replaces: Option<NaiveDate>,
) -> Result<EditScope> {
    Ok(match scope {
        ScopeArg::New => EditScope::NewEvent,
        ScopeArg::Single => EditScope::SingleOccurrence,
        ScopeArg::Series => EditScope::EntireSeries,
        ScopeArg::Exception => match (series_id, replaces) {
            (Some(series_id), Some(date)) => EditScope::NewException { series_id, date },
            _ => bail!("--scope exception requires --series-id and --replaces"),
        },
    })
}

/// One item per line, or a pretty JSON array.
fn render(items: &[String], json: bool) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(items)?)
    } else {
        Ok(items.join("\n"))
    }
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
