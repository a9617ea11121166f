use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};
use twain_core::{
    format_local, parse_local_to_utc, FreeInterval, FreeIntervalGenerator, OperatingHours,
    ScheduleError, ScheduleSummary, Task, TaskScheduler,
};
use twain_ingest::{last_due_date, load_busy, load_tasks, normalize, order_by_due_date, BusyFormat};

mod calendar;
mod config;
mod state;

#[derive(Parser, Debug)]
#[command(
    name = "twain",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TWAIN_BUILD_SHA"), ")"),
    about = "Place pending tasks into the free time of your calendar"
)]
struct Cli {
    /// Debug logging (overridden by TWAIN_LOG)
    #[arg(long, short, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Errors only (overridden by TWAIN_LOG)
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List free intervals inside operating hours
    Free {
        /// Busy-interval export
        #[arg(long)]
        busy: PathBuf,

        #[arg(long, value_enum, default_value_t = FormatArg::Google)]
        format: FormatArg,

        /// Earliest time to consider (RFC3339 or "YYYY-MM-DD HH:MM" local; default: now)
        #[arg(long)]
        from: Option<String>,

        /// End of the sweep (default: 7 days after --from)
        #[arg(long)]
        until: Option<String>,
    },

    /// Schedule tasks into free time before their due dates
    Schedule {
        /// JSON array of tasks
        #[arg(long)]
        tasks: PathBuf,

        /// Busy-interval export
        #[arg(long)]
        busy: PathBuf,

        #[arg(long, value_enum, default_value_t = FormatArg::Google)]
        format: FormatArg,

        /// Earliest time to consider (RFC3339 or "YYYY-MM-DD HH:MM" local; default: now)
        #[arg(long)]
        from: Option<String>,

        /// Print the annotated task list as JSON
        #[arg(long)]
        json: bool,

        /// Also write scheduled tasks to an ICS file
        #[arg(long)]
        ics: Option<PathBuf>,
    },

    /// Manage ~/.twain/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Google Calendar freeBusy JSON response
    Google,
    /// CSV with start,end[,calendar] columns
    Csv,
}

impl From<FormatArg> for BusyFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Google => BusyFormat::Google,
            FormatArg::Csv => BusyFormat::Csv,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    match cli.command {
        Command::Free {
            busy,
            format,
            from,
            until,
        } => {
            let hours = config::load_config()?.operating_hours()?;
            list_free(hours, busy, format.into(), from, until)?;
        }

        Command::Schedule {
            tasks,
            busy,
            format,
            from,
            json,
            ics,
        } => {
            let cfg = config::load_config()?;
            let hours = cfg.operating_hours()?;
            let timeout = std::time::Duration::from_secs(cfg.solver.timeout_secs);
            schedule(hours, timeout, tasks, busy, format.into(), from, json, ics).await?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                println!("# {}", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("TWAIN_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

/// RFC3339, or local "YYYY-MM-DD HH:MM" in the user's zone.
fn parse_time_arg(value: &str, tz: Tz) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value.trim()) {
        return Ok(dt.with_timezone(&Utc));
    }
    Ok(parse_local_to_utc(value, tz)?)
}

fn resolve_from(from: Option<String>, tz: Tz) -> Result<DateTime<Utc>> {
    match from {
        Some(v) => parse_time_arg(&v, tz).context("--from"),
        None => ceil_to_minute(Utc::now()),
    }
}

/// Earliest whole minute at or after `instant`.
fn ceil_to_minute(instant: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let floor = instant.duration_trunc(TimeDelta::minutes(1))?;
    Ok(if floor < instant {
        floor + TimeDelta::minutes(1)
    } else {
        floor
    })
}

fn load_normalized_busy(
    path: &Path,
    format: BusyFormat,
    tz: Tz,
) -> Result<Vec<twain_core::BusyInterval>> {
    let raw = load_busy(path, format, tz)?;
    let normalized = normalize(raw);
    if normalized.rejected > 0 {
        warn!(
            rejected = normalized.rejected,
            "dropped busy rows with start after end"
        );
    }
    Ok(normalized.intervals)
}

fn list_free(
    hours: OperatingHours,
    busy: PathBuf,
    format: BusyFormat,
    from: Option<String>,
    until: Option<String>,
) -> Result<()> {
    let tz = hours.timezone();
    let from = resolve_from(from, tz)?;
    let until = match until {
        Some(v) => parse_time_arg(&v, tz).context("--until")?,
        None => from + TimeDelta::days(7),
    };
    if until <= from {
        bail!("--until must be after --from");
    }

    let busy = load_normalized_busy(&busy, format, tz)?;
    let free = FreeIntervalGenerator::new(hours).generate_until(from, until, &busy);

    println!(
        "Free time {} -> {} ({})\n",
        format_local(from, tz),
        format_local(until, tz),
        tz
    );
    if free.is_empty() {
        println!("(none)");
    }
    for f in &free {
        println!(
            "- {} -> {}  ({} min)",
            format_local(f.start, tz),
            format_local(f.end, tz),
            f.duration().num_minutes()
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn schedule(
    hours: OperatingHours,
    timeout: std::time::Duration,
    tasks: PathBuf,
    busy: PathBuf,
    format: BusyFormat,
    from: Option<String>,
    json: bool,
    ics: Option<PathBuf>,
) -> Result<()> {
    let tz = hours.timezone();
    let from = resolve_from(from, tz)?;

    let mut tasks = load_tasks(&tasks)?;
    order_by_due_date(&mut tasks);
    let Some(horizon) = last_due_date(&tasks) else {
        println!("No tasks to schedule.");
        return Ok(());
    };

    let busy = load_normalized_busy(&busy, format, tz)?;
    info!(tasks = tasks.len(), busy = busy.len(), %horizon, "scheduling");

    let free = FreeIntervalGenerator::new(hours).generate_until(from, horizon, &busy);
    let scheduled = solve(tasks, free, timeout).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&scheduled)?);
    } else {
        print_schedule(&scheduled, tz);
    }

    if let Some(path) = ics {
        let events = calendar::scheduled_to_events(&scheduled);
        std::fs::write(&path, calendar::events_to_ics(&events))
            .with_context(|| format!("write {}", path.display()))?;
        eprintln!("Wrote {} events to {}", events.len(), path.display());
    }

    Ok(())
}

/// Runs the synchronous core off the runtime. The search itself gives up at
/// the deadline, so the blocking thread is released when the timeout fires.
async fn solve(
    tasks: Vec<Task>,
    free: Vec<FreeInterval>,
    timeout: std::time::Duration,
) -> Result<Vec<Task>> {
    let deadline = Instant::now() + timeout;
    let run = tokio::task::spawn_blocking(move || {
        TaskScheduler::new()
            .with_deadline(deadline)
            .schedule(tasks, &free)
    });
    match run.await.context("scheduler task failed")? {
        Ok(scheduled) => Ok(scheduled),
        Err(ScheduleError::DeadlineExceeded { frames }) => Err(anyhow!(
            "scheduling did not finish within {}s ({frames} branches explored)",
            timeout.as_secs()
        )),
        Err(e) => Err(e.into()),
    }
}

fn print_schedule(tasks: &[Task], tz: Tz) {
    println!("# Schedule ({})\n", tz);
    for t in tasks {
        match (t.scheduled_time, t.scheduled_end()) {
            (Some(start), Some(end)) => println!(
                "[ok] {} | {} | {} -> {} | due {}",
                t.id,
                t.name,
                format_local(start, tz),
                format_local(end, tz),
                format_local(t.due_date, tz)
            ),
            _ => println!(
                "[--] {} | {} | {} min | could not schedule before {}",
                t.id,
                t.name,
                t.duration_minutes,
                format_local(t.due_date, tz)
            ),
        }
    }

    let summary = ScheduleSummary::from_tasks(tasks);
    println!(
        "\nScheduled {}/{} tasks (score {:.2})",
        summary.scheduled,
        summary.total,
        twain_core::branch_score(tasks)
    );
    if !summary.all_scheduled() {
        println!("Unscheduled: {}", summary.unscheduled_ids.join(", "));
    }
}
