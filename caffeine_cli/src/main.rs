use caffeine_core::history::{filter_period, to_intakes};
use caffeine_core::*;
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "caff")]
#[command(about = "Caffeine intake tracker with metabolism charts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Load config from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Render times in UTC instead of local time
    #[arg(long, global = true)]
    utc: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log an intake
    Log {
        /// Drink name from the catalog (see `caff drinks`)
        #[arg(long)]
        drink: Option<String>,

        /// Caffeine amount in mg (overrides the drink's default)
        #[arg(long, required_unless_present = "drink")]
        amount: Option<f64>,

        /// When the intake happened (RFC 3339, default now)
        #[arg(long)]
        at: Option<String>,
    },

    /// List available drinks
    Drinks,

    /// Show the current caffeine level (default)
    Level {
        /// Instant to evaluate (RFC 3339, default now)
        #[arg(long)]
        at: Option<String>,
    },

    /// Print the metabolism chart
    Chart {
        /// Window length: 24h, 48h, 72h or 1w
        #[arg(long)]
        range: Option<String>,

        /// Window anchoring: centered or look_back
        #[arg(long)]
        anchor: Option<String>,

        /// Merge intakes of the same drink into one line
        #[arg(long)]
        by_source: bool,

        /// Reference instant (RFC 3339, default now)
        #[arg(long)]
        now: Option<String>,

        /// Write the samples to a CSV file instead of printing
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Also write the sleep intervals to a CSV file
        #[arg(long, requires = "csv")]
        sleep_csv: Option<PathBuf>,
    },

    /// List logged intakes
    History {
        /// today, week, month or all
        #[arg(long, default_value = "today")]
        period: String,

        /// Reference instant (RFC 3339, default now)
        #[arg(long)]
        now: Option<String>,
    },

    /// Delete a logged intake
    Remove {
        /// Intake id as shown by `caff history`
        id: uuid::Uuid,
    },

    /// Show or change the sleep schedule
    Sleep {
        /// Bedtime (HH:MM)
        #[arg(long)]
        start: Option<String>,

        /// Wake-up time (HH:MM)
        #[arg(long)]
        end: Option<String>,
    },

    /// Show the effective configuration
    Config {
        /// Write the defaults to the config file if none exists
        #[arg(long)]
        init: bool,
    },
}

struct CsvOutputs {
    chart: Option<PathBuf>,
    sleep: Option<PathBuf>,
}

struct Paths {
    intake_log: PathBuf,
    preferences: PathBuf,
}

impl Paths {
    fn new(data_dir: &Path) -> Self {
        Self {
            intake_log: data_dir.join("intakes.jsonl"),
            preferences: data_dir.join("preferences.json"),
        }
    }
}

fn main() -> Result<()> {
    caffeine_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) if path.exists() => Config::load_from(path)?,
        Some(path) => {
            if !matches!(cli.command, Some(Commands::Config { init: true })) {
                tracing::warn!("Config file {:?} not found, using defaults", path);
            }
            Config::default()
        }
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    let paths = Paths::new(&data_dir);
    tracing::debug!("Using data dir {:?}", data_dir);

    if cli.utc {
        run(cli, &config, &paths, Utc)
    } else {
        run(cli, &config, &paths, Local)
    }
}

fn run<Tz>(cli: Cli, config: &Config, paths: &Paths, tz: Tz) -> Result<()>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match cli.command {
        Some(Commands::Log { drink, amount, at }) => cmd_log(paths, config, drink, amount, at),
        Some(Commands::Drinks) => cmd_drinks(config),
        Some(Commands::Level { at }) => cmd_level(paths, at),
        Some(Commands::Chart {
            range,
            anchor,
            by_source,
            now,
            csv,
            sleep_csv,
        }) => {
            let outputs = CsvOutputs {
                chart: csv,
                sleep: sleep_csv,
            };
            cmd_chart(paths, config, range, anchor, by_source, now, outputs, tz)
        }
        Some(Commands::History { period, now }) => cmd_history(paths, &period, now, tz),
        Some(Commands::Remove { id }) => cmd_remove(paths, id),
        Some(Commands::Sleep { start, end }) => cmd_sleep(paths, start, end),
        Some(Commands::Config { init }) => cmd_config(cli.config.as_deref(), config, init),
        None => cmd_level(paths, None),
    }
}

fn parse_now(value: Option<String>) -> Result<DateTime<Utc>> {
    value.as_deref().map(parse_timestamp).unwrap_or_else(|| Ok(Utc::now()))
}

fn load_catalog(config: &Config) -> Result<Catalog> {
    let catalog = build_catalog(&config.drinks);
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }
    Ok(catalog)
}

fn cmd_log(
    paths: &Paths,
    config: &Config,
    drink: Option<String>,
    amount: Option<f64>,
    at: Option<String>,
) -> Result<()> {
    let timestamp = parse_now(at)?;

    let (amount, drink_ref) = match drink {
        Some(name) => {
            let catalog = load_catalog(config)?;
            let drink = catalog
                .find(&name)
                .ok_or_else(|| Error::NotFound(format!("drink {:?}", name)))?;
            (amount.unwrap_or(drink.caffeine_mg), Some(drink.to_ref()))
        }
        None => {
            let amount = amount.ok_or_else(|| {
                Error::InvalidIntake("either --drink or --amount is required".into())
            })?;
            (amount, None)
        }
    };

    let record = IntakeRecord::new(amount, timestamp, drink_ref)?;
    let mut sink = JsonlSink::new(&paths.intake_log);
    sink.append(&record)?;

    let name = record
        .drink
        .as_ref()
        .map(|d| d.name.as_str())
        .unwrap_or("Custom drink");
    println!("✓ Logged {} ({:.0} mg)", name, record.amount);
    println!("  id: {}", record.id);
    Ok(())
}

fn cmd_drinks(config: &Config) -> Result<()> {
    let catalog = load_catalog(config)?;
    for drink in &catalog.drinks {
        let marker = if drink.is_custom { " (custom)" } else { "" };
        println!("  {:<24} {:>4.0} mg{}", drink.name, drink.caffeine_mg, marker);
    }
    Ok(())
}

fn cmd_level(paths: &Paths, at: Option<String>) -> Result<()> {
    let at = parse_now(at)?;
    let intakes = to_intakes(&read_intakes(&paths.intake_log)?);

    let total = total_level(&intakes, at);
    println!("Current level: {:.0} mg", total);

    for (source, level) in levels_by_source(&intakes, at) {
        if level.round() > 0.0 {
            println!("  {:<24} {:>4.0} mg", source, level);
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_chart<Tz>(
    paths: &Paths,
    config: &Config,
    range: Option<String>,
    anchor: Option<String>,
    by_source: bool,
    now: Option<String>,
    outputs: CsvOutputs,
    tz: Tz,
) -> Result<()>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let now = parse_now(now)?;
    let range = match range {
        Some(r) => r.parse::<RangeSpec>()?,
        None => config.chart.range,
    };
    let anchor = match anchor {
        Some(a) => a.parse::<Anchor>()?,
        None => config.chart.anchor,
    };
    let mode = if by_source {
        SeriesMode::BySource
    } else {
        config.chart.series
    };

    let plan = plan(range, now, anchor)?;

    // Intakes older than the window still contribute their tail
    let lookback = Duration::hours(range.total_hours() + 48);
    let records = load_recent_intakes(&paths.intake_log, now, lookback)?;
    let intakes = to_intakes(&records);

    let Some(chart) = sample(&intakes, &plan, mode, label_formatter(range, tz.clone())) else {
        println!("No caffeine intake data to display");
        return Ok(());
    };

    let sleep = Preferences::load(&paths.preferences)?.sleep_window()?;
    let nights = clip_to_window(&resolve(&sleep, plan.start, plan.end, &tz), plan.start, plan.end);

    if let Some(path) = outputs.chart {
        caffeine_core::export::save_chart_csv(&chart, &path)?;
        println!("✓ Wrote {} samples to {}", chart.points.len(), path.display());

        if let Some(path) = outputs.sleep {
            caffeine_core::export::save_intervals_csv(&nights, &path)?;
            println!("✓ Wrote {} sleep intervals to {}", nights.len(), path.display());
        }
        return Ok(());
    }

    print_chart(&chart, &nights, anchor);
    Ok(())
}

fn print_chart(chart: &Chart, nights: &[ResolvedInterval], anchor: Anchor) {
    println!(
        "Caffeine level, {} window ({:?}), every {} min",
        chart.plan.range,
        anchor,
        chart.plan.interval.num_minutes()
    );
    let names: Vec<_> = chart.series.iter().map(|s| s.name.as_str()).collect();
    println!("  series: {}", names.join(", "));
    println!();

    for (index, point) in chart.points.iter().enumerate() {
        let asleep = nights.iter().any(|n| n.contains(point.at));
        let marker = if chart.now_index == Some(index) {
            " ◀ now"
        } else {
            ""
        };
        println!(
            "{} {:<14} {:>5.0} mg{}",
            if asleep { "z" } else { " " },
            point.label,
            point.total(),
            marker
        );
    }

    if let Some(peak) = chart.peak() {
        println!();
        println!("Peak: {:.0} mg at {}", peak.total(), peak.label);
    }
}

fn cmd_history<Tz: TimeZone>(paths: &Paths, period: &str, now: Option<String>, tz: Tz) -> Result<()>
where
    Tz::Offset: fmt::Display,
{
    let period: Period = period.parse()?;
    let now = parse_now(now)?;
    let records = filter_period(&read_intakes(&paths.intake_log)?, period, now, &tz);

    if records.is_empty() {
        println!("No intakes in this period");
        return Ok(());
    }

    for record in &records {
        let name = record
            .drink
            .as_ref()
            .map(|d| d.name.as_str())
            .unwrap_or("Custom drink");
        println!(
            "{}  {:<24} {:>4.0} mg  {}",
            record.timestamp.with_timezone(&tz).format("%Y-%m-%d %H:%M"),
            name,
            record.amount,
            record.id
        );
    }
    Ok(())
}

fn cmd_remove(paths: &Paths, id: uuid::Uuid) -> Result<()> {
    let removed = remove_intake(&paths.intake_log, id)?;
    println!("✓ Removed intake of {:.0} mg", removed.amount);
    Ok(())
}

fn cmd_sleep(paths: &Paths, start: Option<String>, end: Option<String>) -> Result<()> {
    let prefs = if start.is_some() || end.is_some() {
        let prefs = Preferences::update(&paths.preferences, |p| {
            p.set_sleep(start.as_deref(), end.as_deref())
        })?;
        println!("✓ Sleep schedule updated");
        prefs
    } else {
        Preferences::load(&paths.preferences)?
    };

    println!("  Sleep: {} - {}", prefs.sleep_start, prefs.sleep_end);
    Ok(())
}

fn cmd_config(explicit: Option<&Path>, config: &Config, init: bool) -> Result<()> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_config_path);

    if init {
        if path.exists() {
            println!("Config already exists at {}", path.display());
        } else {
            match explicit {
                Some(path) => config.save_to(path)?,
                None => config.save()?,
            }
            println!("✓ Wrote default config to {}", path.display());
        }
    }

    println!("# {}", path.display());
    println!("data_dir = {}", config.data.data_dir.display());
    println!("range = {}", config.chart.range);
    println!("anchor = {:?}", config.chart.anchor);
    println!("series = {:?}", config.chart.series);
    Ok(())
}
