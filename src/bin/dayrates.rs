use anyhow::{Context as _, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dayrates::series::parse_date;
use dayrates::{Config, Context, ScaleFactor, SeriesView, Session, TimeSeriesStore};
use dayrates::{stats, storage};
use std::borrow::Cow;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "dayrates",
    version,
    about = "Derive change/cumulative series and per-day map frames from daily per-country counts"
)]
struct Cli {
    #[command(flatten)]
    input: InputArgs,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// JSON config file; flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// CSV with a date column followed by one count column per country.
    #[arg(short = 'i', long, global = true)]
    counts: Option<PathBuf>,
    /// GeoJSON feature collection with country boundaries.
    #[arg(short = 'm', long, global = true)]
    map: Option<PathBuf>,
    /// First selectable day (YYYY-MM-DD). Defaults to the first date in the data.
    #[arg(long, global = true)]
    start_date: Option<String>,
    /// Last selectable day, inclusive (YYYY-MM-DD).
    #[arg(long, global = true)]
    end_date: Option<String>,
    /// Feature names to exclude, separated by comma or semicolon (replaces the default).
    #[arg(long, global = true)]
    exclude: Option<String>,
    /// Map a geometry name onto a series column: "United States of America=USA". Repeatable.
    #[arg(long = "alias", global = true)]
    aliases: Vec<String>,
    /// Feature property holding the country name.
    #[arg(long, global = true)]
    name_property: Option<String>,
    /// Target size range for the scale factor (default 100).
    #[arg(long, global = true)]
    target_range: Option<f64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print or save one of the tabular views.
    Series(SeriesArgs),
    /// Print the global scale factor.
    Scale,
    /// Build the map frame for one day.
    Frame(FrameArgs),
    /// Print per-country statistics of the raw counts.
    Stats,
    /// Read day selections (index or date) from stdin, one per line, and emit a frame for each.
    Replay,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SeriesKind {
    Raw,
    Change,
    Cumulative,
    Rescaled,
}

#[derive(Args, Debug)]
struct SeriesArgs {
    #[arg(long, value_enum, default_value = "raw")]
    kind: SeriesKind,
    /// Save as CSV instead of printing.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Debug)]
enum FrameFormat {
    Json,
    Geojson,
    Csv,
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// Day offset from the start date.
    #[arg(short, long, conflicts_with = "date")]
    day: Option<usize>,
    /// Calendar date (YYYY-MM-DD).
    #[arg(long)]
    date: Option<String>,
    /// Save the frame (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long, value_enum)]
    format: Option<FrameFormat>,
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            // Format up to 4 decimals, then trim trailing zeros and trailing dot.
            let s = format!("{:.4}", x);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        _ => "NA".to_string(),
    }
}

fn parse_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn parse_day_arg(s: &str, what: &str) -> Result<chrono::NaiveDate> {
    parse_date(s).ok_or_else(|| anyhow!("invalid --{}, expected YYYY-MM-DD", what))
}

fn build_config(args: &InputArgs) -> Result<Config> {
    let mut cfg = match &args.config {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(p) = &args.counts {
        cfg.counts = Some(p.clone());
    }
    if let Some(p) = &args.map {
        cfg.map = Some(p.clone());
    }
    if let Some(s) = &args.start_date {
        cfg.start_date = Some(parse_day_arg(s, "start-date")?);
    }
    if let Some(s) = &args.end_date {
        cfg.end_date = Some(parse_day_arg(s, "end-date")?);
    }
    if let Some(s) = &args.exclude {
        cfg.exclude = parse_list(s);
    }
    for a in &args.aliases {
        let (geo, column) = a
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid --alias '{}', expected GEOMETRY_NAME=COLUMN", a))?;
        cfg.aliases
            .insert(geo.trim().to_string(), column.trim().to_string());
    }
    if let Some(p) = &args.name_property {
        cfg.name_property = p.clone();
    }
    if let Some(t) = args.target_range {
        cfg.target_range = t;
    }
    Ok(cfg)
}

fn load_store(cfg: &Config) -> Result<TimeSeriesStore> {
    let path = cfg.counts_path()?;
    TimeSeriesStore::from_path(path).with_context(|| format!("loading {}", path.display()))
}

fn scale_for(cfg: &Config, store: &TimeSeriesStore) -> Result<ScaleFactor> {
    Ok(match cfg.fallback_factor {
        Some(fallback) => ScaleFactor::compute_or(store, cfg.target_range, fallback)?,
        None => ScaleFactor::compute(store, cfg.target_range)?,
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let cfg = build_config(&cli.input)?;
    match cli.cmd {
        Command::Series(args) => cmd_series(&cfg, args),
        Command::Scale => cmd_scale(&cfg),
        Command::Frame(args) => cmd_frame(&cfg, args),
        Command::Stats => cmd_stats(&cfg),
        Command::Replay => cmd_replay(&cfg),
    }
}

fn print_series(view: &SeriesView) {
    println!("date,{}", view.countries().join(","));
    for (day, date) in view.dates().iter().enumerate() {
        let cells: Vec<String> = view
            .row(day)
            .unwrap_or_default()
            .iter()
            .map(|v| fmt_opt(*v))
            .collect();
        println!("{},{}", date, cells.join(","));
    }
}

fn cmd_series(cfg: &Config, args: SeriesArgs) -> Result<()> {
    let store = load_store(cfg)?;
    let view: Cow<'_, SeriesView> = match args.kind {
        SeriesKind::Raw => Cow::Borrowed(store.raw()),
        SeriesKind::Change => Cow::Borrowed(store.change_series()),
        SeriesKind::Cumulative => Cow::Borrowed(store.cumulative_series()),
        SeriesKind::Rescaled => Cow::Owned(store.rescaled_series(scale_for(cfg, &store)?)),
    };
    match args.out {
        Some(path) => {
            storage::save_series_csv(&view, &path)?;
            eprintln!("Saved {} rows to {}", view.len(), path.display());
        }
        None => print_series(&view),
    }
    Ok(())
}

fn cmd_scale(cfg: &Config) -> Result<()> {
    let store = load_store(cfg)?;
    let scale = scale_for(cfg, &store)?;
    println!(
        "scale factor {}  (map marker divisor {})",
        fmt_opt(Some(scale.value())),
        fmt_opt(Some(scale.marker_divisor()))
    );
    Ok(())
}

fn cmd_frame(cfg: &Config, args: FrameArgs) -> Result<()> {
    let ctx = Arc::new(Context::load(cfg)?);
    let mut session = Session::new(ctx)?;
    let ready = match (&args.day, &args.date) {
        (_, Some(d)) => session.select_date(parse_day_arg(d, "date")?)?,
        (Some(day), None) => session.select_day(*day)?,
        (None, None) => session.select_day(0)?,
    };

    match args.out.as_ref() {
        Some(path) => {
            let fmt = match args.format {
                Some(FrameFormat::Json) => "json",
                Some(FrameFormat::Geojson) => "geojson",
                Some(FrameFormat::Csv) => "csv",
                None => path.extension().and_then(|e| e.to_str()).unwrap_or("json"),
            }
            .to_ascii_lowercase();
            match fmt.as_str() {
                "json" => storage::save_frame_json(&ready.frame, path)?,
                "geojson" => storage::save_frame_geojson(&ready.frame, path)?,
                "csv" => storage::save_frame_csv(&ready.frame, path)?,
                other => bail!("unsupported format: {}", other),
            }
            eprintln!(
                "Wrote frame for {} ({} rows) to {}",
                ready.label,
                ready.frame.len(),
                path.display()
            );
        }
        None => {
            println!("Count on date: {}", ready.label);
            for r in &ready.frame.rows {
                println!(
                    "{}  x={} y={}  rate={} size={}",
                    r.name,
                    fmt_opt(Some(r.x)),
                    fmt_opt(Some(r.y)),
                    fmt_opt(r.rate),
                    fmt_opt(r.scaled_size)
                );
            }
        }
    }
    Ok(())
}

fn cmd_stats(cfg: &Config) -> Result<()> {
    let store = load_store(cfg)?;
    for s in stats::country_summaries(store.raw()) {
        println!(
            "{}  count={} missing={}  min={} max={} mean={} median={} total={} peak={}",
            s.country,
            s.count,
            s.missing,
            fmt_opt(s.min),
            fmt_opt(s.max),
            fmt_opt(s.mean),
            fmt_opt(s.median),
            fmt_opt(Some(s.total)),
            s.peak_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "NA".to_string())
        );
    }
    Ok(())
}

fn cmd_replay(cfg: &Config) -> Result<()> {
    let ctx = Arc::new(Context::load(cfg)?);
    let mut session = Session::new(ctx)?;
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let result = match input.parse::<usize>() {
            Ok(day) => session.select_day(day),
            Err(_) => match parse_date(input) {
                Some(date) => session.select_date(date),
                None => {
                    eprintln!("skipping '{}': not a day index or date", input);
                    continue;
                }
            },
        };
        match result {
            Ok(ready) => {
                let with_data = ready.frame.rows.iter().filter(|r| r.rate.is_some()).count();
                println!(
                    "frameReady day={} date={} rows={} with_data={}",
                    ready.frame.day,
                    ready.label,
                    ready.frame.len(),
                    with_data
                );
            }
            Err(e) => eprintln!("rejected '{}': {}", input, e),
        }
    }
    Ok(())
}
