use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use fcpdf_rs::settings::{Bandwidth, BoundsFrom, ProbStyle};
use fcpdf_rs::{Client, Month, Period, Session, Variable, chart, panel, render};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "fcpdf",
    version,
    about = "Fetch, modify, visualize & export ensemble forecast distributions"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a forecast dataset (and optionally modify, plot, and export).
    Fetch(FetchArgs),
}

#[derive(ValueEnum, Clone, Debug)]
enum ProbStyleArg {
    Bar,
    Pie,
}

#[derive(ValueEnum, Clone, Debug)]
enum BoundsArg {
    Pdf,
    Data,
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Forecast issue month (three-letter name, e.g. Jan)
    #[arg(short, long)]
    month: String,
    /// Forecast issue year (4 digits)
    #[arg(short, long)]
    year: String,
    /// Forecast period: mon or seas
    #[arg(short, long, default_value = "mon")]
    period: String,
    /// Variable: t2m or precip
    #[arg(short = 'v', long, default_value = "t2m")]
    variable: String,
    /// Ensemble spread scale factor (1 = unchanged)
    #[arg(long)]
    spread: Option<f64>,
    /// Additive shift (0 = unchanged)
    #[arg(long)]
    shift: Option<f64>,
    /// Blend toward climatology, percent (0 = unchanged)
    #[arg(long)]
    blend: Option<f64>,
    /// Overwrite one member as INDEX=VALUE (repeatable)
    #[arg(long = "overwrite")]
    overwrites: Vec<String>,
    /// Number of PDF sample points
    #[arg(long)]
    levels: Option<u32>,
    /// PDF range limiter factor
    #[arg(long)]
    range_limiter: Option<f64>,
    /// KDE bandwidth: silverman, scott, or a numeric factor
    #[arg(long)]
    bandwidth: Option<String>,
    /// Climatology period as FROM:TO (e.g. 1981:2010)
    #[arg(long)]
    clim_period: Option<String>,
    /// Source of the category boundaries
    #[arg(long, value_enum)]
    bounds_from: Option<BoundsArg>,
    /// Create the PDF/member chart at the given path (.svg or .png)
    #[arg(long)]
    plot: Option<PathBuf>,
    /// Create the categorical-probability chart at the given path
    #[arg(long)]
    prob_plot: Option<PathBuf>,
    /// Probability chart style
    #[arg(long, value_enum, default_value = "bar")]
    prob_style: ProbStyleArg,
    /// Width of the plots (default 1000)
    #[arg(long, default_value_t = 1000)]
    width: u32,
    /// Height of the plots (default 600)
    #[arg(long, default_value_t = 600)]
    height: u32,
    /// Print the modified member values to stdout.
    #[arg(long, default_value_t = false)]
    text: bool,
    /// Ask the server to export the displayed data; prints the
    /// server-side destination path.
    #[arg(long, default_value_t = false)]
    export: bool,
    /// Statistics endpoint URL.
    #[arg(long)]
    endpoint: Option<String>,
}

fn parse_bandwidth(s: &str) -> Result<Bandwidth> {
    match s {
        "silverman" => Ok(Bandwidth::Silverman),
        "scott" => Ok(Bandwidth::Scott),
        other => other
            .parse::<f64>()
            .map(Bandwidth::Literal)
            .map_err(|_| anyhow::anyhow!("invalid --bandwidth, expected silverman, scott or a number")),
    }
}

fn parse_clim_period(s: &str) -> Result<[i32; 2]> {
    let invalid = || anyhow::anyhow!("invalid --clim-period, expected FROM:TO (e.g. 1981:2010)");
    let (from, to) = s.split_once(':').ok_or_else(invalid)?;
    let from: i32 = from.parse().map_err(|_| invalid())?;
    let to: i32 = to.parse().map_err(|_| invalid())?;
    if from >= to {
        anyhow::bail!("--clim-period start must come before its end");
    }
    Ok([from, to])
}

fn parse_overwrite(s: &str) -> Result<(usize, f64)> {
    let invalid = || anyhow::anyhow!("invalid --overwrite, expected INDEX=VALUE (e.g. 3=21.5)");
    let (index, value) = s.split_once('=').ok_or_else(invalid)?;
    Ok((
        index.trim().parse().map_err(|_| invalid())?,
        value.trim().parse().map_err(|_| invalid())?,
    ))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Fetch(args) => cmd_fetch(args),
    }
}

fn cmd_fetch(args: FetchArgs) -> Result<()> {
    let month: Month = args
        .month
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid --month: {}", e))?;
    let period: Period = args
        .period
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid --period: {}", e))?;
    let variable: Variable = args
        .variable
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid --variable: {}", e))?;

    let client = match args.endpoint.as_deref() {
        Some(url) => Client::new(url),
        None => Client::default(),
    };
    let mut session = Session::new(client);

    if let Some(levels) = args.levels {
        session.settings.levels = levels;
    }
    if let Some(range_limiter) = args.range_limiter {
        session.settings.range_limiter = range_limiter;
    }
    if let Some(ref bandwidth) = args.bandwidth {
        session.settings.bandwidth = parse_bandwidth(bandwidth)?;
    }
    if let Some(ref clim_period) = args.clim_period {
        let years = parse_clim_period(clim_period)?;
        session.settings.clim_period = years;
        session.settings.clim_years = fcpdf_rs::settings::climatology_years(years[0], years[1]);
    }
    if let Some(bounds) = args.bounds_from {
        session.settings.bounds_from = match bounds {
            BoundsArg::Pdf => BoundsFrom::Pdf,
            BoundsArg::Data => BoundsFrom::Data,
        };
    }
    session.settings.prob_style = match args.prob_style {
        ProbStyleArg::Bar => ProbStyle::Bar,
        ProbStyleArg::Pie => ProbStyle::Pie,
    };

    session.import(month, &args.year)?;
    if !session.loaded() {
        // import surfaces server failures through the title text
        anyhow::bail!("{}", session.title);
    }
    if session.selection() != fcpdf_rs::Selection::new(period, variable) {
        session.select(period, variable)?;
    }

    let has_modifiers = args.spread.is_some()
        || args.shift.is_some()
        || args.blend.is_some()
        || !args.overwrites.is_empty();
    if has_modifiers {
        session.modifiers.spread = args.spread.unwrap_or(1.0);
        session.modifiers.shift = args.shift.unwrap_or(0.0);
        session.modifiers.blend = args.blend.unwrap_or(0.0);
        session.modifiers.overwrites = args
            .overwrites
            .iter()
            .map(|s| {
                parse_overwrite(s).map(|(index, value)| fcpdf_rs::models::Overwrite { index, value })
            })
            .collect::<Result<Vec<_>>>()?;
        session.update()?;
    }

    eprintln!("{}", session.title);

    if let Some(plot_path) = args.plot.as_ref() {
        let description = chart::pdf_chart(&session.store, session.settings.clim_period);
        render::render_pdf_chart(&description, plot_path, args.width, args.height)?;
        eprintln!("Wrote plot to {}", plot_path.display());
    }

    if let Some(prob_path) = args.prob_plot.as_ref() {
        let probs = &session
            .store
            .series(fcpdf_rs::SeriesKind::Modified)
            .quin_probs;
        let description = chart::prob_chart(probs, variable, session.settings.prob_style)?;
        render::render_prob_chart(&description, prob_path, args.width, args.height)?;
        eprintln!("Wrote probability plot to {}", prob_path.display());
    }

    if args.text {
        println!("Raw members:");
        println!("{}", panel::member_lines(&session.store, fcpdf_rs::SeriesKind::Raw));
        println!("Modified members:");
        println!(
            "{}",
            panel::member_lines(&session.store, fcpdf_rs::SeriesKind::Modified)
        );
    }

    if args.export {
        let path = session.export()?;
        println!("Data saved in: {}", path);
    }

    Ok(())
}
