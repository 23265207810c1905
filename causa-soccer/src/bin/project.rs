use std::env;
use std::error::Error;
use std::path::PathBuf;

use anyhow::{anyhow, bail};
use clap::Parser;
use serde::Serialize;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info};

use causa_soccer::analysis::{analyse, AnalysisRequest, FixtureAnalysis, Repository};
use causa_soccer::betting::BetAssessment;
use causa_soccer::config::{Config, Overrides};
use causa_soccer::market::MarketLine;
use causa_soccer::print;
use causa_soccer::selection::MarketSelector;

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// JSON config file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// competition, as named in the config sources
    #[clap(short = 'l', long)]
    competition: String,

    /// home team
    #[clap(long)]
    home: String,

    /// away team
    #[clap(long)]
    away: String,

    /// referee name or severity profile (strict, normal, lenient)
    #[clap(short, long)]
    referee: Option<String>,

    /// restrict output to a market, e.g. corners-total or corners-total@9.5
    #[clap(short, long)]
    market: Option<MarketSelector>,

    /// decimal price offered for the selected market line
    #[clap(short, long)]
    price: Option<f64>,

    /// bankroll to size the stake against
    #[clap(short, long)]
    bankroll: Option<f64>,

    /// share of the full Kelly stake
    #[clap(long, default_value = "0.25")]
    kelly: f64,

    /// print the analysis as JSON
    #[clap(long)]
    json: bool,

    #[clap(flatten)]
    overrides: Overrides,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        if self.price.is_some() && self.market.is_none() {
            bail!("a price requires a --market");
        }
        if self.bankroll.is_some() && self.price.is_none() {
            bail!("a bankroll requires a --price");
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct Report<'a> {
    #[serde(flatten)]
    analysis: &'a FixtureAnalysis,
    bet: Option<BetAssessment>,
}

fn main() -> Result<(), Box<dyn Error>> {
    if env::var("RUST_BACKTRACE").is_err() {
        env::set_var("RUST_BACKTRACE", "full")
    }
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info")
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    args.validate()?;
    debug!("args: {args:?}");

    let config = Config::resolve(args.config.as_deref(), &args.overrides)?;
    debug!("config: {config:?}");
    let repository = Repository::load(&config)?;
    let request = AnalysisRequest {
        competition: args.competition.clone(),
        home: args.home.clone(),
        away: args.away.clone(),
        referee: args.referee.clone(),
    };
    let analysis = analyse(&repository.matches, &repository.referees, &request, &config);

    let lines = analysis
        .lines
        .iter()
        .filter(|line| args.market.as_ref().map_or(true, |selector| selector.matches(line)))
        .cloned()
        .collect::<Vec<_>>();
    let bet = match args.price {
        None => None,
        Some(price) => {
            let line = bet_line(&args, &analysis, &lines)?;
            let assessment = BetAssessment::new(line.probability, price, args.kelly, args.bankroll)?;
            Some((line, assessment))
        }
    };

    if args.json {
        let report = Report {
            analysis: &analysis,
            bet: bet.as_ref().map(|(_, assessment)| assessment.clone()),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    info!(
        "{} v {} ({}), referee: {}",
        analysis.home,
        analysis.away,
        args.competition,
        analysis.projection.metadata.used_referee.as_deref().unwrap_or("none")
    );
    println!("Projection:\n{}", Console::default().render(&print::tabulate_projection(&analysis.projection)));
    println!("Factors:\n{}", Console::default().render(&print::tabulate_factors(&analysis.projection.metadata)));
    println!(
        "Lines:\n{}",
        Console::default().render(&print::tabulate_lines(&lines, |line| analysis.is_smart(line)))
    );
    println!("Quantiles:\n{}", Console::default().render(&print::tabulate_quantiles(&analysis.quantiles)));
    if let Some(simulation) = &analysis.simulation {
        println!("Simulation:\n{}", Console::default().render(&print::tabulate_simulation(simulation)));
    }
    if let Some((line, assessment)) = &bet {
        println!("Bet:\n{}", Console::default().render(&print::tabulate_bet(line, assessment)));
    }
    info!(
        "confidence: {} ({}, {})",
        analysis.confidence.score,
        analysis.confidence.label,
        analysis.confidence.label.colour()
    );
    Ok(())
}

/// The line a price refers to: the exact line when the selector names a threshold, otherwise the
/// category's smart line.
fn bet_line(args: &Args, analysis: &FixtureAnalysis, lines: &[MarketLine]) -> anyhow::Result<MarketLine> {
    let selector = args.market.as_ref().ok_or_else(|| anyhow!("a price requires a --market"))?;
    let line = match selector.threshold {
        Some(_) => lines.first(),
        None => analysis.smart_line(selector.category),
    };
    line.cloned()
        .ok_or_else(|| anyhow!("no line in {selector} qualifies for a bet; name a threshold"))
}
