use std::env;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info};

use causa_soccer::analysis::{analyse_slate, Repository};
use causa_soccer::cache::RepositoryCache;
use causa_soccer::config::{Config, Overrides};
use causa_soccer::fixtures::load_fixtures;
use causa_soccer::print;

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// JSON config file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// fixture list, overriding the config's
    #[clap(short, long)]
    fixtures: Option<PathBuf>,

    /// only analyse fixtures in this competition
    #[clap(short = 'l', long)]
    competition: Option<String>,

    /// print the analyses as JSON
    #[clap(long)]
    json: bool,

    /// re-run every so many seconds, reloading the data once it is older than the cache TTL
    #[clap(short, long)]
    interval: Option<u64>,

    #[clap(flatten)]
    overrides: Overrides,
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
    debug!("args: {args:?}");

    let config = Config::resolve(args.config.as_deref(), &args.overrides)?;
    let path = args
        .fixtures
        .clone()
        .or_else(|| config.fixtures_path())
        .ok_or_else(|| anyhow!("no fixture list; pass --fixtures or set one in the config"))?;
    let mut repositories = RepositoryCache::new(config.cache_ttl());
    loop {
        let repository = repositories.get_or_load(|| Repository::load(&config))?;
        run(&args, &config, repository, &path)?;
        debug!("repository cache {:?}", repositories.stats);
        match args.interval {
            None => break,
            Some(secs) => thread::sleep(Duration::from_secs(secs)),
        }
    }
    Ok(())
}

fn run(args: &Args, config: &Config, repository: &Repository, path: &Path) -> Result<(), Box<dyn Error>> {
    let (mut fixtures, _) = load_fixtures(path)?;
    if let Some(competition) = &args.competition {
        fixtures.retain(|fixture| &fixture.competition == competition);
    }
    info!("analysing {} fixtures from {}", fixtures.len(), path.display());

    let (analyses, skipped) = analyse_slate(&repository.matches, &repository.referees, &fixtures, config);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&analyses)?);
        return Ok(());
    }
    println!("Slate:\n{}", Console::default().render(&print::tabulate_slate(&analyses)));
    if !skipped.is_empty() {
        info!("skipped {} fixtures", skipped.len());
    }
    Ok(())
}
