use anyhow::{Context, Result};
use clap::Parser;
use qforage_core::config::AppConfig;
use qforage_core::metrics::init_logging;
use qforage_data::{Genome, PolicyFamily};
use qforage_lib::observer::LogObserver;
use qforage_lib::Session;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, default_value = "qforage.toml")]
    config: PathBuf,

    /// What to run
    #[arg(short, long, value_enum, default_value = "evolve")]
    mode: Mode,

    /// Policy family, overriding the config file
    #[arg(long)]
    family: Option<PolicyFamily>,

    /// Genome JSON to replay (replay mode)
    #[arg(long)]
    genome: Option<String>,

    /// Seed for evolution and replay worlds
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum Mode {
    /// Run the optimizer and replay each new champion
    Evolve,
    /// Replay a given genome until interrupted
    Replay,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging("qforage=info,qforage_core=info,qforage_observer=info");
    let args = Args::parse();

    let mut config = AppConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(family) = args.family {
        config.policy.family = family;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let mut session = Session::new(config, Arc::new(LogObserver))?;

    match args.mode {
        Mode::Evolve => {
            let shutdown = session.shutdown().clone();
            let outcome = tokio::select! {
                result = session.evolve() => Some(result?),
                _ = tokio::signal::ctrl_c() => {
                    tracing::warn!("Interrupted, stopping evolution");
                    shutdown.request();
                    None
                }
            };
            if let Some(Some(best)) = outcome {
                println!("{}", best.genome.to_json()?);
            }
        }
        Mode::Replay => {
            let text = args
                .genome
                .context("--genome is required in replay mode")?;
            let genome = Genome::from_json(&text).context("parsing --genome")?;
            session.import_genome(genome).await?;
            let shutdown = session.shutdown().clone();
            tokio::select! {
                _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted"),
                _ = shutdown.wait() => {}
            }
        }
    }

    session.close().await?;
    Ok(())
}
