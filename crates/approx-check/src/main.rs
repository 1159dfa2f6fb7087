use std::path::Path;

use anyhow::Context;
use approx_check::{Cli, Config, Driver, Pacer, ProbeError, RunMode, SOURCE};
use axmsg::Diagnostics;
use clap::Parser;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};

const DIAGNOSTICS: Diagnostics = Diagnostics::new(SOURCE);

type Input = Box<dyn AsyncBufRead + Unpin + Send>;
type Output = Box<dyn AsyncWrite + Unpin + Send>;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        let correlation_id = e
            .downcast_ref::<ProbeError>()
            .and_then(ProbeError::correlation_id);
        DIAGNOSTICS.fatal(correlation_id, format_args!("{e:#}"));
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::resolve(cli).map_err(ProbeError::from)?;

    let input = open_input(config.input.as_deref()).await?;
    let output = open_output(config.output.as_deref()).await?;
    let start = config
        .start_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let mut driver = Driver::new(input, output, start, DIAGNOSTICS);

    match config.mode {
        RunMode::Tick(speed) => {
            DIAGNOSTICS.info(
                None,
                format_args!("Producing ticks from {start} at {speed:?} pace"),
            );
            let mut pacer = Pacer::for_speed(speed);
            match driver.run_tick(&mut pacer).await? {}
        }
        RunMode::Collect => match driver.run_collect().await? {},
        RunMode::Check(expected) => {
            let success = driver.run_check(&expected).await?;
            DIAGNOSTICS.info(success.id(), "Check passed");
            Ok(())
        }
    }
}

async fn open_input(path: Option<&Path>) -> anyhow::Result<Input> {
    match path {
        None => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
        Some(path) => {
            let file = File::open(path)
                .await
                .with_context(|| format!("open input {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
    }
}

async fn open_output(path: Option<&Path>) -> anyhow::Result<Output> {
    match path {
        None => Ok(Box::new(tokio::io::stdout())),
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await
                .with_context(|| format!("open output {}", path.display()))?;
            Ok(Box::new(file))
        }
    }
}
