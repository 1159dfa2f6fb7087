use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;

use crate::error::ConfigError;

/// Command line and environment of one probe node.
///
/// The pipeline supervisor configures nodes through the environment; every
/// flag has an env counterpart. Values stay raw strings here and are resolved
/// once by [`Config::resolve`].
#[derive(Debug, Parser)]
#[command(
    name = "approx-check",
    about = "Conformance probe for approx pipelines",
    version
)]
pub struct Cli {
    /// Behaviour: tick (produce), collect (consume) or check
    #[arg(long, env = "MODE")]
    pub mode: Option<String>,

    /// Tick rate: untethered, fast, moderate or slow
    #[arg(long, env = "SPEED")]
    pub speed: Option<String>,

    /// Comma-separated processor names the check must discover
    #[arg(long, env = "EXPECT")]
    pub expect: Option<String>,

    /// Input pipe or file (default: stdin)
    #[arg(long = "input", env = "IN", value_delimiter = ',')]
    pub inputs: Vec<PathBuf>,

    /// Output pipe or file (default: stdout)
    #[arg(long = "output", env = "OUT", value_delimiter = ',')]
    pub outputs: Vec<PathBuf>,

    /// First simulated day, YYYY-MM-DD (default: today)
    #[arg(long, env = "START_DATE")]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Tick,
    Collect,
    Check,
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tick" | "produce" => Ok(Mode::Tick),
            "collect" | "consume" => Ok(Mode::Collect),
            "check" => Ok(Mode::Check),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

/// Rate class of the tick producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speed {
    Untethered,
    Fast,
    Moderate,
    Slow,
}

impl Speed {
    /// Delay between ticks; `None` means no pacing at all.
    pub fn interval(self) -> Option<Duration> {
        match self {
            Speed::Untethered => None,
            Speed::Fast => Some(Duration::from_millis(10)),
            Speed::Moderate => Some(Duration::from_millis(200)),
            Speed::Slow => Some(Duration::from_secs(1)),
        }
    }
}

impl FromStr for Speed {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "untethered" => Ok(Speed::Untethered),
            "fast" => Ok(Speed::Fast),
            "moderate" => Ok(Speed::Moderate),
            "slow" => Ok(Speed::Slow),
            other => Err(ConfigError::UnknownSpeed(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    Tick(Speed),
    Collect,
    Check(Vec<String>),
}

/// Validated configuration, fixed for the lifetime of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub mode: RunMode,
    /// `None` selects stdin.
    pub input: Option<PathBuf>,
    /// `None` selects stdout.
    pub output: Option<PathBuf>,
    pub start_date: Option<NaiveDate>,
}

impl Config {
    pub fn resolve(cli: Cli) -> Result<Self, ConfigError> {
        let mode: Mode = non_empty(cli.mode)
            .ok_or(ConfigError::MissingMode)?
            .parse()?;

        let mode = match mode {
            Mode::Tick => {
                let speed = non_empty(cli.speed).ok_or(ConfigError::MissingSpeed)?;
                RunMode::Tick(speed.parse()?)
            }
            Mode::Collect => RunMode::Collect,
            Mode::Check => {
                let expected = cli
                    .expect
                    .as_deref()
                    .map(parse_expectations)
                    .unwrap_or_default();
                if expected.is_empty() {
                    return Err(ConfigError::MissingExpectations);
                }
                RunMode::Check(expected)
            }
        };

        Ok(Config {
            mode,
            input: single_stream("input", cli.inputs)?,
            output: single_stream("output", cli.outputs)?,
            start_date: cli.start_date,
        })
    }
}

/// Split a comma-separated name list, trimming each entry and dropping blanks.
pub fn parse_expectations(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn single_stream(
    kind: &'static str,
    paths: Vec<PathBuf>,
) -> Result<Option<PathBuf>, ConfigError> {
    let mut paths: Vec<PathBuf> = paths
        .into_iter()
        .filter(|p| !p.as_os_str().is_empty())
        .collect();
    match paths.len() {
        0 => Ok(None),
        1 => Ok(paths.pop()),
        count => Err(ConfigError::StreamCount { kind, count }),
    }
}
