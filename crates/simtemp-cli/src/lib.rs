//! Simulated Temperature Sensor CLI
//!
//! Attaches a sensor instance, applies configuration flags and either
//! monitors samples or runs the alert self-test.

use chrono::DateTime;
use simtemp_device::{
    DeviceContext, DeviceError, Interest, OpenOptions, PlatformData, Sample, SampleMode,
    SensorReader, RECORD_SIZE,
};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Threshold used by the self-test (normal mode hovers around 25 °C)
const TEST_THRESHOLD_MC: i32 = 24_500;

pub const USAGE: &str = "\
Usage: simtemp [OPTIONS]

Options:
  --sampling-ms <N>    Sampling period in milliseconds [1, 50000]
  --threshold <C>      Alert threshold in degrees Celsius
  --mode <MODE>        normal | noisy | ramp
  --config <FILE>      Platform properties file (TOML, JSON or YAML)
  --count <N>          Stop monitoring after N samples
  --json               Print samples as JSON
  --monitor            Print samples until Ctrl-C (default)
  --test               Run the alert self-test
  --verbose            Enable debug logging
  --help               Show this help";

/// Command-line errors
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Missing value for {0}")]
    MissingValue(&'static str),

    #[error("Invalid value {value:?} for {flag}")]
    InvalidValue { flag: &'static str, value: String },

    #[error("Unknown argument: {0}")]
    UnknownArgument(String),
}

/// What to do after configuring the device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Action {
    #[default]
    Monitor,
    Test,
}

/// Parsed command-line arguments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    pub sampling_ms: Option<u32>,
    pub threshold_c: Option<f64>,
    pub mode: Option<SampleMode>,
    pub config: Option<PathBuf>,
    pub count: Option<usize>,
    pub json: bool,
    pub verbose: bool,
    pub help: bool,
    pub action: Action,
}

fn value<I: Iterator<Item = String>>(args: &mut I, flag: &'static str) -> Result<String, CliError> {
    args.next().ok_or(CliError::MissingValue(flag))
}

fn parsed<T: std::str::FromStr>(flag: &'static str, value: String) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::InvalidValue { flag, value })
}

impl Args {
    /// Parse arguments (program name already stripped)
    pub fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed_args = Args::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--sampling-ms" => {
                    let v = value(&mut args, "--sampling-ms")?;
                    parsed_args.sampling_ms = Some(parsed("--sampling-ms", v)?);
                }
                "--threshold" => {
                    let v = value(&mut args, "--threshold")?;
                    parsed_args.threshold_c = Some(parsed("--threshold", v)?);
                }
                "--mode" => {
                    let v = value(&mut args, "--mode")?;
                    parsed_args.mode = Some(parsed("--mode", v)?);
                }
                "--config" => parsed_args.config = Some(value(&mut args, "--config")?.into()),
                "--count" => {
                    let v = value(&mut args, "--count")?;
                    parsed_args.count = Some(parsed("--count", v)?);
                }
                "--json" => parsed_args.json = true,
                "--verbose" | "-v" => parsed_args.verbose = true,
                "--monitor" => parsed_args.action = Action::Monitor,
                "--test" => parsed_args.action = Action::Test,
                "--help" | "-h" => parsed_args.help = true,
                _ => return Err(CliError::UnknownArgument(arg)),
            }
        }

        Ok(parsed_args)
    }
}

/// Initialize logging to stderr
pub fn init_logging(verbose: bool) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}

/// Convert degrees Celsius to milli-degrees
pub fn celsius_to_mc(celsius: f64) -> i32 {
    (celsius * 1000.0).round() as i32
}

/// Render a nanosecond wall-clock timestamp as ISO-8601 UTC with milliseconds
pub fn format_timestamp(timestamp_ns: u64) -> String {
    let secs = (timestamp_ns / 1_000_000_000) as i64;
    let nanos = (timestamp_ns % 1_000_000_000) as u32;
    match DateTime::from_timestamp(secs, nanos) {
        Some(utc) => utc.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        None => timestamp_ns.to_string(),
    }
}

/// Render one sample for printing
pub fn format_sample(sample: &Sample, json: bool) -> String {
    if json {
        serde_json::to_string(sample).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    } else {
        format!(
            "{} temp={:.3}C alert={}",
            format_timestamp(sample.timestamp_ns),
            sample.temp_celsius(),
            u8::from(sample.is_alert())
        )
    }
}

/// Attach the device, apply flags and run the selected action
pub async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let platform = match &args.config {
        Some(path) => PlatformData::from_file(path)?,
        None => PlatformData::from_env()?,
    };

    let device = DeviceContext::attach(&platform)?;
    let outcome = configure_and_run(&device, &args).await;
    device.shutdown().await?;
    outcome
}

async fn configure_and_run(device: &DeviceContext, args: &Args) -> anyhow::Result<ExitCode> {
    if let Some(sampling_ms) = args.sampling_ms {
        device.set_interval(sampling_ms).await?;
    }
    if let Some(threshold) = args.threshold_c {
        device.set_threshold(celsius_to_mc(threshold));
    }
    if let Some(mode) = args.mode {
        device.set_mode(mode);
    }

    let reader = device.open(OpenOptions::new().nonblocking(true))?;
    match args.action {
        Action::Monitor => {
            monitor(&reader, args.count, args.json).await?;
            Ok(ExitCode::SUCCESS)
        }
        Action::Test => Ok(if self_test(device, &reader, args.json).await? {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }),
    }
}

/// Consume and decode one record from a non-blocking reader
///
/// Returns `None` once the queue is drained.
pub async fn next_record(reader: &SensorReader) -> Result<Option<Sample>, DeviceError> {
    let mut record = [0u8; RECORD_SIZE];
    match reader.read_into(&mut record).await {
        Ok(len) => Ok(Some(Sample::decode(&record[..len])?)),
        Err(DeviceError::WouldBlock) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Print samples as they become readable until Ctrl-C or `count` samples
///
/// `reader` must be non-blocking.
pub async fn monitor(reader: &SensorReader, count: Option<usize>, json: bool) -> anyhow::Result<usize> {
    let mut printed = 0;
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            _ = &mut interrupted => {
                println!("\n--- Monitor stopped by user. ---");
                return Ok(printed);
            }
            readiness = reader.wait_ready(Interest::Readable, None) => {
                readiness?;
            }
        }

        while let Some(sample) = next_record(reader).await? {
            println!("{}", format_sample(&sample, json));
            printed += 1;
            if count.is_some_and(|limit| printed >= limit) {
                return Ok(printed);
            }
        }
    }
}

/// Lower the threshold below the normal-mode temperature and expect an
/// alert within two sampling periods
///
/// `reader` must be non-blocking.
pub async fn self_test<E>(
    device: &DeviceContext<E>,
    reader: &SensorReader,
    json: bool,
) -> anyhow::Result<bool>
where
    E: simtemp_device::EntropySource,
{
    while let Some(sample) = next_record(reader).await? {
        println!("{}", format_sample(&sample, json));
    }

    let config = device.config();
    let timeout = config.interval() * 2;
    println!("\n--- Entering Test Mode ---");
    println!("--- Test timeout: {} ms ---", timeout.as_millis());
    println!("--- Test threshold: {:.3} C ---", f64::from(TEST_THRESHOLD_MC) / 1000.0);
    println!("--- Test mode: normal ---");

    device.set_threshold(TEST_THRESHOLD_MC);
    device.set_mode(SampleMode::Normal);

    let readiness = reader.wait_ready(Interest::Alert, Some(timeout)).await;
    let sample = match readiness {
        Ok(r) if r.is_alert() => next_record(reader).await?,
        Ok(_) => None,
        Err(e) => {
            warn!("Waiting for alert failed: {}", e);
            None
        }
    };

    device.set_threshold(config.threshold_mc);
    device.set_mode(config.mode);

    match sample {
        Some(sample) if sample.is_alert() => {
            println!("{}\n", format_sample(&sample, json));
            println!("Test PASSED");
            info!("Self-test passed");
            Ok(true)
        }
        _ => {
            println!("Test FAILED");
            warn!("No alert within {:?}", timeout);
            Ok(false)
        }
    }
}
