//! Simulated Temperature Sensor - CLI Entry Point

use simtemp_cli::{init_logging, run, Args};
use std::process::ExitCode;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}\n\n{}", e, simtemp_cli::USAGE);
            return Ok(ExitCode::from(2));
        }
    };
    if args.help {
        println!("{}", simtemp_cli::USAGE);
        return Ok(ExitCode::SUCCESS);
    }

    init_logging(args.verbose)?;
    info!("=== simtemp v{} ===", env!("CARGO_PKG_VERSION"));

    run(args).await
}
