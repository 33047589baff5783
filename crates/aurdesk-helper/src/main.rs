use std::path::PathBuf;
use std::process::ExitCode;

use aurdesk_core::Settings;
use clap::Parser;

mod executor;


/// Privileged executor for one queued package operation. Invoked through
/// the privilege escalation mechanism as
/// `escalation-binary aurdesk-helper [--prefix <path>]`; everything it
/// needs comes from the operation descriptor under the prefix.
#[derive(Parser, Debug)]
#[command(name = "aurdesk-helper")]
#[command(about = "Privileged package transaction executor", long_about = None)]
struct Args {
    /// Directory holding the operation descriptor.
    #[arg(long)]
    prefix: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let prefix = args
        .prefix
        .unwrap_or_else(|| Settings::default().prefix);

    ExitCode::from(executor::run(&prefix))
}
