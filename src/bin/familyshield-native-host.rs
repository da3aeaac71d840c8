//! Chrome Native Messaging Host for FamilyShield
//!
//! This binary runs as a standalone native messaging host for the FamilyShield extension.
//! It communicates via stdin/stdout using Chrome's native messaging protocol, so all
//! logging goes to stderr.

use familyshield_lib::{default_db_path, engine::EngineConfig, native_host::NativeHost, open_engine};
use log::{error, info};
use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    init_logging();

    let engine = match default_db_path().and_then(|path| open_engine(&path, EngineConfig::default())) {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            error!("Initialization error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let host = NativeHost::new(engine);
    info!("Native host ready");

    if let Err(e) = host.run(&mut io::stdin().lock(), &mut io::stdout().lock()) {
        // EOF is expected when Chrome closes the connection
        if e.kind() != io::ErrorKind::UnexpectedEof {
            error!("Native host error: {e}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
