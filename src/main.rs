use std::net::SocketAddr;
use std::process::ExitCode;
use std::thread;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use netmon::capture::CaptureSource;
use netmon::console;
use netmon::pipeline::{run_pipeline, Shared};

#[derive(Parser, Debug)]
#[command(name = "netmon", about = "Minimal live network traffic inspector")]
struct Args {
    /// Local endpoint the capture socket binds to
    #[arg(long, default_value = "127.0.0.1:12345")]
    bind: SocketAddr,

    /// Only report packets from this source IP
    #[arg(long, default_value = "")]
    filter_ip: String,

    /// Only report packets with this port (0 = any)
    #[arg(long, default_value = "0")]
    filter_port: String,

    /// Only report packets with this protocol (TCP, UDP, ICMP, or a
    /// two-hex-digit code)
    #[arg(long, default_value = "")]
    filter_protocol: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let source = match CaptureSource::open(args.bind) {
        Ok(source) => source,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let shared = Shared::new();
    if let Err(e) =
        shared
            .filter
            .lock()
            .set(&args.filter_ip, &args.filter_port, &args.filter_protocol)
    {
        error!("invalid filter preset: {}", e);
        return ExitCode::FAILURE;
    }

    let ctrlc_shared = shared.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("interrupted, shutting down");
        ctrlc_shared.shutdown();
    }) {
        error!("failed to install signal handler: {}", e);
        return ExitCode::FAILURE;
    }

    let pipeline_shared = shared.clone();
    let capture_thread = thread::spawn(move || run_pipeline(source, &pipeline_shared));

    let console_result = console::run(&shared);
    shared.shutdown();

    let mut status = ExitCode::SUCCESS;
    match capture_thread.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!("capture failed: {}", e);
            status = ExitCode::FAILURE;
        }
        Err(_) => {
            error!("capture thread panicked");
            status = ExitCode::FAILURE;
        }
    }
    if let Err(e) = console_result {
        error!("console error: {}", e);
        status = ExitCode::FAILURE;
    }
    status
}
