mod cli;

use std::io;
use std::process;
#[cfg(unix)]
use std::sync::OnceLock;

use clap::Parser;
use ctlmon_engine::error::EINVAL;
use ctlmon_engine::{CancelToken, SessionConfig};
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
static SIGNAL_TOKEN: OnceLock<CancelToken> = OnceLock::new();

#[cfg(unix)]
extern "C" fn on_signal(_signo: nix::libc::c_int) {
    if let Some(token) = SIGNAL_TOKEN.get() {
        token.cancel();
    }
}

#[cfg(unix)]
fn install_signal_handlers(token: &CancelToken) {
    use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

    let _ = SIGNAL_TOKEN.set(token.clone());
    // No SA_RESTART: the blocking wait has to come back with EINTR so the
    // cancelled token is seen.
    let action = SigAction::new(SigHandler::Handler(on_signal), SaFlags::empty(), SigSet::empty());
    for signal in [Signal::SIGINT, Signal::SIGTERM] {
        if let Err(e) = unsafe { sigaction(signal, &action) } {
            tracing::error!("failed to install {signal} handler: {e}");
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = match cli::Cli::parse().into_config() {
        Ok(config) => config,
        Err(message) => {
            println!("{message}");
            process::exit(-EINVAL);
        }
    };

    let token = CancelToken::new();
    #[cfg(unix)]
    install_signal_handlers(&token);

    monitor(config, token)
}

#[cfg(target_os = "linux")]
fn monitor(config: SessionConfig, token: CancelToken) -> ! {
    use ctlmon_engine::Session;
    use ctlmon_engine::hw::alsa::AlsaBackend;

    match Session::new(AlsaBackend, config, token, io::stdout()).run() {
        Ok(()) => process::exit(0),
        Err(err) => {
            println!("{err}");
            process::exit(err.exit_code());
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn monitor(config: SessionConfig, _token: CancelToken) -> ! {
    use ctlmon_engine::error::ENODEV;

    println!("No control subsystem backend for {} on this platform.", config.device);
    process::exit(-ENODEV);
}
