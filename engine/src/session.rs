use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::dispatch::EventDispatcher;
use crate::error::{CtlError, EINTR, MonitorError};
use crate::hw::traits::{ControlBackend, ControlHandle};

pub const DEFAULT_DEVICE: &str = "hw:0";

/// Cooperative stop flag for the listening loop. With nobody cancelling it
/// the loop runs forever; a signal handler or a test script flips it to end
/// the session cleanly.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub device: String,
    pub filter: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            filter: None,
        }
    }
}

/// One monitoring run against one device: open the connection, enumerate and
/// subscribe elements, then block on the wait/dispatch cycle until cancelled.
pub struct Session<B, W> {
    backend: B,
    config: SessionConfig,
    token: CancelToken,
    out: W,
}

impl<B: ControlBackend, W: Write> Session<B, W> {
    pub fn new(backend: B, config: SessionConfig, token: CancelToken, out: W) -> Self {
        Self {
            backend,
            config,
            token,
            out,
        }
    }

    /// Runs the session to completion. `Ok` means the token was cancelled;
    /// any `Err` is fatal and carries the subsystem error code to exit with.
    /// The connection is released on every path out of here.
    pub fn run(self) -> Result<(), MonitorError> {
        let Session {
            backend,
            config,
            token,
            out,
        } = self;

        let mut handle = backend
            .open(&config.device)
            .map_err(|err| MonitorError::open(&config.device, err))?;
        debug!("{} connection open on {}", B::LABEL, config.device);

        let mut dispatcher = EventDispatcher::new(config.device.clone(), config.filter.clone(), out);
        handle
            .load(&mut dispatcher)
            .map_err(|err| MonitorError::load(&config.device, err))?;

        if dispatcher.registry().subscriptions() == 0 {
            return Err(match config.filter {
                Some(name) => MonitorError::NotFound {
                    device: config.device,
                    name,
                },
                None => MonitorError::NoControls {
                    device: config.device,
                },
            });
        }

        let watched = config.filter.as_deref().unwrap_or("all controls");
        let _ = writeln!(
            dispatcher.out_mut(),
            "Listening on {} and '{}'...",
            config.device,
            watched
        );

        while !token.is_cancelled() {
            match handle.wait(None) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(err) => {
                    // An interrupted wait right after cancellation is the
                    // normal shutdown path, not something to report.
                    if !(err.errno == EINTR && token.is_cancelled()) {
                        report(dispatcher.out_mut(), &err);
                    }
                    continue;
                }
            }
            if token.is_cancelled() {
                break;
            }
            if let Err(err) = handle.handle_events(&mut dispatcher) {
                report(dispatcher.out_mut(), &err);
            }
        }

        debug!("session on {} cancelled, closing", config.device);
        Ok(())
    }
}

fn report<W: Write>(out: &mut W, err: &CtlError) {
    let _ = writeln!(out, "ERR: {} ({})", err.reason, -err.errno);
}
