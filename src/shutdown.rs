//! Interruption by Ctrl-C or a termination request.
//!
//! Handlers are registered by [`ShutdownListener::install`], not on first
//! poll, so a signal that arrives while staging or archiving is still
//! running on the blocking pool is observed.

use std::future::Future;
use std::io;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ShutdownSignal {
    #[strum(serialize = "interrupt")]
    Interrupt,
    #[strum(serialize = "terminate")]
    Terminate,
}

#[cfg(unix)]
pub struct ShutdownListener {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownListener {
    /// Register SIGINT and SIGTERM handlers. Needs a running Tokio runtime.
    pub fn install() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    pub async fn recv(&mut self) -> ShutdownSignal {
        tokio::select! {
            _ = self.interrupt.recv() => ShutdownSignal::Interrupt,
            _ = self.terminate.recv() => ShutdownSignal::Terminate,
        }
    }
}

#[cfg(windows)]
pub struct ShutdownListener {
    interrupt: tokio::signal::windows::CtrlC,
    terminate: tokio::signal::windows::CtrlBreak,
}

#[cfg(windows)]
impl ShutdownListener {
    /// Register Ctrl-C and Ctrl-Break handlers. Needs a running Tokio runtime.
    pub fn install() -> io::Result<Self> {
        Ok(Self {
            interrupt: tokio::signal::windows::ctrl_c()?,
            terminate: tokio::signal::windows::ctrl_break()?,
        })
    }

    pub async fn recv(&mut self) -> ShutdownSignal {
        tokio::select! {
            _ = self.interrupt.recv() => ShutdownSignal::Interrupt,
            _ = self.terminate.recv() => ShutdownSignal::Terminate,
        }
    }
}

/// Drive `work` to completion unless a signal arrives first, in which case
/// `work` is dropped and the signal is returned. Work that is already
/// complete wins over a pending signal.
pub async fn until_shutdown<F: Future>(
    listener: &mut ShutdownListener,
    work: F,
) -> Result<F::Output, ShutdownSignal> {
    tokio::select! {
        biased;
        output = work => Ok(output),
        signal = listener.recv() => {
            tracing::debug!(%signal, "Shutdown requested");
            Err(signal)
        }
    }
}
