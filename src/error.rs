//! Error kinds of a `pairctl` invocation and their mapping to exit statuses.

use thiserror::Error;

use crate::NAME;

/// Exit statuses of the `pairctl` binary.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const SOFTWARE: i32 = 70;
}

#[derive(Debug, Error)]
pub enum Error {
    /// No action could be determined from the command line.
    #[error("too few arguments")]
    Usage { usage: String },

    #[error("failed to enumerate hardware: {0:#}")]
    Enumeration(anyhow::Error),

    /// The device-management library failed to open an endpoint.
    #[error("{message}")]
    Construction { descriptor: String, message: String },

    #[error(
        "No supported device found. Use \"lsusb\" and \"bluetoothctl devices Connected\" to list connected devices."
    )]
    NoDevices,

    /// A programmer invariant did not hold.
    #[error("assertion failed: {file} line {line}")]
    Invariant { file: &'static str, line: u32 },

    #[error(transparent)]
    Action(anyhow::Error),
}

impl Error {
    /// Wrap a failure raised by an action handler.
    ///
    /// Errors of this crate that travelled through the handler (typically an
    /// invariant violation from a resolver) keep their own kind.
    #[must_use]
    pub fn from_action(err: anyhow::Error) -> Self {
        match err.downcast::<Self>() {
            Ok(inner) => inner,
            Err(err) => Self::Action(err),
        }
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage { .. } => exit_code::USAGE,
            Self::Invariant { .. } => exit_code::SOFTWARE,
            _ => exit_code::GENERAL,
        }
    }

    /// Message written to stderr before exiting.
    #[must_use]
    pub fn report(&self) -> String {
        match self {
            Self::Usage { usage } => format!("{}\n{NAME}: error: {self}", usage.trim_end()),
            Self::Invariant { .. } => format!("{NAME}: {self}"),
            Self::Action(err) => format!("{NAME}: error: {err:?}"),
            _ => format!("{NAME}: error: {self}"),
        }
    }
}

/// Build an [`Error::Invariant`] pointing at the call site.
#[macro_export]
macro_rules! invariant_violation {
    () => {
        $crate::error::Error::Invariant {
            file: file!(),
            line: line!(),
        }
    };
}

/// Return an [`Error::Invariant`] from the enclosing function unless `$cond` holds.
#[macro_export]
macro_rules! invariant {
    ($cond:expr) => {
        if !$cond {
            return Err($crate::invariant_violation!().into());
        }
    };
}
