use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::enumerate::EnumerationMode;

pub const DEFAULT_SNAPSHOT: &str = "/run/pairctl/devices.json";

// CLI arguments parsing structure
#[derive(Parser, Debug)]
#[command(
    name = "pairctl",
    author,
    version,
    about = "Inspect and manage wireless receivers and their paired devices",
    long_about = None,
    disable_help_subcommand = true,
    after_help = "For details on individual actions, run `pairctl <action> --help`."
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Bus snapshot describing the connected hardware
    #[arg(long, env = "PAIRCTL_SNAPSHOT", default_value = DEFAULT_SNAPSHOT, global = true)]
    pub snapshot: PathBuf,

    /// Only consider the endpoint at this hidraw path
    #[arg(long, value_name = "PATH", global = true)]
    pub hidraw: Option<String>,

    #[command(subcommand)]
    pub command: Option<Action>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Show information about devices
    Show {
        /// Device to show information about; may be a device number (1..6), a
        /// serial number, a substring of a device's name, or "all"
        #[arg(default_value = "all")]
        device: String,
    },
    /// Probe a receiver (debugging use only)
    Probe {
        /// Select receiver by name substring or serial number when more than one
        /// is present
        receiver: Option<String>,
    },
    /// Read or write onboard profiles
    #[command(after_help = "Only works on active devices.")]
    Profiles {
        /// Device to read or write profiles of; may be a device number (1..6), a
        /// serial number, or a substring of a device's name
        device: String,
        /// File containing a JSON dump of profiles
        profiles: Option<PathBuf>,
    },
    /// Read/write device-specific settings
    #[command(after_help = "Please note that configuration only works on active devices.")]
    Config {
        /// Device to configure; may be a device number (1..6), a serial number,
        /// or a substring of a device's name
        device: String,
        /// Device-specific setting; leave empty to list available settings
        setting: Option<String>,
        /// New value for the setting or key for keyed settings
        value_key: Option<String>,
        /// Value for keyed or subkey for subkeyed settings
        extra_subkey: Option<String>,
        /// Value for subkeyed settings
        extra2: Option<String>,
    },
    /// Pair a new device
    #[command(after_help = "A receiver supports up to 6 paired devices at the same time.")]
    Pair {
        /// Select receiver by name substring or serial number when more than one
        /// is present
        receiver: Option<String>,
    },
    /// Unpair a device
    Unpair {
        /// Device to unpair; may be a device number (1..6), a serial number, or a
        /// substring of a device's name
        device: String,
    },
}

impl Action {
    /// Registry key of the handler for this action.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Show { .. } => "show",
            Self::Probe { .. } => "probe",
            Self::Profiles { .. } => "profiles",
            Self::Config { .. } => "config",
            Self::Pair { .. } => "pair",
            Self::Unpair { .. } => "unpair",
        }
    }

    // Pairing only ever involves receivers
    #[must_use]
    pub fn enumeration_mode(&self) -> EnumerationMode {
        match self {
            Self::Show { .. } | Self::Probe { .. } | Self::Config { .. } | Self::Profiles { .. } => {
                EnumerationMode::ReceiversAndDevices
            }
            Self::Pair { .. } | Self::Unpair { .. } => EnumerationMode::Receivers,
        }
    }
}
