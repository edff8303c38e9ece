use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use anyhow::{bail, Result};

pub mod actions;
pub mod cli;
pub mod dispatch;
pub mod enumerate;
pub mod error;
pub mod library;
pub mod resolve;
pub mod snapshot;

// Program name used in every user-facing message
pub const NAME: &str = "pairctl";

// Highest slot number a receiver can pair a device into
pub const MAX_SLOT: u8 = 6;

/// Raw record describing one endpoint found on the hardware bus.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HardwareDescriptor {
    pub path: String,
    pub is_device: bool,
    #[serde(default)]
    pub vendor_id: u16,
    #[serde(default)]
    pub product_id: u16,
}

impl fmt::Display for HardwareDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:04x}:{:04x})",
            self.path, self.vendor_id, self.product_id
        )
    }
}

// Device kind as reported by the device itself
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    #[default]
    Unknown,
    Keyboard,
    Mouse,
    Numpad,
    Presenter,
    Remote,
    Trackball,
    Touchpad,
    Tablet,
    Gamepad,
    Joystick,
    Headset,
    RemoteControl,
    Receiver,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Keyboard => "keyboard",
            Self::Mouse => "mouse",
            Self::Numpad => "numpad",
            Self::Presenter => "presenter",
            Self::Remote => "remote",
            Self::Trackball => "trackball",
            Self::Touchpad => "touchpad",
            Self::Tablet => "tablet",
            Self::Gamepad => "gamepad",
            Self::Joystick => "joystick",
            Self::Headset => "headset",
            Self::RemoteControl => "remote_control",
            Self::Receiver => "receiver",
        };
        f.write_str(name)
    }
}

/// A live receiver dongle.
///
/// Paired devices are never materialized on the receiver: every call to
/// [`Receiver::device`] or [`Receiver::devices`] queries the current pairing
/// state again.
pub trait Receiver {
    fn path(&self) -> &str;

    fn name(&self) -> &str;

    fn serial(&self) -> Option<&str>;

    fn max_devices(&self) -> u8 {
        MAX_SLOT
    }

    /// Number of devices currently paired.
    fn count(&self) -> usize;

    /// Device paired at the 1-based `slot`, if any.
    fn device(&self, slot: u8) -> Option<Rc<dyn Device>>;

    /// Paired devices in slot order.
    fn devices(&self) -> Box<dyn Iterator<Item = Rc<dyn Device>> + '_>;

    /// Accept the next device that asks to pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the receiver is full or cannot be put in pairing mode.
    fn pair_device(&self) -> Result<Option<Rc<dyn Device>>> {
        bail!("receiver {} does not support pairing", self.name())
    }

    /// Remove the pairing at `slot`.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot is empty or the receiver refuses the request.
    fn unpair_device(&self, slot: u8) -> Result<()> {
        bail!(
            "receiver {} does not support unpairing slot {slot}",
            self.name()
        )
    }
}

/// A live peripheral, either wired or paired through a receiver.
pub trait Device {
    // Physical path, only for wired devices
    fn path(&self) -> Option<&str>;

    fn name(&self) -> &str;

    fn serial(&self) -> &str;

    fn codename(&self) -> &str;

    fn kind(&self) -> DeviceKind;

    // Slot on the owning receiver, None for wired devices
    fn slot(&self) -> Option<u8>;

    fn receiver_path(&self) -> Option<&str>;

    fn online(&self) -> bool;

    /// Probe the device and refresh its online status.
    fn ping(&self) -> bool;

    fn settings(&self) -> BTreeMap<String, Value> {
        BTreeMap::new()
    }

    /// # Errors
    ///
    /// Returns an error if the device rejects the setting.
    fn write_setting(&self, name: &str, _value: Value) -> Result<()> {
        bail!("{} has no setting named {name}", self.name())
    }

    fn profiles(&self) -> Option<Value> {
        None
    }

    /// # Errors
    ///
    /// Returns an error if the device has no onboard profiles.
    fn write_profiles(&self, _profiles: Value) -> Result<()> {
        bail!("{} does not support onboard profiles", self.name())
    }
}

/// One entry of the handle list built for an invocation.
#[derive(Clone)]
pub enum Handle {
    Receiver(Rc<dyn Receiver>),
    Device(Rc<dyn Device>),
}

impl Handle {
    #[must_use]
    pub fn is_device(&self) -> bool {
        matches!(self, Self::Device(_))
    }

    #[must_use]
    pub fn as_receiver(&self) -> Option<&Rc<dyn Receiver>> {
        match self {
            Self::Receiver(receiver) => Some(receiver),
            Self::Device(_) => None,
        }
    }

    #[must_use]
    pub fn as_device(&self) -> Option<&Rc<dyn Device>> {
        match self {
            Self::Device(device) => Some(device),
            Self::Receiver(_) => None,
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Receiver(r) => write!(f, "<Receiver({},{})>", r.path(), r.name()),
            Self::Device(d) => write!(
                f,
                "<Device({},{},{})>",
                d.path().unwrap_or("?"),
                d.name(),
                d.serial()
            ),
        }
    }
}
