use anyhow::Result;
use std::rc::Rc;

use crate::{Device, HardwareDescriptor, Receiver};

/// Sequence of descriptors produced by one enumeration call.
pub type Descriptors<'a> = Box<dyn Iterator<Item = HardwareDescriptor> + 'a>;

/// Narrow interface to the device-management library that owns the hardware
/// transport.
///
/// Every enumeration call returns a fresh snapshot of the bus. Construction may
/// return `Ok(None)` when the endpoint exists but is not usable.
pub trait DeviceLibrary {
    /// Receiver dongles only.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus cannot be enumerated.
    fn receivers(&self) -> Result<Descriptors<'_>>;

    /// Receiver dongles and directly wired devices.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus cannot be enumerated.
    fn receivers_and_devices(&self) -> Result<Descriptors<'_>>;

    /// # Errors
    ///
    /// Returns an error if the receiver cannot be opened.
    fn create_receiver(&self, info: &HardwareDescriptor) -> Result<Option<Rc<dyn Receiver>>>;

    /// # Errors
    ///
    /// Returns an error if the device cannot be opened.
    fn create_device(&self, info: &HardwareDescriptor) -> Result<Option<Rc<dyn Device>>>;
}
