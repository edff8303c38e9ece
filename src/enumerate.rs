use tracing::{debug, error};

use crate::error::Error;
use crate::library::DeviceLibrary;
use crate::{Handle, HardwareDescriptor};

// Which endpoints an action needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumerationMode {
    Receivers,
    ReceiversAndDevices,
}

/// List descriptors from the library, keeping only those at `filter_path` when given.
///
/// # Errors
///
/// Returns [`Error::Enumeration`] if the library cannot list the bus.
pub fn enumerate<'a>(
    library: &'a dyn DeviceLibrary,
    mode: EnumerationMode,
    filter_path: Option<&'a str>,
) -> Result<impl Iterator<Item = HardwareDescriptor> + 'a, Error> {
    let descriptors = match mode {
        EnumerationMode::Receivers => library.receivers(),
        EnumerationMode::ReceiversAndDevices => library.receivers_and_devices(),
    }
    .map_err(Error::Enumeration)?;

    Ok(descriptors.filter(move |info| filter_path.is_none_or(|path| path == info.path)))
}

/// Open one descriptor as a receiver or wired device.
///
/// # Errors
///
/// Any library failure is fatal and surfaces as [`Error::Construction`].
pub fn build(
    library: &dyn DeviceLibrary,
    info: &HardwareDescriptor,
) -> Result<Option<Handle>, Error> {
    let built = if info.is_device {
        library
            .create_device(info)
            .map(|device| device.map(Handle::Device))
    } else {
        library
            .create_receiver(info)
            .map(|receiver| receiver.map(Handle::Receiver))
    };

    match built {
        Ok(handle) => {
            match &handle {
                Some(handle) => debug!("[{}] => {handle}", info.path),
                None => debug!("[{}] => None", info.path),
            }
            Ok(handle)
        }
        Err(e) => {
            error!(descriptor = %info, "opening {info}: {e:#}");
            Err(Error::Construction {
                descriptor: info.to_string(),
                message: format!("{e:#}"),
            })
        }
    }
}

/// Build the complete handle list for one invocation.
///
/// # Errors
///
/// Stops at the first enumeration or construction failure; no partial list is
/// ever returned.
pub fn build_handles(
    library: &dyn DeviceLibrary,
    mode: EnumerationMode,
    filter_path: Option<&str>,
) -> Result<Vec<Handle>, Error> {
    let mut handles = Vec::new();
    for info in enumerate(library, mode, filter_path)? {
        if let Some(handle) = build(library, &info)? {
            handles.push(handle);
        }
    }
    Ok(handles)
}
