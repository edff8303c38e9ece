//! Resolution of user-supplied tokens to receivers and devices.
//!
//! A token may be a slot number (`1`..`6`), a serial number, a codename, a
//! device kind, or a fragment of a name. Matching is case-insensitive.
//! Resolution works on the handle list already built for the invocation; the
//! only hardware access it performs is pinging wired devices as they are
//! reached.

use std::iter;
use std::rc::Rc;
use std::slice;

use crate::error::Error;
use crate::{invariant, Device, Handle, Receiver, MAX_SLOT};

pub type FindReceiver =
    for<'a> fn(&'a [Handle], &str) -> Result<Option<&'a Rc<dyn Receiver>>, Error>;

pub type FindDevice = for<'a> fn(&'a [Handle], &str) -> Result<DeviceMatches<'a>, Error>;

/// The two resolvers handed to every action handler.
#[derive(Clone, Copy)]
pub struct Resolvers {
    pub find_receiver: FindReceiver,
    pub find_device: FindDevice,
}

impl Default for Resolvers {
    fn default() -> Self {
        Self {
            find_receiver,
            find_device,
        }
    }
}

/// Slot number named by `token`, if it is a single digit in `1..=6`.
///
/// Anything else, including `0` and multi-digit numbers, falls through to name
/// matching. Only ASCII digits name a slot: `"٣"` or `"３"` is matched as a
/// name fragment.
#[must_use]
pub fn slot_number(token: &str) -> Option<u8> {
    let mut chars = token.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return None;
    };
    c.to_digit(10)
        .and_then(|n| u8::try_from(n).ok())
        .filter(|n| (1..=MAX_SLOT).contains(n))
}

/// First receiver whose name contains `token` or whose serial equals it.
///
/// Wired devices in `handles` are skipped even when their name or serial would
/// match, so a device is never handed out as a receiver.
///
/// # Errors
///
/// Returns [`Error::Invariant`] if `handles` or `token` is empty.
pub fn find_receiver<'a>(
    handles: &'a [Handle],
    token: &str,
) -> Result<Option<&'a Rc<dyn Receiver>>, Error> {
    invariant!(!handles.is_empty());
    invariant!(!token.is_empty());

    let token = token.to_lowercase();
    Ok(handles.iter().filter_map(Handle::as_receiver).find(|r| {
        r.name().to_lowercase().contains(&token)
            || r.serial().is_some_and(|serial| serial.to_lowercase() == token)
    }))
}

/// Lazily match devices across every receiver and wired device in `handles`.
///
/// # Errors
///
/// Returns [`Error::Invariant`] if `handles` or `token` is empty.
pub fn find_device<'a>(handles: &'a [Handle], token: &str) -> Result<DeviceMatches<'a>, Error> {
    invariant!(!handles.is_empty());
    invariant!(!token.is_empty());

    Ok(DeviceMatches {
        handles: handles.iter(),
        token: token.to_lowercase(),
        slot: slot_number(token),
        slot_hit: None,
        receiver: None,
        scan: None,
    })
}

/// Whether `dev` is named by the lowercased `token`.
#[must_use]
pub fn device_matches(token: &str, dev: &dyn Device) -> bool {
    token == dev.serial().to_lowercase()
        || token == dev.codename().to_lowercase()
        || token == dev.kind().to_string()
        || dev.name().to_lowercase().contains(token)
}

/// Iterator returned by [`find_device`].
///
/// For each receiver, the device at the requested slot comes first, then every
/// paired device that matches by identifier or name. The scan of a receiver
/// stops after as many devices as it reports paired; a receiver reporting zero
/// is scanned to the end.
pub struct DeviceMatches<'a> {
    handles: slice::Iter<'a, Handle>,
    token: String,
    slot: Option<u8>,
    slot_hit: Option<Rc<dyn Device>>,
    // Receiver whose paired devices are scanned next
    receiver: Option<&'a Rc<dyn Receiver>>,
    scan: Option<Box<dyn Iterator<Item = Rc<dyn Device>> + 'a>>,
}

impl<'a> Iterator for DeviceMatches<'a> {
    type Item = Rc<dyn Device>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(dev) = self.slot_hit.take() {
                return Some(dev);
            }

            if let Some(r) = self.receiver.take() {
                // A receiver reporting no paired devices is scanned in full
                let scan: Box<dyn Iterator<Item = Rc<dyn Device>> + 'a> = match r.count() {
                    0 => r.devices(),
                    count => Box::new(r.devices().take(count)),
                };
                self.scan = Some(scan);
            }

            if let Some(scan) = self.scan.as_mut() {
                for dev in scan.by_ref() {
                    if device_matches(&self.token, dev.as_ref()) {
                        return Some(dev);
                    }
                }
                self.scan = None;
            }

            match self.handles.next()? {
                Handle::Receiver(r) => {
                    if let Some(slot) = self.slot {
                        self.slot_hit = r.device(slot);
                    }
                    self.receiver = Some(r);
                }
                Handle::Device(d) => {
                    d.ping();
                    self.scan = Some(Box::new(iter::once(Rc::clone(d))));
                }
            }
        }
    }
}
