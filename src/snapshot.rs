//! Device library backed by a JSON snapshot of the hardware bus.
//!
//! The snapshot lists receivers with their paired and pending devices, and
//! wired devices. It is read once per invocation; changes made through the
//! handles (pairing, unpairing, settings, profiles) are kept in memory until
//! [`SnapshotLibrary::save_if_dirty`] writes them back.

use anyhow::{anyhow, bail, Context, Result};
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info};

use crate::library::{Descriptors, DeviceLibrary};
use crate::{Device, DeviceKind, HardwareDescriptor, Receiver, MAX_SLOT};

const LOGITECH_VENDOR_ID: u16 = 0x046d;

fn default_vendor_id() -> u16 {
    LOGITECH_VENDOR_ID
}

fn default_max_devices() -> u8 {
    MAX_SLOT
}

fn default_true() -> bool {
    true
}

// Snapshot file format
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Snapshot {
    #[serde(default)]
    pub receivers: Vec<ReceiverRecord>,
    #[serde(default)]
    pub devices: Vec<WiredRecord>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReceiverRecord {
    pub path: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(default = "default_vendor_id")]
    pub vendor_id: u16,
    #[serde(default)]
    pub product_id: u16,
    #[serde(default = "default_max_devices")]
    pub max_devices: u8,
    #[serde(default)]
    pub paired: Vec<DeviceRecord>,
    // Devices that will answer the next pairing request, in order
    #[serde(default)]
    pub pending: Vec<DeviceRecord>,
    // Error reported when the node is opened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default = "default_true")]
    pub supported: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WiredRecord {
    pub path: String,
    #[serde(default = "default_vendor_id")]
    pub vendor_id: u16,
    #[serde(default)]
    pub product_id: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default = "default_true")]
    pub supported: bool,
    #[serde(flatten)]
    pub device: DeviceRecord,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DeviceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<u8>,
    pub name: String,
    pub serial: String,
    #[serde(default)]
    pub codename: String,
    #[serde(default)]
    pub kind: DeviceKind,
    #[serde(default = "default_true")]
    pub online: bool,
    #[serde(default)]
    pub settings: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles: Option<Value>,
}

impl Snapshot {
    /// Load a snapshot from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, if it contains invalid JSON,
    /// or if a paired device has no usable slot.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy();
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read snapshot from {path_str}"))?;

        let snapshot: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON from {path_str}"))?;
        snapshot
            .validate()
            .with_context(|| format!("invalid snapshot {path_str}"))?;
        Ok(snapshot)
    }

    /// Check that every paired device sits in its own slot on its receiver.
    ///
    /// # Errors
    ///
    /// Names the first receiver with a missing, out of range, or shared slot.
    pub fn validate(&self) -> Result<()> {
        for receiver in &self.receivers {
            let mut taken = Vec::with_capacity(receiver.paired.len());
            for device in &receiver.paired {
                let Some(slot) = device.slot else {
                    bail!("{}: paired device {} has no slot", receiver.path, device.name);
                };
                if !(1..=receiver.max_devices).contains(&slot) {
                    bail!(
                        "{}: paired device {} is in slot {slot}, outside 1..={}",
                        receiver.path,
                        device.name,
                        receiver.max_devices
                    );
                }
                if taken.contains(&slot) {
                    bail!("{}: slot {slot} is paired twice", receiver.path);
                }
                taken.push(slot);
            }
        }
        Ok(())
    }

    /// Save the snapshot to file
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON serialization fails or the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path_str = path.as_ref().to_string_lossy();
        let content =
            serde_json::to_string_pretty(self).context("failed to serialize snapshot to JSON")?;

        fs::write(&path, content)
            .with_context(|| format!("failed to write snapshot to {path_str}"))
    }

    fn receiver_descriptors(&self) -> impl Iterator<Item = HardwareDescriptor> + '_ {
        self.receivers.iter().map(|r| HardwareDescriptor {
            path: r.path.clone(),
            is_device: false,
            vendor_id: r.vendor_id,
            product_id: r.product_id,
        })
    }

    fn device_descriptors(&self) -> impl Iterator<Item = HardwareDescriptor> + '_ {
        self.devices.iter().map(|d| HardwareDescriptor {
            path: d.path.clone(),
            is_device: true,
            vendor_id: d.vendor_id,
            product_id: d.product_id,
        })
    }
}

// Snapshot shared by the library and every handle built from it
struct Store {
    snapshot: RefCell<Snapshot>,
    dirty: Cell<bool>,
}

impl Store {
    fn new(snapshot: Snapshot) -> Rc<Self> {
        Rc::new(Self {
            snapshot: RefCell::new(snapshot),
            dirty: Cell::new(false),
        })
    }
}

pub struct SnapshotLibrary {
    path: Option<PathBuf>,
    store: OnceCell<Rc<Store>>,
}

impl SnapshotLibrary {
    // Library reading the snapshot at `path` on first use
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: Some(path.into()),
            store: OnceCell::new(),
        }
    }

    // In-memory library, never written back
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            path: None,
            store: OnceCell::with_value(Store::new(snapshot)),
        }
    }

    fn store(&self) -> Result<&Rc<Store>> {
        self.store.get_or_try_init(|| {
            let path = self
                .path
                .as_ref()
                .ok_or_else(|| anyhow!("no snapshot configured"))?;
            debug!(path = %path.display(), "loading bus snapshot");
            Ok(Store::new(Snapshot::from_file(path)?))
        })
    }

    /// Current contents of the snapshot, including in-memory changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded.
    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(self.store()?.snapshot.borrow().clone())
    }

    /// Write the snapshot back if any handle changed it.
    ///
    /// Returns whether a write happened.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot file cannot be written.
    pub fn save_if_dirty(&self) -> Result<bool> {
        let (Some(store), Some(path)) = (self.store.get(), &self.path) else {
            return Ok(false);
        };
        if !store.dirty.get() {
            return Ok(false);
        }
        store.snapshot.borrow().save(path)?;
        store.dirty.set(false);
        info!(path = %path.display(), "saved bus snapshot");
        Ok(true)
    }
}

impl DeviceLibrary for SnapshotLibrary {
    fn receivers(&self) -> Result<Descriptors<'_>> {
        let snapshot = self.store()?.snapshot.borrow();
        let descriptors: Vec<_> = snapshot.receiver_descriptors().collect();
        Ok(Box::new(descriptors.into_iter()))
    }

    fn receivers_and_devices(&self) -> Result<Descriptors<'_>> {
        let snapshot = self.store()?.snapshot.borrow();
        let descriptors: Vec<_> = snapshot
            .receiver_descriptors()
            .chain(snapshot.device_descriptors())
            .collect();
        Ok(Box::new(descriptors.into_iter()))
    }

    fn create_receiver(&self, info: &HardwareDescriptor) -> Result<Option<Rc<dyn Receiver>>> {
        let store = self.store()?;
        let snapshot = store.snapshot.borrow();
        let (index, record) = snapshot
            .receivers
            .iter()
            .enumerate()
            .find(|(_, r)| r.path == info.path)
            .ok_or_else(|| anyhow!("no receiver at {}", info.path))?;

        if let Some(error) = &record.error {
            bail!("{error}");
        }
        if !record.supported {
            return Ok(None);
        }

        Ok(Some(Rc::new(SnapshotReceiver {
            store: Rc::clone(store),
            index,
            path: record.path.clone(),
            name: record.name.clone(),
            serial: record.serial.clone(),
            max_devices: record.max_devices,
        })))
    }

    fn create_device(&self, info: &HardwareDescriptor) -> Result<Option<Rc<dyn Device>>> {
        let store = self.store()?;
        let snapshot = store.snapshot.borrow();
        let (index, record) = snapshot
            .devices
            .iter()
            .enumerate()
            .find(|(_, d)| d.path == info.path)
            .ok_or_else(|| anyhow!("no device at {}", info.path))?;

        if let Some(error) = &record.error {
            bail!("{error}");
        }
        if !record.supported {
            return Ok(None);
        }

        Ok(Some(Rc::new(SnapshotDevice::new(
            store,
            Location::Wired { index },
            Some(record.path.clone()),
            None,
            &record.device,
        ))))
    }
}

pub struct SnapshotReceiver {
    store: Rc<Store>,
    index: usize,
    path: String,
    name: String,
    serial: Option<String>,
    max_devices: u8,
}

impl SnapshotReceiver {
    fn handle(&self, record: &DeviceRecord, slot: u8) -> Rc<dyn Device> {
        Rc::new(SnapshotDevice::new(
            &self.store,
            Location::Paired {
                receiver: self.index,
                slot,
            },
            None,
            Some(self.path.clone()),
            record,
        ))
    }
}

impl Receiver for SnapshotReceiver {
    fn path(&self) -> &str {
        &self.path
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    fn max_devices(&self) -> u8 {
        self.max_devices
    }

    fn count(&self) -> usize {
        self.store.snapshot.borrow().receivers[self.index]
            .paired
            .iter()
            .filter(|d| d.slot.is_some())
            .count()
    }

    fn device(&self, slot: u8) -> Option<Rc<dyn Device>> {
        let snapshot = self.store.snapshot.borrow();
        snapshot.receivers[self.index]
            .paired
            .iter()
            .find(|d| d.slot == Some(slot))
            .map(|record| self.handle(record, slot))
    }

    fn devices(&self) -> Box<dyn Iterator<Item = Rc<dyn Device>> + '_> {
        let snapshot = self.store.snapshot.borrow();
        let mut paired: Vec<_> = snapshot.receivers[self.index]
            .paired
            .iter()
            .filter_map(|record| record.slot.map(|slot| (slot, record)))
            .collect();
        paired.sort_by_key(|(slot, _)| *slot);

        let handles: Vec<_> = paired
            .into_iter()
            .map(|(slot, record)| self.handle(record, slot))
            .collect();
        Box::new(handles.into_iter())
    }

    fn pair_device(&self) -> Result<Option<Rc<dyn Device>>> {
        let mut snapshot = self.store.snapshot.borrow_mut();
        let record = &mut snapshot.receivers[self.index];

        let Some(slot) = (1..=self.max_devices)
            .find(|slot| record.paired.iter().all(|d| d.slot != Some(*slot)))
        else {
            bail!("{} has no free slot", self.name);
        };
        if record.pending.is_empty() {
            return Ok(None);
        }

        let mut device = record.pending.remove(0);
        device.slot = Some(slot);
        let handle = self.handle(&device, slot);
        record.paired.push(device);
        self.store.dirty.set(true);
        debug!(receiver = %self.path, slot, "paired device");
        Ok(Some(handle))
    }

    fn unpair_device(&self, slot: u8) -> Result<()> {
        let mut snapshot = self.store.snapshot.borrow_mut();
        let paired = &mut snapshot.receivers[self.index].paired;

        let Some(position) = paired.iter().position(|d| d.slot == Some(slot)) else {
            bail!("no device paired at slot {slot}");
        };
        paired.remove(position);
        self.store.dirty.set(true);
        debug!(receiver = %self.path, slot, "unpaired device");
        Ok(())
    }
}

// Where a device's record lives inside the snapshot
#[derive(Debug, Clone, Copy)]
enum Location {
    Paired { receiver: usize, slot: u8 },
    Wired { index: usize },
}

pub struct SnapshotDevice {
    store: Rc<Store>,
    location: Location,
    path: Option<String>,
    receiver_path: Option<String>,
    name: String,
    serial: String,
    codename: String,
    kind: DeviceKind,
    online: Cell<bool>,
}

impl SnapshotDevice {
    fn new(
        store: &Rc<Store>,
        location: Location,
        path: Option<String>,
        receiver_path: Option<String>,
        record: &DeviceRecord,
    ) -> Self {
        Self {
            store: Rc::clone(store),
            location,
            path,
            receiver_path,
            name: record.name.clone(),
            serial: record.serial.clone(),
            codename: record.codename.clone(),
            kind: record.kind,
            online: Cell::new(record.online),
        }
    }

    fn with_record<R>(&self, f: impl FnOnce(&DeviceRecord) -> R) -> Option<R> {
        let snapshot = self.store.snapshot.borrow();
        let record = match self.location {
            Location::Paired { receiver, slot } => snapshot
                .receivers
                .get(receiver)?
                .paired
                .iter()
                .find(|d| d.slot == Some(slot)),
            Location::Wired { index } => snapshot.devices.get(index).map(|w| &w.device),
        };
        record.map(f)
    }

    // Apply `f` to the record and mark the snapshot changed on success
    fn update_record(&self, f: impl FnOnce(&mut DeviceRecord) -> Result<()>) -> Result<()> {
        let mut snapshot = self.store.snapshot.borrow_mut();
        let record = match self.location {
            Location::Paired { receiver, slot } => snapshot
                .receivers
                .get_mut(receiver)
                .and_then(|r| r.paired.iter_mut().find(|d| d.slot == Some(slot))),
            Location::Wired { index } => snapshot.devices.get_mut(index).map(|w| &mut w.device),
        };
        let record = record.ok_or_else(|| anyhow!("{} is no longer available", self.name))?;
        f(record)?;
        self.store.dirty.set(true);
        Ok(())
    }
}

impl Device for SnapshotDevice {
    fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn serial(&self) -> &str {
        &self.serial
    }

    fn codename(&self) -> &str {
        &self.codename
    }

    fn kind(&self) -> DeviceKind {
        self.kind
    }

    fn slot(&self) -> Option<u8> {
        match self.location {
            Location::Paired { slot, .. } => Some(slot),
            Location::Wired { .. } => None,
        }
    }

    fn receiver_path(&self) -> Option<&str> {
        self.receiver_path.as_deref()
    }

    fn online(&self) -> bool {
        self.online.get()
    }

    fn ping(&self) -> bool {
        let online = self.with_record(|record| record.online).unwrap_or(false);
        self.online.set(online);
        online
    }

    fn settings(&self) -> BTreeMap<String, Value> {
        self.with_record(|record| record.settings.clone())
            .unwrap_or_default()
    }

    fn write_setting(&self, name: &str, value: Value) -> Result<()> {
        self.update_record(|record| {
            let Some(slot) = record.settings.get_mut(name) else {
                bail!("{} has no setting named {name}", record.name);
            };
            *slot = value;
            Ok(())
        })
    }

    fn profiles(&self) -> Option<Value> {
        self.with_record(|record| record.profiles.clone()).flatten()
    }

    fn write_profiles(&self, profiles: Value) -> Result<()> {
        self.update_record(|record| {
            if record.profiles.is_none() {
                bail!("{} does not support onboard profiles", record.name);
            }
            record.profiles = Some(profiles);
            Ok(())
        })
    }
}
