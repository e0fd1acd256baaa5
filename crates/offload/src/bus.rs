//! Platform bus: devices, drivers, matching and deferred probing.
//!
//! The bus owns the retry loop for [`OffloadError::Deferred`]: devices whose
//! probe was deferred are retried whenever another device binds, until a
//! full pass makes no progress.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::devres::Devres;
use crate::error::{OffloadError, Result};
use crate::fwnode::FwNodeId;
use crate::platform::Platform;

/// Unique identifier for a device on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(pub u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Description of a device to add to the bus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceInfo {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub parent: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub fwnode: Option<FwNodeId>,
    /// Overrides the compatible string of `fwnode`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub compatible: Option<String>,
}

impl DeviceInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn fwnode(mut self, node: FwNodeId) -> Self {
        self.fwnode = Some(node);
        self
    }

    pub fn compatible(mut self, compatible: impl Into<String>) -> Self {
        self.compatible = Some(compatible.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    Pending,
    Deferred,
    Bound(String),
    Failed(OffloadError),
    Removed,
}

pub struct Device {
    id: DeviceId,
    name: String,
    parent: Option<String>,
    fwnode: Option<FwNodeId>,
    compatible: Option<String>,
    devres: Devres,
    status: Mutex<ProbeStatus>,
}

pub type DeviceRef = Arc<Device>;

impl Device {
    pub fn new(id: DeviceId, info: DeviceInfo) -> Self {
        Self {
            id,
            devres: Devres::new(info.name.clone()),
            name: info.name,
            parent: info.parent,
            fwnode: info.fwnode,
            compatible: info.compatible,
            status: Mutex::new(ProbeStatus::Pending),
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn fwnode(&self) -> Option<FwNodeId> {
        self.fwnode
    }

    pub fn compatible(&self) -> Option<&str> {
        self.compatible.as_deref()
    }

    pub fn devres(&self) -> &Devres {
        &self.devres
    }

    pub fn status(&self) -> ProbeStatus {
        self.status.lock().clone()
    }

    pub fn is_bound(&self) -> bool {
        matches!(*self.status.lock(), ProbeStatus::Bound(_))
    }

    pub fn is_removed(&self) -> bool {
        matches!(*self.status.lock(), ProbeStatus::Removed)
    }

    fn set_status(&self, status: ProbeStatus) {
        *self.status.lock() = status;
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("fwnode", &self.fwnode)
            .field("status", &self.status())
            .finish()
    }
}

/// Driver bound to devices by compatible string.
pub trait Driver: Send + Sync {
    fn name(&self) -> &str;

    fn compatible(&self) -> &str;

    /// Bring up `dev`. Resources must be paired with devres actions on
    /// `dev` so the bus can undo a failed probe.
    fn probe(&self, dev: &DeviceRef, platform: &Platform) -> Result<()>;

    /// Called before the device's devres actions run on removal.
    fn remove(&self, _dev: &DeviceRef, _platform: &Platform) {}
}

/// Outcome of one [`PlatformBus::probe_pending`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport {
    pub bound: Vec<String>,
    pub deferred: Vec<String>,
    pub failed: Vec<(String, OffloadError)>,
    pub passes: usize,
}

#[derive(Default)]
pub struct PlatformBus {
    next_id: AtomicU32,
    devices: RwLock<Vec<DeviceRef>>,
    drivers: RwLock<Vec<Arc<dyn Driver>>>,
}

impl PlatformBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_device(&self, info: DeviceInfo) -> DeviceRef {
        let id = DeviceId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let dev = Arc::new(Device::new(id, info));
        log::debug!("bus: added {} (id {id})", dev.name());
        self.devices.write().push(Arc::clone(&dev));
        dev
    }

    pub fn register_driver(&self, driver: Arc<dyn Driver>) {
        log::debug!("bus: registered driver {}", driver.name());
        self.drivers.write().push(driver);
    }

    pub fn devices(&self) -> Vec<DeviceRef> {
        self.devices.read().clone()
    }

    pub fn find_device_by_name(&self, name: &str) -> Option<DeviceRef> {
        self.devices
            .read()
            .iter()
            .find(|dev| dev.name() == name && !dev.is_removed())
            .cloned()
    }

    /// Live device described by `node`, whether or not it is bound yet.
    pub fn find_device_by_fwnode(&self, node: FwNodeId) -> Option<DeviceRef> {
        self.devices
            .read()
            .iter()
            .find(|dev| dev.fwnode() == Some(node) && !dev.is_removed())
            .cloned()
    }

    fn driver_for(&self, compatible: &str) -> Option<Arc<dyn Driver>> {
        self.drivers
            .read()
            .iter()
            .find(|drv| drv.compatible() == compatible)
            .cloned()
    }

    /// Probe every unbound device, retrying deferred ones until no pass
    /// binds anything new.
    pub fn probe_pending(&self, platform: &Platform) -> ProbeReport {
        let mut report = ProbeReport::default();

        loop {
            report.passes += 1;
            let mut progress = false;

            for dev in self.devices() {
                if self.probe_device(&dev, platform).is_ok_and(|bound| bound) {
                    progress = true;
                }
            }

            if !progress {
                break;
            }
        }

        for dev in self.devices() {
            match dev.status() {
                ProbeStatus::Bound(_) => report.bound.push(dev.name().to_string()),
                ProbeStatus::Deferred => report.deferred.push(dev.name().to_string()),
                ProbeStatus::Failed(err) => report.failed.push((dev.name().to_string(), err)),
                ProbeStatus::Pending | ProbeStatus::Removed => {}
            }
        }
        report
    }

    /// Probe one pending or deferred device. `Ok(false)` means no driver
    /// matched or the device is not waiting for a probe.
    pub fn probe_device(&self, dev: &DeviceRef, platform: &Platform) -> Result<bool> {
        if !matches!(dev.status(), ProbeStatus::Pending | ProbeStatus::Deferred) {
            log::debug!("{}: not awaiting probe ({:?})", dev.name(), dev.status());
            return Ok(false);
        }

        let compatible = dev
            .compatible()
            .map(str::to_string)
            .or_else(|| dev.fwnode().and_then(|node| platform.firmware().compatible(node)));
        let Some(driver) = compatible.as_deref().and_then(|c| self.driver_for(c)) else {
            return Ok(false);
        };

        dev.devres().reopen();
        match driver.probe(dev, platform) {
            Ok(()) => {
                log::info!("{}: bound to {}", dev.name(), driver.name());
                dev.set_status(ProbeStatus::Bound(driver.name().to_string()));
                Ok(true)
            }
            Err(err) => {
                let released = dev.devres().release_all();
                if err.is_deferred() {
                    log::debug!("{}: probe deferred ({released} actions undone)", dev.name());
                    dev.set_status(ProbeStatus::Deferred);
                } else {
                    log::error!("{}: probe with {} failed: {err}", dev.name(), driver.name());
                    dev.set_status(ProbeStatus::Failed(err.clone()));
                }
                Err(err)
            }
        }
    }

    /// Tear a device down. Removing an already removed device does nothing.
    pub fn remove_device(&self, dev: &DeviceRef, platform: &Platform) {
        let status = dev.status();
        if status == ProbeStatus::Removed {
            log::warn!("{}: already removed", dev.name());
            return;
        }

        if let ProbeStatus::Bound(name) = &status {
            let driver = self.drivers.read().iter().find(|d| d.name() == name).cloned();
            if let Some(driver) = driver {
                driver.remove(dev, platform);
            }
        }
        dev.set_status(ProbeStatus::Removed);
        let released = dev.devres().release_all();
        log::info!("{}: removed ({released} actions released)", dev.name());
    }
}
