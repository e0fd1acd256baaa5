//! Minimal SPI ADC consumer driver.

use std::collections::BTreeMap;
use std::sync::Arc;

use offload_trigger::{
    get_optional, offload_id, setup, DeviceRef, Driver, IioDevice, IioDeviceRef, IioModes,
    Platform, Result,
};
use parking_lot::Mutex;

pub const DEFAULT_ADC_COMPATIBLE: &str = "adi,ad7944";

/// Streams through an offload when its firmware node references one, and
/// falls back to direct-mode reads otherwise.
pub struct SpiAdcDriver {
    compatible: String,
    devices: Arc<Mutex<BTreeMap<String, IioDeviceRef>>>,
}

impl SpiAdcDriver {
    pub fn new(compatible: impl Into<String>) -> Self {
        Self {
            compatible: compatible.into(),
            devices: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    pub fn iio(&self, name: &str) -> Option<IioDeviceRef> {
        self.devices.lock().get(name).cloned()
    }
}

impl Default for SpiAdcDriver {
    fn default() -> Self {
        Self::new(DEFAULT_ADC_COMPATIBLE)
    }
}

impl Driver for SpiAdcDriver {
    fn name(&self) -> &str {
        "spi-adc"
    }

    fn compatible(&self) -> &str {
        &self.compatible
    }

    fn probe(&self, dev: &DeviceRef, platform: &Platform) -> Result<()> {
        let trigger = get_optional(platform, dev)?;

        let iio = Arc::new(IioDevice::new(dev.name(), IioModes::DIRECT));
        if let Some(trigger) = &trigger {
            setup(&iio, trigger)?;
            log::info!(
                "{}: streaming via offload {} ({})",
                dev.name(),
                offload_id(trigger)?,
                trigger.name()
            );
        }

        self.devices
            .lock()
            .insert(dev.name().to_string(), Arc::clone(&iio));
        let devices = Arc::clone(&self.devices);
        let name = dev.name().to_string();
        dev.devres().add_action_or_reset("iio-unregister", move || {
            if let Some(iio) = devices.lock().remove(&name) {
                iio.detach();
            }
        })
    }
}
