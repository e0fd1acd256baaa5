//! Injected platform services shared by providers and consumers.

use std::sync::Arc;

use hal::dma::DmaBufferAllocator;
use hal::pwm::PwmProvider;

use crate::bus::{DeviceInfo, DeviceRef, Driver, PlatformBus, ProbeReport};
use crate::config::OffloadConfig;
use crate::fwnode::ReferenceResolver;
use crate::trigger::TriggerRegistry;

/// Everything a probe needs: firmware description, bus, trigger registry
/// and the hardware collaborators.
pub struct Platform {
    config: OffloadConfig,
    firmware: Arc<dyn ReferenceResolver>,
    bus: PlatformBus,
    triggers: Arc<TriggerRegistry>,
    pwm: Arc<dyn PwmProvider>,
    dma: Arc<dyn DmaBufferAllocator>,
}

impl Platform {
    pub fn builder(
        firmware: Arc<dyn ReferenceResolver>,
        pwm: Arc<dyn PwmProvider>,
        dma: Arc<dyn DmaBufferAllocator>,
    ) -> PlatformBuilder {
        PlatformBuilder {
            config: OffloadConfig::default(),
            firmware,
            pwm,
            dma,
            drivers: Vec::new(),
        }
    }

    pub fn config(&self) -> &OffloadConfig {
        &self.config
    }

    pub fn firmware(&self) -> &dyn ReferenceResolver {
        self.firmware.as_ref()
    }

    pub fn bus(&self) -> &PlatformBus {
        &self.bus
    }

    pub fn triggers(&self) -> &Arc<TriggerRegistry> {
        &self.triggers
    }

    pub fn pwm(&self) -> &dyn PwmProvider {
        self.pwm.as_ref()
    }

    pub fn dma(&self) -> &dyn DmaBufferAllocator {
        self.dma.as_ref()
    }

    pub fn add_device(&self, info: DeviceInfo) -> DeviceRef {
        self.bus.add_device(info)
    }

    pub fn register_driver(&self, driver: Arc<dyn Driver>) {
        self.bus.register_driver(driver);
    }

    /// Run the deferred-probe loop over every unbound device.
    pub fn probe_pending(&self) -> ProbeReport {
        self.bus.probe_pending(self)
    }

    pub fn remove_device(&self, dev: &DeviceRef) {
        self.bus.remove_device(dev, self);
    }
}

pub struct PlatformBuilder {
    config: OffloadConfig,
    firmware: Arc<dyn ReferenceResolver>,
    pwm: Arc<dyn PwmProvider>,
    dma: Arc<dyn DmaBufferAllocator>,
    drivers: Vec<Arc<dyn Driver>>,
}

impl PlatformBuilder {
    pub fn config(mut self, config: OffloadConfig) -> Self {
        self.config = config;
        self
    }

    pub fn driver(mut self, driver: Arc<dyn Driver>) -> Self {
        self.drivers.push(driver);
        self
    }

    pub fn build(self) -> Platform {
        let platform = Platform {
            config: self.config,
            firmware: self.firmware,
            bus: PlatformBus::new(),
            triggers: Arc::new(TriggerRegistry::new()),
            pwm: self.pwm,
            dma: self.dma,
        };
        for driver in self.drivers {
            platform.register_driver(driver);
        }
        platform
    }
}
