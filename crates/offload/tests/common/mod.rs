#![allow(dead_code)]

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use hal_sim::{PwmRecorder, SimBuffer, SimDmaAllocator, SimPwmProvider};
use offload_trigger::config::DEFAULT_COMPATIBLE;
use offload_trigger::{
    get_optional, setup, DeviceInfo, DeviceRef, Driver, FwNode, FwTree, IioDevice, IioDeviceRef,
    IioModes, OffloadConfig, OffloadPwmTriggerDriver, Platform, Result, Trigger, TriggerKind,
    TriggerOps,
};

pub const ADC_COMPATIBLE: &str = "test,adc";
pub const SOFT_COMPATIBLE: &str = "test,soft-trigger";
pub const SOFT: TriggerKind = TriggerKind::new("soft");

/// A trigger from some other driver, used to exercise kind checks.
pub struct SoftTrigger;

impl TriggerOps for SoftTrigger {
    fn kind(&self) -> TriggerKind {
        SOFT
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Publishes a [`SoftTrigger`] for every device it binds.
#[derive(Default)]
pub struct SoftTriggerDriver;

impl Driver for SoftTriggerDriver {
    fn name(&self) -> &str {
        "soft-trigger"
    }

    fn compatible(&self) -> &str {
        SOFT_COMPATIBLE
    }

    fn probe(&self, dev: &DeviceRef, platform: &Platform) -> Result<()> {
        let trigger = Trigger::new(format!("{}-soft", dev.name()), dev, SoftTrigger);
        platform.triggers().register(trigger.clone())?;
        let registry = Arc::clone(platform.triggers());
        dev.devres().add_action_or_reset("trigger-unregister", move || {
            registry.unregister(&trigger);
        })
    }
}

/// SPI ADC that streams through an offload when its firmware node asks for one.
#[derive(Default)]
pub struct AdcDriver {
    devices: Arc<Mutex<BTreeMap<String, IioDeviceRef>>>,
}

impl AdcDriver {
    pub fn iio(&self, name: &str) -> Option<IioDeviceRef> {
        self.devices.lock().unwrap().get(name).cloned()
    }
}

impl Driver for AdcDriver {
    fn name(&self) -> &str {
        "test-adc"
    }

    fn compatible(&self) -> &str {
        ADC_COMPATIBLE
    }

    fn probe(&self, dev: &DeviceRef, platform: &Platform) -> Result<()> {
        let trigger = get_optional(platform, dev)?;

        let iio = Arc::new(IioDevice::new(dev.name(), IioModes::DIRECT));
        if let Some(trigger) = &trigger {
            setup(&iio, trigger)?;
        }

        self.devices
            .lock()
            .unwrap()
            .insert(dev.name().to_string(), Arc::clone(&iio));
        let devices = Arc::clone(&self.devices);
        let name = dev.name().to_string();
        dev.devres().add_action_or_reset("iio-unregister", move || {
            if let Some(iio) = devices.lock().unwrap().remove(&name) {
                iio.detach();
            }
        })
    }
}

/// Firmware with one offload provider and consumers in every interesting
/// configuration.
pub fn board() -> FwTree {
    FwTree::from_nodes([
        FwNode::new("offload0").with_compatible(DEFAULT_COMPATIBLE),
        FwNode::new("adc0")
            .with_compatible(ADC_COMPATIBLE)
            .with_reference("adi,offloads", "offload0"),
        FwNode::new("adc-plain").with_compatible(ADC_COMPATIBLE),
        FwNode::new("soft0").with_compatible(SOFT_COMPATIBLE),
        FwNode::new("adc-soft")
            .with_compatible(ADC_COMPATIBLE)
            .with_reference("adi,offloads", "soft0"),
        FwNode::new("adc-broken")
            .with_compatible(ADC_COMPATIBLE)
            .with_reference("adi,offloads", "nowhere"),
    ])
}

pub struct Fixture {
    pub tree: Arc<FwTree>,
    pub platform: Platform,
    pub pwm: Arc<SimPwmProvider>,
    pub dma: Arc<SimDmaAllocator>,
    pub offload: Arc<OffloadPwmTriggerDriver>,
    pub adc: Arc<AdcDriver>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(OffloadConfig::default())
    }

    pub fn with_config(config: OffloadConfig) -> Self {
        let tree = Arc::new(board());
        let pwm = Arc::new(SimPwmProvider::new());
        let dma = Arc::new(SimDmaAllocator::new());
        let offload = Arc::new(OffloadPwmTriggerDriver::new(config.clone()));
        let adc = Arc::new(AdcDriver::default());

        let platform = Platform::builder(tree.clone(), pwm.clone(), dma.clone())
            .config(config)
            .driver(offload.clone())
            .driver(adc.clone())
            .driver(Arc::new(SoftTriggerDriver))
            .build();

        Self {
            tree,
            platform,
            pwm,
            dma,
            offload,
            adc,
        }
    }

    /// Add the device described by firmware node `node`.
    pub fn add(&self, node: &str) -> DeviceRef {
        let fwnode = self.tree.find_by_name(node).expect("node in board");
        self.platform
            .add_device(DeviceInfo::new(node).parent("spi0").fwnode(fwnode))
    }

    pub fn pwm_of(&self, dev: &DeviceRef) -> PwmRecorder {
        self.pwm.recorder(dev.name()).expect("pwm requested")
    }

    pub fn buffer_of(&self, dev: &DeviceRef) -> Arc<SimBuffer> {
        self.dma
            .buffers()
            .into_iter()
            .rev()
            .find(|buf| buf.device() == dev.name())
            .expect("buffer allocated")
    }
}
