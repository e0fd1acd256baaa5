//! A simulated board with the offload drivers bound.

use std::sync::Arc;

use anyhow::{anyhow, bail};
use hal_sim::{SimDmaAllocator, SimPwmProvider};
use offload_trigger::{
    offload_state, OffloadPwmTriggerDriver, Platform, ProbeReport, ProbeStatus, TriggerRef,
    SAMPLING_FREQUENCY,
};
use serde::Serialize;

use crate::adc::SpiAdcDriver;
use crate::board::Board;

/// Faults injected into the simulated hardware before probing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    pub pwm_request: bool,
    pub pwm_enable: bool,
    pub dma_alloc: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceSummary {
    pub name: String,
    pub status: String,
    pub trigger: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TriggerSummary {
    pub name: String,
    pub kind: String,
    pub sampling_frequency: Option<u32>,
    pub pwm_enabled: Option<bool>,
    pub refs: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub devices: Vec<DeviceSummary>,
    pub triggers: Vec<TriggerSummary>,
    pub live_buffers: usize,
}

pub struct Session {
    platform: Platform,
    adc: Arc<SpiAdcDriver>,
    dma: Arc<SimDmaAllocator>,
}

impl Session {
    pub fn new(board: &Board, faults: Faults) -> anyhow::Result<Self> {
        let tree = Arc::new(board.firmware());
        let infos = board.device_infos(&tree)?;

        let pwm = Arc::new(SimPwmProvider::new());
        pwm.set_fail(faults.pwm_request);
        pwm.set_fail_enable(faults.pwm_enable);
        let dma = Arc::new(SimDmaAllocator::new());
        dma.set_fail(faults.dma_alloc);

        let adc = Arc::new(SpiAdcDriver::new(board.adc_compatible.clone()));
        let platform = Platform::builder(tree, pwm, dma.clone())
            .config(board.config.clone())
            .driver(Arc::new(OffloadPwmTriggerDriver::new(board.config.clone())))
            .driver(adc.clone())
            .build();

        for info in infos {
            platform.add_device(info);
        }

        Ok(Self { platform, adc, dma })
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn probe(&self) -> ProbeReport {
        self.platform.probe_pending()
    }

    fn trigger(&self, name: Option<&str>) -> anyhow::Result<TriggerRef> {
        let triggers = self.platform.triggers();
        match name {
            Some(name) => triggers
                .find_by_name(name)
                .ok_or_else(|| anyhow!("no trigger named {name}")),
            None => {
                let names = triggers.names();
                match names.as_slice() {
                    [only] => triggers
                        .find_by_name(only)
                        .ok_or_else(|| anyhow!("trigger {only} vanished")),
                    [] => bail!("no trigger registered"),
                    _ => bail!("several triggers registered, pick one of {names:?}"),
                }
            }
        }
    }

    /// Write `value` to the `sampling_frequency` attribute of a trigger.
    pub fn store_rate(&self, trigger: Option<&str>, value: &str) -> anyhow::Result<usize> {
        let trigger = self.trigger(trigger)?;
        trigger
            .store_attr(SAMPLING_FREQUENCY, value)
            .map_err(|err| anyhow!("{}: {err} ({})", trigger.name(), err.errno()))
    }

    pub fn show_rate(&self, trigger: Option<&str>) -> anyhow::Result<String> {
        let trigger = self.trigger(trigger)?;
        Ok(trigger.show_attr(SAMPLING_FREQUENCY)?)
    }

    pub fn remove(&self, name: &str) -> anyhow::Result<()> {
        let dev = self
            .platform
            .bus()
            .find_device_by_name(name)
            .ok_or_else(|| anyhow!("no device named {name}"))?;
        self.platform.remove_device(&dev);
        Ok(())
    }

    pub fn summary(&self) -> Summary {
        let devices = self
            .platform
            .bus()
            .devices()
            .into_iter()
            .map(|dev| {
                let status = match dev.status() {
                    ProbeStatus::Pending => "pending".to_string(),
                    ProbeStatus::Deferred => "deferred".to_string(),
                    ProbeStatus::Bound(driver) => format!("bound to {driver}"),
                    ProbeStatus::Failed(err) => format!("failed: {err}"),
                    ProbeStatus::Removed => "removed".to_string(),
                };
                let trigger = self
                    .adc
                    .iio(dev.name())
                    .and_then(|iio| iio.trigger())
                    .map(|t| t.name().to_string());
                DeviceSummary {
                    name: dev.name().to_string(),
                    status,
                    trigger,
                }
            })
            .collect();

        let registry = self.platform.triggers();
        let triggers = registry
            .names()
            .into_iter()
            .filter_map(|name| registry.find_by_name(&name))
            .map(|trigger| {
                let state = offload_state(&trigger).ok();
                TriggerSummary {
                    name: trigger.name().to_string(),
                    kind: trigger.kind().to_string(),
                    sampling_frequency: state.map(|s| s.sampling_frequency()),
                    pwm_enabled: state.map(|s| s.rate().is_enabled()),
                    refs: trigger.ref_count(),
                }
            })
            .collect();

        Summary {
            devices,
            triggers,
            live_buffers: self.dma.live_count(),
        }
    }
}
