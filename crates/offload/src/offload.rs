//! AXI SPI Engine offload PWM trigger: the provider driver.
//!
//! Each provider device owns one PWM and one DMA receive buffer and
//! publishes them as a single trigger. Every PWM edge starts one offload
//! transfer into the buffer.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use hal::dma::DmaBufferRef;
use parking_lot::Mutex;

use crate::bus::{DeviceId, DeviceRef, Driver};
use crate::config::OffloadConfig;
use crate::error::{probe_err, OffloadError, Result};
use crate::iio::IioDevice;
use crate::platform::Platform;
use crate::rate::RateController;
use crate::sysfs;
use crate::trigger::{Trigger, TriggerKind, TriggerOps};

/// Kind carried by every trigger this driver creates.
pub const OFFLOAD_PWM_TRIGGER: TriggerKind = TriggerKind::new("axi-spi-engine-offload-pwm");

pub const SAMPLING_FREQUENCY: &str = "sampling_frequency";

const ATTRIBUTES: &[&str] = &[SAMPLING_FREQUENCY];

/// Driver state behind an offload PWM trigger.
pub struct OffloadPwmTrigger {
    rate: Arc<RateController>,
    buffer: DmaBufferRef,
}

impl OffloadPwmTrigger {
    pub fn rate(&self) -> &RateController {
        &self.rate
    }

    pub fn buffer(&self) -> &DmaBufferRef {
        &self.buffer
    }

    pub fn sampling_frequency(&self) -> u32 {
        self.rate.rate()
    }

    pub fn set_sampling_frequency(&self, hz: u32) -> Result<()> {
        self.rate.set_rate(hz)
    }
}

impl TriggerOps for OffloadPwmTrigger {
    fn kind(&self) -> TriggerKind {
        OFFLOAD_PWM_TRIGGER
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn set_state(&self, enabled: bool) -> Result<()> {
        if enabled {
            self.rate.enable()
        } else {
            self.rate.disable();
            Ok(())
        }
    }

    fn validate_device(&self, trigger: &Trigger, consumer: &IioDevice) -> Result<()> {
        log::debug!(
            "{}: refusing generic assignment of {}",
            consumer.name(),
            trigger.name()
        );
        Err(OffloadError::invalid(format!(
            "{} can only be attached by its offload consumer",
            trigger.name()
        )))
    }

    fn attributes(&self) -> &'static [&'static str] {
        ATTRIBUTES
    }

    fn show(&self, attr: &str) -> Result<String> {
        match attr {
            SAMPLING_FREQUENCY => Ok(sysfs::emit_u32(self.sampling_frequency())),
            _ => Err(OffloadError::NoSuchAttribute(attr.to_string())),
        }
    }

    fn store(&self, attr: &str, buf: &str) -> Result<usize> {
        match attr {
            SAMPLING_FREQUENCY => {
                let hz = sysfs::parse_u32(buf)?;
                self.set_sampling_frequency(hz)?;
                Ok(buf.len())
            }
            _ => Err(OffloadError::NoSuchAttribute(attr.to_string())),
        }
    }
}

/// Provider initialization stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProbeStage {
    Uninitialized,
    PulseSourceBound,
    BufferBound,
    /// Trigger allocated and bound to its state, not yet visible.
    TriggerAllocated,
    RateConfigured,
    /// Pulse source running and trigger published in the registry.
    Enabled,
}

impl fmt::Display for ProbeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::PulseSourceBound => "pulse source bound",
            Self::BufferBound => "buffer bound",
            Self::TriggerAllocated => "trigger allocated",
            Self::RateConfigured => "rate configured",
            Self::Enabled => "enabled",
        };
        f.write_str(name)
    }
}

pub struct OffloadPwmTriggerDriver {
    config: OffloadConfig,
    stages: Mutex<BTreeMap<DeviceId, ProbeStage>>,
}

impl OffloadPwmTriggerDriver {
    pub fn new(config: OffloadConfig) -> Self {
        Self {
            config,
            stages: Mutex::new(BTreeMap::new()),
        }
    }

    /// Last stage reached by the most recent probe of `dev`.
    pub fn stage(&self, dev: DeviceId) -> ProbeStage {
        self.stages
            .lock()
            .get(&dev)
            .copied()
            .unwrap_or(ProbeStage::Uninitialized)
    }

    fn advance(&self, dev: &DeviceRef, stage: &mut ProbeStage, next: ProbeStage) {
        log::debug!("{}: {stage} -> {next}", dev.name());
        *stage = next;
        self.stages.lock().insert(dev.id(), next);
    }

    fn trigger_name(dev: &DeviceRef) -> String {
        format!("{}-{}-pwm-trigger", dev.parent().unwrap_or("platform"), dev.name())
    }

    fn bring_up(&self, dev: &DeviceRef, platform: &Platform, stage: &mut ProbeStage) -> Result<()> {
        let pwm = platform.pwm().request(dev.name()).map_err(|source| {
            probe_err(
                dev,
                OffloadError::ResourceUnavailable {
                    resource: "pwm",
                    source,
                },
                "failed to get PWM",
            )
        })?;
        let rate = Arc::new(RateController::new(pwm, self.config.duty_ns));
        self.advance(dev, stage, ProbeStage::PulseSourceBound);

        let buffer = platform
            .dma()
            .allocate(dev.name(), &self.config.buffer_channel)
            .map_err(|source| {
                probe_err(
                    dev,
                    OffloadError::ResourceUnavailable {
                        resource: "dma buffer",
                        source,
                    },
                    "failed to allocate buffer",
                )
            })?;
        let released = Arc::clone(&buffer);
        dev.devres().add_action_or_reset("buffer-release", move || {
            released.release();
        })?;
        self.advance(dev, stage, ProbeStage::BufferBound);

        let trigger = Trigger::new(
            Self::trigger_name(dev),
            dev,
            OffloadPwmTrigger {
                rate: Arc::clone(&rate),
                buffer,
            },
        );
        let owned = Arc::clone(&trigger);
        dev.devres()
            .add_action_or_reset("trigger-put", move || owned.put())?;
        self.advance(dev, stage, ProbeStage::TriggerAllocated);

        rate.set_rate(self.config.default_rate_hz)
            .map_err(|err| probe_err(dev, err, "failed to set sampling frequency"))?;
        self.advance(dev, stage, ProbeStage::RateConfigured);

        // The PWM runs for the whole lifetime of the provider, not only
        // while a consumer streams.
        rate.enable()
            .map_err(|err| probe_err(dev, err, "failed to enable PWM"))?;
        let running = Arc::clone(&rate);
        dev.devres().add_action_or_reset("pwm-disable", move || {
            running.disable();
        })?;

        platform
            .triggers()
            .register(Arc::clone(&trigger))
            .map_err(|err| probe_err(dev, err, "failed to register trigger"))?;
        let registry = Arc::clone(platform.triggers());
        dev.devres().add_action_or_reset("trigger-unregister", move || {
            registry.unregister(&trigger);
        })?;
        self.advance(dev, stage, ProbeStage::Enabled);
        Ok(())
    }
}

impl Default for OffloadPwmTriggerDriver {
    fn default() -> Self {
        Self::new(OffloadConfig::default())
    }
}

impl Driver for OffloadPwmTriggerDriver {
    fn name(&self) -> &str {
        &self.config.driver_name
    }

    fn compatible(&self) -> &str {
        &self.config.compatible
    }

    fn probe(&self, dev: &DeviceRef, platform: &Platform) -> Result<()> {
        let mut stage = ProbeStage::Uninitialized;
        self.stages.lock().insert(dev.id(), stage);
        let result = self.bring_up(dev, platform, &mut stage);
        if let Err(err) = &result {
            log::debug!("{}: probe stopped at {stage}: {err}", dev.name());
        }
        result
    }

    fn remove(&self, dev: &DeviceRef, _platform: &Platform) {
        self.stages.lock().remove(&dev.id());
    }
}
