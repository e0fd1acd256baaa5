//! # offload-trigger
//!
//! Binds a PWM pulse source and a DMA receive buffer to an AXI SPI Engine
//! offload so that every PWM edge starts one hardware-driven SPI transfer.
//!
//! A provider device (matched by compatible string) owns the PWM and the
//! buffer and publishes them as a [`Trigger`]. A consumer device names its
//! provider through a firmware reference property, discovers the trigger
//! with [`get_optional`] and binds it to its streaming device with
//! [`setup`]. The sampling rate is read and written through the trigger's
//! `sampling_frequency` attribute.
//!
//! ## Module Overview
//! - [`fwnode`]   – Firmware nodes and reference resolution.
//! - [`bus`]      – Devices, drivers and the deferred-probe loop.
//! - [`devres`]   – Release actions tied to device lifetime.
//! - [`trigger`]  – Tagged triggers and the trigger registry.
//! - [`iio`]      – Consumer streaming device.
//! - [`rate`]     – Frequency to PWM period/duty mapping.
//! - [`offload`]  – The provider driver.
//! - [`consumer`] – Discovery and attach API.

pub mod bus;
pub mod config;
pub mod consumer;
pub mod devres;
pub mod error;
pub mod fwnode;
pub mod iio;
pub mod offload;
pub mod platform;
pub mod rate;
pub mod sysfs;
pub mod trigger;

pub use bus::{Device, DeviceId, DeviceInfo, DeviceRef, Driver, PlatformBus, ProbeReport, ProbeStatus};
pub use config::{OffloadConfig, OffloadConfigBuilder};
pub use consumer::{get_optional, offload_id, offload_state, setup};
pub use devres::Devres;
pub use error::{OffloadError, Result};
pub use fwnode::{FwNode, FwNodeId, FwTree, PropertyValue, ReferenceResolver};
pub use iio::{IioDevice, IioDeviceRef, IioModes};
pub use offload::{
    OffloadPwmTrigger, OffloadPwmTriggerDriver, ProbeStage, OFFLOAD_PWM_TRIGGER,
    SAMPLING_FREQUENCY,
};
pub use platform::{Platform, PlatformBuilder};
pub use rate::RateController;
pub use trigger::{Trigger, TriggerKind, TriggerOps, TriggerRef, TriggerRegistry};

#[cfg(test)]
mod tests;
