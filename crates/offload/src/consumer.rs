//! Consumer-side discovery and attachment of offload PWM triggers.

use std::sync::Arc;

use crate::bus::Device;
use crate::error::{OffloadError, Result};
use crate::iio::{IioDevice, IioModes};
use crate::offload::{OffloadPwmTrigger, OFFLOAD_PWM_TRIGGER};
use crate::platform::Platform;
use crate::trigger::{Trigger, TriggerRef};

/// Implementation state of `trigger`, or [`OffloadError::TypeMismatch`] if it
/// was not produced by the offload PWM trigger driver.
pub fn offload_state(trigger: &Trigger) -> Result<&OffloadPwmTrigger> {
    let mismatch = || OffloadError::TypeMismatch {
        trigger: trigger.name().to_string(),
        expected: OFFLOAD_PWM_TRIGGER,
        found: trigger.kind(),
    };

    if trigger.kind() != OFFLOAD_PWM_TRIGGER {
        return Err(mismatch());
    }
    trigger.ops_as::<OffloadPwmTrigger>().ok_or_else(mismatch)
}

/// Get the offload PWM trigger referenced by `dev`, if it asks for one.
///
/// Returns `Ok(None)` when the device has no offload reference at all, and
/// [`OffloadError::Deferred`] while the referenced provider has not finished
/// probing. The reference taken on the trigger is dropped by a release
/// action on `dev`.
pub fn get_optional(platform: &Platform, dev: &Device) -> Result<Option<TriggerRef>> {
    let config = platform.config();
    let firmware = platform.firmware();

    let Some(node) = dev.fwnode() else {
        return Ok(None);
    };
    if !firmware.property_present(node, &config.offloads_property) {
        return Ok(None);
    }

    let offload = firmware.find_reference(node, &config.offloads_property, config.reference_index)?;

    let Some(offload_dev) = platform.bus().find_device_by_fwnode(offload) else {
        log::debug!("{}: offload {offload} has no device yet", dev.name());
        return Err(OffloadError::Deferred);
    };

    let Some(trigger) = platform.triggers().acquire_by_parent(offload_dev.id()) else {
        log::debug!("{}: {} has no trigger yet", dev.name(), offload_dev.name());
        return Err(OffloadError::Deferred);
    };

    let held = Arc::clone(&trigger);
    dev.devres()
        .add_action_or_reset("offload-trigger-put", move || held.put())?;

    offload_state(&trigger)?;
    log::debug!("{}: using trigger {}", dev.name(), trigger.name());
    Ok(Some(trigger))
}

/// Attach `trigger` and its buffer to `iio` for hardware-triggered streaming.
///
/// `trigger` must be an offload PWM trigger, e.g. one returned by
/// [`get_optional`]. Nothing on `iio` is touched if it is not.
pub fn setup(iio: &IioDevice, trigger: &TriggerRef) -> Result<()> {
    let state = offload_state(trigger)?;

    iio.add_modes(IioModes::BUFFER_HARDWARE | IioModes::HARDWARE_TRIGGERED);
    iio.bind_trigger(trigger.get());
    iio.attach_buffer(Arc::clone(state.buffer()))
}

/// ID of the SPI offload behind `trigger`.
pub fn offload_id(trigger: &Trigger) -> Result<u32> {
    offload_state(trigger)?;
    Ok(trigger.parent().0)
}
