//! Consumer-side streaming device (IIO-style).

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

use hal::dma::DmaBufferRef;
use parking_lot::Mutex;

use crate::error::{OffloadError, Result};
use crate::trigger::TriggerRef;

/// Operating modes a device supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IioModes(u32);

impl IioModes {
    pub const DIRECT: Self = Self(0x01);
    pub const BUFFER_TRIGGERED: Self = Self(0x02);
    pub const BUFFER_SOFTWARE: Self = Self(0x04);
    pub const BUFFER_HARDWARE: Self = Self(0x08);
    pub const EVENT_TRIGGERED: Self = Self(0x10);
    pub const HARDWARE_TRIGGERED: Self = Self(0x20);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for IioModes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for IioModes {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

#[derive(Default)]
struct IioState {
    modes: IioModes,
    trigger: Option<TriggerRef>,
    buffers: Vec<DmaBufferRef>,
}

/// A consumer device that streams samples into attached buffers.
///
/// The device holds its own reference on its active trigger, dropped by
/// [`IioDevice::detach`] or when the device is dropped.
pub struct IioDevice {
    name: String,
    state: Mutex<IioState>,
}

pub type IioDeviceRef = Arc<IioDevice>;

impl IioDevice {
    pub fn new(name: impl Into<String>, modes: IioModes) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(IioState {
                modes,
                ..IioState::default()
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modes(&self) -> IioModes {
        self.state.lock().modes
    }

    pub fn add_modes(&self, modes: IioModes) {
        self.state.lock().modes |= modes;
    }

    /// Active trigger, if any.
    pub fn trigger(&self) -> Option<TriggerRef> {
        self.state.lock().trigger.clone()
    }

    pub fn buffers(&self) -> Vec<DmaBufferRef> {
        self.state.lock().buffers.clone()
    }

    /// Make `trigger` the active trigger. `trigger` must already carry a
    /// reference for this device; the reference on any previous trigger is
    /// dropped.
    pub fn bind_trigger(&self, trigger: TriggerRef) {
        let old = self.state.lock().trigger.replace(trigger);
        if let Some(old) = old {
            old.put();
        }
    }

    /// Generic "pick any trigger" path. The trigger gets a veto through
    /// `validate_device`.
    pub fn assign_trigger(&self, trigger: &TriggerRef) -> Result<()> {
        trigger.ops().validate_device(trigger, self)?;
        self.bind_trigger(trigger.get());
        Ok(())
    }

    pub fn attach_buffer(&self, buffer: DmaBufferRef) -> Result<()> {
        let mut state = self.state.lock();
        if state.buffers.iter().any(|b| b.id() == buffer.id()) {
            return Err(OffloadError::AlreadyRegistered(format!(
                "{}: {}",
                self.name,
                buffer.id()
            )));
        }
        log::debug!("{}: attached {} ({})", self.name, buffer.id(), buffer.channel());
        state.buffers.push(buffer);
        Ok(())
    }

    /// Drop the active trigger reference and all attached buffers.
    ///
    /// Returns `false` if there was nothing to detach.
    pub fn detach(&self) -> bool {
        let (trigger, buffers) = {
            let mut state = self.state.lock();
            (state.trigger.take(), core::mem::take(&mut state.buffers))
        };
        let had_any = trigger.is_some() || !buffers.is_empty();
        if let Some(trigger) = trigger {
            log::debug!("{}: detached from {}", self.name, trigger.name());
            trigger.put();
        }
        had_any
    }
}

impl Drop for IioDevice {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for IioDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("IioDevice")
            .field("name", &self.name)
            .field("modes", &state.modes)
            .field("trigger", &state.trigger.as_ref().map(|t| t.name().to_string()))
            .field("buffers", &state.buffers.iter().map(|b| b.id()).collect::<Vec<_>>())
            .finish()
    }
}
