//! Triggers and the process-wide trigger registry.
//!
//! A [`Trigger`] is a generic container: every implementation supplies its
//! behavior through [`TriggerOps`] and stamps it with a [`TriggerKind`].
//! Code that needs implementation-specific state must check the kind first
//! and then downcast with [`Trigger::ops_as`].

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::bus::{Device, DeviceId};
use crate::error::{OffloadError, Result};
use crate::iio::IioDevice;

/// Discriminant naming the implementation that produced a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerKind(&'static str);

impl TriggerKind {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Implementation hooks of a trigger.
pub trait TriggerOps: Any + Send + Sync {
    fn kind(&self) -> TriggerKind;

    fn as_any(&self) -> &dyn Any;

    fn set_state(&self, _enabled: bool) -> Result<()> {
        Ok(())
    }

    /// Decide whether `consumer` may pick this trigger through the generic
    /// assignment path.
    fn validate_device(&self, _trigger: &Trigger, _consumer: &IioDevice) -> Result<()> {
        Ok(())
    }

    /// Names of the attributes exposed on the trigger.
    fn attributes(&self) -> &'static [&'static str] {
        &[]
    }

    fn show(&self, attr: &str) -> Result<String> {
        Err(OffloadError::NoSuchAttribute(attr.to_string()))
    }

    /// Store `buf` into `attr`, returning the number of bytes consumed.
    fn store(&self, attr: &str, _buf: &str) -> Result<usize> {
        Err(OffloadError::NoSuchAttribute(attr.to_string()))
    }
}

pub struct Trigger {
    name: String,
    parent: DeviceId,
    ops: Box<dyn TriggerOps>,
    refs: AtomicUsize,
    registered: AtomicBool,
}

pub type TriggerRef = Arc<Trigger>;

impl Trigger {
    /// Allocate a trigger owned by `parent`.
    ///
    /// The returned trigger holds one reference on behalf of its owner.
    pub fn new(name: impl Into<String>, parent: &Device, ops: impl TriggerOps) -> TriggerRef {
        Arc::new(Self {
            name: name.into(),
            parent: parent.id(),
            ops: Box::new(ops),
            refs: AtomicUsize::new(1),
            registered: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Device that physically implements this trigger.
    pub fn parent(&self) -> DeviceId {
        self.parent
    }

    pub fn kind(&self) -> TriggerKind {
        self.ops.kind()
    }

    pub fn ops(&self) -> &dyn TriggerOps {
        self.ops.as_ref()
    }

    /// Implementation state, if this trigger was built from `T`.
    pub fn ops_as<T: TriggerOps>(&self) -> Option<&T> {
        self.ops.as_any().downcast_ref::<T>()
    }

    /// Take an external reference.
    pub fn get(self: &Arc<Self>) -> TriggerRef {
        self.refs.fetch_add(1, Ordering::AcqRel);
        Arc::clone(self)
    }

    /// Drop an external reference taken with [`Trigger::get`].
    pub fn put(&self) {
        let prev = self
            .refs
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if prev.is_err() {
            log::warn!("trigger {}: reference count underflow", self.name);
        }
    }

    pub fn ref_count(&self) -> usize {
        self.refs.load(Ordering::Acquire)
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }

    pub fn set_state(&self, enabled: bool) -> Result<()> {
        self.ops.set_state(enabled)
    }

    pub fn attributes(&self) -> &'static [&'static str] {
        self.ops.attributes()
    }

    pub fn show_attr(&self, attr: &str) -> Result<String> {
        self.check_attr(attr)?;
        self.ops.show(attr)
    }

    pub fn store_attr(&self, attr: &str, buf: &str) -> Result<usize> {
        self.check_attr(attr)?;
        self.ops.store(attr, buf)
    }

    fn check_attr(&self, attr: &str) -> Result<()> {
        if self.attributes().contains(&attr) {
            Ok(())
        } else {
            Err(OffloadError::NoSuchAttribute(attr.to_string()))
        }
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("kind", &self.kind())
            .field("refs", &self.ref_count())
            .field("registered", &self.is_registered())
            .finish()
    }
}

/// Registry of published triggers, keyed by owning device.
#[derive(Debug, Default)]
pub struct TriggerRegistry {
    triggers: RwLock<Vec<TriggerRef>>,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `trigger`. Names must be unique.
    pub fn register(&self, trigger: TriggerRef) -> Result<()> {
        let mut triggers = self.triggers.write();
        if triggers.iter().any(|t| t.name() == trigger.name()) {
            return Err(OffloadError::AlreadyRegistered(trigger.name().to_string()));
        }
        trigger.registered.store(true, Ordering::Release);
        log::info!("registered trigger {}", trigger.name());
        triggers.push(trigger);
        Ok(())
    }

    /// Withdraw `trigger`. Returns `false` if it was not registered.
    pub fn unregister(&self, trigger: &Trigger) -> bool {
        let mut triggers = self.triggers.write();
        let Some(idx) = triggers.iter().position(|t| core::ptr::eq(t.as_ref(), trigger)) else {
            return false;
        };
        let removed = triggers.remove(idx);
        removed.registered.store(false, Ordering::Release);
        log::info!("unregistered trigger {}", removed.name());
        true
    }

    /// Find the trigger owned by `parent` and take a reference on it.
    pub fn acquire_by_parent(&self, parent: DeviceId) -> Option<TriggerRef> {
        self.triggers
            .read()
            .iter()
            .find(|t| t.parent() == parent)
            .map(Trigger::get)
    }

    /// Look up a trigger by name without taking a reference.
    pub fn find_by_name(&self, name: &str) -> Option<TriggerRef> {
        self.triggers
            .read()
            .iter()
            .find(|t| t.name() == name)
            .cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.triggers
            .read()
            .iter()
            .map(|t| t.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.triggers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
