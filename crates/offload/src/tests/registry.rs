use std::any::Any;

use crate::bus::{Device, DeviceId, DeviceInfo};
use crate::error::OffloadError;
use crate::iio::{IioDevice, IioModes};
use crate::trigger::{Trigger, TriggerKind, TriggerOps, TriggerRegistry};

const SOFT: TriggerKind = TriggerKind::new("soft");

struct SoftTrigger;

impl TriggerOps for SoftTrigger {
    fn kind(&self) -> TriggerKind {
        SOFT
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn device(id: u32, name: &str) -> Device {
    Device::new(DeviceId(id), DeviceInfo::new(name))
}

#[test]
fn acquire_by_parent_takes_a_reference() {
    let registry = TriggerRegistry::new();
    let owner = device(3, "owner");
    let trigger = Trigger::new("soft0", &owner, SoftTrigger);
    assert_eq!(trigger.ref_count(), 1);

    assert!(registry.acquire_by_parent(DeviceId(3)).is_none());
    registry.register(trigger.clone()).unwrap();
    assert!(trigger.is_registered());

    let found = registry.acquire_by_parent(DeviceId(3)).unwrap();
    assert!(std::sync::Arc::ptr_eq(&found, &trigger));
    assert_eq!(trigger.ref_count(), 2);
    assert!(registry.acquire_by_parent(DeviceId(4)).is_none());

    found.put();
    assert_eq!(trigger.ref_count(), 1);
}

#[test]
fn duplicate_names_are_rejected() {
    let registry = TriggerRegistry::new();
    let a = device(1, "a");
    let b = device(2, "b");
    registry.register(Trigger::new("same", &a, SoftTrigger)).unwrap();

    let err = registry
        .register(Trigger::new("same", &b, SoftTrigger))
        .unwrap_err();
    assert_eq!(err, OffloadError::AlreadyRegistered("same".into()));
    assert_eq!(registry.len(), 1);
}

#[test]
fn unregister_hides_trigger() {
    let registry = TriggerRegistry::new();
    let owner = device(1, "owner");
    let trigger = Trigger::new("soft0", &owner, SoftTrigger);
    registry.register(trigger.clone()).unwrap();

    assert!(registry.unregister(&trigger));
    assert!(!registry.unregister(&trigger));
    assert!(!trigger.is_registered());
    assert!(registry.acquire_by_parent(DeviceId(1)).is_none());
    assert!(registry.is_empty());
}

#[test]
fn put_saturates_at_zero() {
    let owner = device(1, "owner");
    let trigger = Trigger::new("soft0", &owner, SoftTrigger);
    trigger.put();
    trigger.put();
    assert_eq!(trigger.ref_count(), 0);
}

#[test]
fn default_ops_have_no_attributes() {
    let owner = device(1, "owner");
    let trigger = Trigger::new("soft0", &owner, SoftTrigger);
    assert!(trigger.ops_as::<SoftTrigger>().is_some());
    assert!(matches!(
        trigger.show_attr("sampling_frequency"),
        Err(OffloadError::NoSuchAttribute(_))
    ));
}

#[test]
fn generic_assignment_holds_a_reference_until_detach() {
    let owner = device(1, "owner");
    let trigger = Trigger::new("soft0", &owner, SoftTrigger);
    let iio = IioDevice::new("adc", IioModes::DIRECT);

    iio.assign_trigger(&trigger).unwrap();
    assert_eq!(trigger.ref_count(), 2);
    assert!(iio.detach());
    assert!(!iio.detach());
    assert_eq!(trigger.ref_count(), 1);
}

#[test]
fn concurrent_acquire_and_put_balance() {
    let registry = TriggerRegistry::new();
    let owner = device(7, "owner");
    let trigger = Trigger::new("soft0", &owner, SoftTrigger);

    std::thread::scope(|s| {
        // Lookups start before the trigger is published and keep racing it.
        for _ in 0..8 {
            s.spawn(|| {
                let mut acquired = 0;
                while acquired < 500 {
                    if let Some(found) = registry.acquire_by_parent(DeviceId(7)) {
                        assert!(found.ref_count() >= 2);
                        found.put();
                        acquired += 1;
                    }
                }
            });
        }
        registry.register(trigger.clone()).unwrap();
    });

    assert_eq!(trigger.ref_count(), 1);
    assert!(trigger.is_registered());

    let held: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| registry.acquire_by_parent(DeviceId(7)).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(trigger.ref_count(), 5);
    for found in &held {
        found.put();
    }
    assert_eq!(trigger.ref_count(), 1);
}
