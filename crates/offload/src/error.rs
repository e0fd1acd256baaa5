//! Error taxonomy shared by discovery, attach, rate control and probing.

use hal::HalError;
use thiserror::Error;

use crate::bus::Device;
use crate::trigger::TriggerKind;

pub const ENOENT: i32 = 2;
pub const ENOMEM: i32 = 12;
pub const EBUSY: i32 = 16;
pub const ENODEV: i32 = 19;
pub const EINVAL: i32 = 22;
pub const EPROBE_DEFER: i32 = 517;

/// Errors produced while discovering, attaching or driving an offload trigger.
///
/// "No trigger requested" is not an error: discovery returns `Ok(None)`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OffloadError {
    /// A dependency has not finished probing. The caller should retry.
    #[error("dependency not ready, probe deferred")]
    Deferred,
    #[error("malformed firmware reference: {0}")]
    Malformed(String),
    #[error("trigger {trigger} has kind {found}, expected {expected}")]
    TypeMismatch {
        trigger: String,
        expected: TriggerKind,
        found: TriggerKind,
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("failed to acquire {resource}: {source}")]
    ResourceUnavailable {
        resource: &'static str,
        source: HalError,
    },
    #[error("{0} is already registered")]
    AlreadyRegistered(String),
    #[error("no attribute named {0}")]
    NoSuchAttribute(String),
    #[error("device {0} has been torn down")]
    DeviceGone(String),
}

impl OffloadError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred)
    }

    /// Negative errno equivalent, as returned through attribute stores.
    pub fn errno(&self) -> i32 {
        let code = match self {
            Self::Deferred => EPROBE_DEFER,
            Self::Malformed(_) | Self::TypeMismatch { .. } | Self::InvalidArgument(_) => EINVAL,
            Self::ResourceUnavailable { source, .. } => match source {
                HalError::OutOfMemory => ENOMEM,
                HalError::Busy => EBUSY,
                HalError::NotFound => ENOENT,
                HalError::InvalidParameter => EINVAL,
                HalError::VendorError(code) if *code > 0 => *code,
                _ => ENODEV,
            },
            Self::AlreadyRegistered(_) => EBUSY,
            Self::NoSuchAttribute(_) => ENOENT,
            Self::DeviceGone(_) => ENODEV,
        };
        -code
    }
}

pub type Result<T> = core::result::Result<T, OffloadError>;

/// Log a probe failure the way the bus expects and hand the error back.
///
/// Deferrals are routine during boot and are only logged at debug level.
pub fn probe_err(dev: &Device, err: OffloadError, what: &str) -> OffloadError {
    if err.is_deferred() {
        log::debug!("{}: {what}: deferred", dev.name());
    } else {
        log::error!("{}: {what}: {err}", dev.name());
    }
    err
}
