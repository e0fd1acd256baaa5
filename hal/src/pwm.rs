//! Pulse source (PWM) abstraction
//!
//! Periods and duty cycles are expressed in nanoseconds, matching how
//! sampling rates are converted by the offload trigger.

use alloc::boxed::Box;

use crate::error::HalResult;

/// Snapshot of a PWM output's configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PwmState {
    pub period_ns: u64,
    pub duty_ns: u64,
    pub enabled: bool,
}

/// A single PWM output exclusively owned by one driver.
pub trait PwmDevice: Send {
    /// Human-readable label of the output, e.g. `"pwm0.1"`.
    fn label(&self) -> &str;

    /// Apply duty cycle and period in one step.
    ///
    /// Implementations must reject `period_ns == 0` and
    /// `duty_ns > period_ns` with [`HalError::InvalidParameter`] without
    /// changing the current configuration.
    ///
    /// [`HalError::InvalidParameter`]: crate::HalError::InvalidParameter
    fn configure(&mut self, duty_ns: u64, period_ns: u64) -> HalResult<()>;

    /// Enable PWM output
    fn enable(&mut self) -> HalResult<()>;

    /// Disable PWM output
    fn disable(&mut self);

    /// Current configuration
    fn state(&self) -> PwmState;

    /// Currently configured period, 0 if never configured
    fn period_ns(&self) -> u64 {
        self.state().period_ns
    }
}

/// Source of PWM outputs, keyed by the name of the consuming device.
pub trait PwmProvider: Send + Sync {
    fn request(&self, consumer: &str) -> HalResult<Box<dyn PwmDevice>>;
}
