//! Sampling-rate control of the trigger's pulse source.
//!
//! The controller is the only owner of the PWM; period and duty cannot be
//! changed by any other path.

use hal::error::HalError;
use hal::pwm::{PwmDevice, PwmState};
use parking_lot::Mutex;

use crate::error::{OffloadError, Result};

pub const NSEC_PER_SEC: u64 = 1_000_000_000;

/// Period in nanoseconds for `hz`, rounded up.
pub fn period_for_rate(hz: u32) -> Result<u64> {
    if hz == 0 {
        return Err(OffloadError::invalid("sampling frequency must be non-zero"));
    }
    Ok(NSEC_PER_SEC.div_ceil(u64::from(hz)))
}

/// Frequency for `period_ns`, rounded to nearest. A zero period reads as 0 Hz.
pub fn rate_for_period(period_ns: u64) -> u32 {
    if period_ns == 0 {
        return 0;
    }
    ((NSEC_PER_SEC + period_ns / 2) / period_ns) as u32
}

struct PulseSource {
    pwm: Box<dyn PwmDevice>,
    enabled: bool,
}

pub struct RateController {
    source: Mutex<PulseSource>,
    duty_ns: u32,
}

impl RateController {
    pub fn new(pwm: Box<dyn PwmDevice>, duty_ns: u32) -> Self {
        Self {
            source: Mutex::new(PulseSource {
                pwm,
                enabled: false,
            }),
            duty_ns,
        }
    }

    pub fn duty_ns(&self) -> u32 {
        self.duty_ns
    }

    /// Program the pulse source for `hz` samples per second.
    ///
    /// The duty cycle stays at the configured minimum whatever the rate.
    /// On error the previous configuration is left untouched.
    pub fn set_rate(&self, hz: u32) -> Result<()> {
        let period_ns = period_for_rate(hz)?;
        let duty_ns = u64::from(self.duty_ns);
        if duty_ns > period_ns {
            return Err(OffloadError::invalid(format!(
                "{hz} Hz is too fast for a {duty_ns} ns pulse"
            )));
        }

        let mut pulse = self.source.lock();
        pulse
            .pwm
            .configure(duty_ns, period_ns)
            .map_err(|err| match err {
                HalError::InvalidParameter => {
                    OffloadError::invalid(format!("pulse source rejected {hz} Hz"))
                }
                other => OffloadError::ResourceUnavailable {
                    resource: "pwm",
                    source: other,
                },
            })?;
        log::debug!(
            "{}: {hz} Hz -> period {period_ns} ns, duty {duty_ns} ns",
            pulse.pwm.label()
        );
        Ok(())
    }

    /// Frequency currently produced by the pulse source, 0 if unconfigured.
    pub fn rate(&self) -> u32 {
        rate_for_period(self.source.lock().pwm.period_ns())
    }

    pub fn state(&self) -> PwmState {
        self.source.lock().pwm.state()
    }

    pub fn is_enabled(&self) -> bool {
        self.source.lock().enabled
    }

    /// Start the pulse source. Enabling twice is a no-op.
    pub fn enable(&self) -> Result<()> {
        let mut pulse = self.source.lock();
        if pulse.enabled {
            return Ok(());
        }
        pulse
            .pwm
            .enable()
            .map_err(|source| OffloadError::ResourceUnavailable {
                resource: "pwm",
                source,
            })?;
        pulse.enabled = true;
        Ok(())
    }

    /// Stop the pulse source. Returns `false` if it was not running.
    pub fn disable(&self) -> bool {
        let mut pulse = self.source.lock();
        if !pulse.enabled {
            return false;
        }
        pulse.pwm.disable();
        pulse.enabled = false;
        true
    }
}
