//! Recording PWM outputs

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use hal::error::{HalError, HalResult};
use hal::pwm::{PwmDevice, PwmProvider, PwmState};
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct Inner {
    state: PwmState,
    history: Vec<(u64, u64)>,
    enables: usize,
    disables: usize,
    fail_enable: bool,
}

/// Observer for a simulated PWM output.
///
/// Stays valid after the [`SimPwm`] itself is dropped.
#[derive(Debug, Clone)]
pub struct PwmRecorder {
    label: String,
    inner: Arc<Mutex<Inner>>,
}

impl PwmRecorder {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> PwmState {
        self.inner.lock().state
    }

    /// Every successful `configure` call as `(duty_ns, period_ns)`.
    pub fn history(&self) -> Vec<(u64, u64)> {
        self.inner.lock().history.clone()
    }

    pub fn enable_count(&self) -> usize {
        self.inner.lock().enables
    }

    pub fn disable_count(&self) -> usize {
        self.inner.lock().disables
    }

    /// Make the next and all following `enable` calls fail.
    pub fn fail_enable(&self, fail: bool) {
        self.inner.lock().fail_enable = fail;
    }
}

/// Simulated PWM output.
#[derive(Debug)]
pub struct SimPwm {
    recorder: PwmRecorder,
}

impl SimPwm {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            recorder: PwmRecorder {
                label: label.into(),
                inner: Arc::new(Mutex::new(Inner::default())),
            },
        }
    }

    pub fn recorder(&self) -> PwmRecorder {
        self.recorder.clone()
    }
}

impl PwmDevice for SimPwm {
    fn label(&self) -> &str {
        &self.recorder.label
    }

    fn configure(&mut self, duty_ns: u64, period_ns: u64) -> HalResult<()> {
        if period_ns == 0 || duty_ns > period_ns {
            return Err(HalError::InvalidParameter);
        }

        let mut inner = self.recorder.inner.lock();
        inner.state.duty_ns = duty_ns;
        inner.state.period_ns = period_ns;
        inner.history.push((duty_ns, period_ns));
        Ok(())
    }

    fn enable(&mut self) -> HalResult<()> {
        let mut inner = self.recorder.inner.lock();
        if inner.fail_enable {
            return Err(HalError::HardwareError);
        }
        inner.enables += 1;
        inner.state.enabled = true;
        Ok(())
    }

    fn disable(&mut self) {
        let mut inner = self.recorder.inner.lock();
        inner.disables += 1;
        inner.state.enabled = false;
    }

    fn state(&self) -> PwmState {
        self.recorder.state()
    }
}

/// Hands out one [`SimPwm`] per requesting device.
#[derive(Debug, Default)]
pub struct SimPwmProvider {
    next: AtomicU32,
    fail: AtomicBool,
    fail_enable: AtomicBool,
    issued: Mutex<BTreeMap<String, PwmRecorder>>,
}

impl SimPwmProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent requests fail with [`HalError::NotFound`].
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Hand out outputs whose `enable` fails.
    pub fn set_fail_enable(&self, fail: bool) {
        self.fail_enable.store(fail, Ordering::SeqCst);
    }

    /// Recorder of the most recent output handed to `consumer`.
    pub fn recorder(&self, consumer: &str) -> Option<PwmRecorder> {
        self.issued.lock().get(consumer).cloned()
    }
}

impl PwmProvider for SimPwmProvider {
    fn request(&self, consumer: &str) -> HalResult<Box<dyn PwmDevice>> {
        if self.fail.load(Ordering::SeqCst) {
            log::debug!("sim pwm: refusing request from {consumer}");
            return Err(HalError::NotFound);
        }

        let n = self.next.fetch_add(1, Ordering::SeqCst);
        let pwm = SimPwm::new(format!("pwm-sim.{n}"));
        pwm.recorder()
            .fail_enable(self.fail_enable.load(Ordering::SeqCst));
        log::debug!("sim pwm: {} -> {consumer}", pwm.label());
        self.issued
            .lock()
            .insert(consumer.to_string(), pwm.recorder());
        Ok(Box::new(pwm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configure_rejects_duty_longer_than_period() {
        let mut pwm = SimPwm::new("pwm0");
        pwm.configure(10, 100).unwrap();
        assert_eq!(pwm.configure(200, 100), Err(HalError::InvalidParameter));
        assert_eq!(pwm.configure(0, 0), Err(HalError::InvalidParameter));

        let state = pwm.state();
        assert_eq!((state.duty_ns, state.period_ns), (10, 100));
        assert_eq!(pwm.recorder().history(), vec![(10, 100)]);
    }

    #[test]
    fn recorder_tracks_enable_and_disable() {
        let mut pwm = SimPwm::new("pwm0");
        let rec = pwm.recorder();
        pwm.enable().unwrap();
        assert!(rec.state().enabled);
        pwm.disable();
        drop(pwm);
        assert!(!rec.state().enabled);
        assert_eq!(rec.enable_count(), 1);
        assert_eq!(rec.disable_count(), 1);
    }

    #[test]
    fn provider_failure_is_reported() {
        let provider = SimPwmProvider::new();
        provider.set_fail(true);
        assert_eq!(provider.request("dev").err(), Some(HalError::NotFound));
        assert!(provider.recorder("dev").is_none());
    }
}
