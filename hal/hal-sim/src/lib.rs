//! Host simulation HAL implementation
//!
//! Implements the HAL traits in plain memory so the offload trigger can be
//! driven from tests and host tools. Every simulated peripheral records what
//! was done to it and can be told to fail on request.
//!
//! ## Example
//! ```
//! use hal::pwm::PwmProvider;
//! use hal_sim::SimPwmProvider;
//!
//! let provider = SimPwmProvider::new();
//! let mut pwm = provider.request("trigger0").unwrap();
//! pwm.configure(10, 1_000_000).unwrap();
//! assert_eq!(provider.recorder("trigger0").unwrap().history(), vec![(10, 1_000_000)]);
//! ```

pub mod dma;
pub mod pwm;

// Re-export commonly used types
pub use dma::{SimBuffer, SimDmaAllocator};
pub use pwm::{PwmRecorder, SimPwm, SimPwmProvider};
