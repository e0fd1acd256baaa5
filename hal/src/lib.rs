//! Hardware Abstraction Layer (HAL) for SPI offload triggers
//!
//! This crate provides vendor-agnostic traits for the two peripherals an
//! offload trigger owns: a periodic pulse source (PWM) and a DMA-backed
//! streaming receive buffer. Concrete implementations live in sibling crates
//! such as `hal-sim`.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod dma;
pub mod error;
pub mod pwm;

// Re-export commonly used types
pub use dma::{BufferId, DmaBuffer, DmaBufferAllocator, DmaBufferRef};
pub use error::{HalError, HalResult};
pub use pwm::{PwmDevice, PwmProvider, PwmState};
