//! Host-side simulator for SPI offload PWM triggers.
//!
//! Loads a JSON board description, binds the offload trigger driver and a
//! simple SPI ADC consumer on a simulated bus, and exposes the trigger's
//! `sampling_frequency` attribute so it can be exercised from the command
//! line.

mod adc;
mod board;
mod session;

pub use adc::{SpiAdcDriver, DEFAULT_ADC_COMPATIBLE};
pub use board::{Board, BoardDevice};
pub use session::{DeviceSummary, Faults, Session, Summary, TriggerSummary};

#[cfg(test)]
mod tests;
