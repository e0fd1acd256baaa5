//! Configuration for the offload trigger driver and its consumers.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Firmware property on a consumer that references its offload.
pub const DEFAULT_OFFLOADS_PROPERTY: &str = "adi,offloads";
pub const DEFAULT_COMPATIBLE: &str = "adi,axi-spi-engine-offload-pwm-trigger-dma-output";
pub const DEFAULT_DRIVER_NAME: &str = "axi-spi-engine-offload-pwm-trigger";
pub const DEFAULT_BUFFER_CHANNEL: &str = "rx";
pub const DEFAULT_RATE_HZ: u32 = 1000;
/// Minimum high time of each trigger pulse.
///
/// Kept short and non-zero so the offload engine sees an edge rather than a
/// level on every period.
pub const DEFAULT_DUTY_NS: u32 = 10;

/// Offload trigger configuration.
///
/// `duty_ns` is not exposed as a runtime attribute; it can only
/// be chosen here, before the provider probes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct OffloadConfig {
    pub offloads_property: String,
    pub reference_index: usize,
    pub buffer_channel: String,
    pub default_rate_hz: u32,
    pub duty_ns: u32,
    pub compatible: String,
    pub driver_name: String,
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            offloads_property: DEFAULT_OFFLOADS_PROPERTY.to_string(),
            reference_index: 0,
            buffer_channel: DEFAULT_BUFFER_CHANNEL.to_string(),
            default_rate_hz: DEFAULT_RATE_HZ,
            duty_ns: DEFAULT_DUTY_NS,
            compatible: DEFAULT_COMPATIBLE.to_string(),
            driver_name: DEFAULT_DRIVER_NAME.to_string(),
        }
    }
}

impl OffloadConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> OffloadConfigBuilder {
        OffloadConfigBuilder::default()
    }
}

/// Builder for ergonomic configuration construction.
#[derive(Debug, Clone, Default)]
pub struct OffloadConfigBuilder {
    config: OffloadConfig,
}

impl OffloadConfigBuilder {
    /// Sets the consumer property naming the offload reference.
    pub fn offloads_property(mut self, name: impl Into<String>) -> Self {
        self.config.offloads_property = name.into();
        self
    }

    pub fn reference_index(mut self, index: usize) -> Self {
        self.config.reference_index = index;
        self
    }

    /// Sets the DMA channel the receive buffer is allocated on.
    pub fn buffer_channel(mut self, channel: impl Into<String>) -> Self {
        self.config.buffer_channel = channel.into();
        self
    }

    /// Sets the sampling frequency applied while the provider probes.
    pub fn default_rate_hz(mut self, hz: u32) -> Self {
        self.config.default_rate_hz = hz;
        self
    }

    pub fn duty_ns(mut self, duty_ns: u32) -> Self {
        self.config.duty_ns = duty_ns;
        self
    }

    /// Sets the compatible string the provider driver matches on.
    pub fn compatible(mut self, compatible: impl Into<String>) -> Self {
        self.config.compatible = compatible.into();
        self
    }

    pub fn driver_name(mut self, name: impl Into<String>) -> Self {
        self.config.driver_name = name.into();
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> OffloadConfig {
        self.config
    }
}
