//! DMA streaming buffer abstraction

use alloc::sync::Arc;
use core::fmt;

use crate::error::HalResult;

/// Identity of an allocated buffer, unique per allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferId(pub u32);

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buf{}", self.0)
    }
}

/// DMA-capable receive buffer.
pub trait DmaBuffer: Send + Sync {
    fn id(&self) -> BufferId;

    /// DMA channel name the buffer was allocated on (e.g. `"rx"`).
    fn channel(&self) -> &str;

    /// Return the buffer to the allocator.
    ///
    /// Only the first call releases anything; it returns `true`. Later calls
    /// return `false`.
    fn release(&self) -> bool;

    fn is_released(&self) -> bool;
}

pub type DmaBufferRef = Arc<dyn DmaBuffer>;

/// Allocator for DMA streaming buffers.
pub trait DmaBufferAllocator: Send + Sync {
    fn allocate(&self, device: &str, channel: &str) -> HalResult<DmaBufferRef>;
}
