//! Counting DMA buffer allocator

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use hal::dma::{BufferId, DmaBuffer, DmaBufferAllocator, DmaBufferRef};
use hal::error::{HalError, HalResult};
use parking_lot::Mutex;

/// Simulated DMA receive buffer.
#[derive(Debug)]
pub struct SimBuffer {
    id: BufferId,
    device: String,
    channel: String,
    released: AtomicBool,
    release_calls: AtomicUsize,
}

impl SimBuffer {
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Number of times `release` was invoked, including redundant calls.
    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }
}

impl DmaBuffer for SimBuffer {
    fn id(&self) -> BufferId {
        self.id
    }

    fn channel(&self) -> &str {
        &self.channel
    }

    fn release(&self) -> bool {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        let first = !self.released.swap(true, Ordering::SeqCst);
        if first {
            log::debug!("sim dma: released {} ({}:{})", self.id, self.device, self.channel);
        }
        first
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct SimDmaAllocator {
    next: AtomicU32,
    fail: AtomicBool,
    buffers: Mutex<Vec<Arc<SimBuffer>>>,
}

impl SimDmaAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent allocations fail with [`HalError::OutOfMemory`].
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// All buffers ever allocated, in allocation order.
    pub fn buffers(&self) -> Vec<Arc<SimBuffer>> {
        self.buffers.lock().clone()
    }

    /// Buffers allocated and not yet released.
    pub fn live_count(&self) -> usize {
        self.buffers
            .lock()
            .iter()
            .filter(|buf| !buf.is_released())
            .count()
    }
}

impl DmaBufferAllocator for SimDmaAllocator {
    fn allocate(&self, device: &str, channel: &str) -> HalResult<DmaBufferRef> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(HalError::OutOfMemory);
        }

        let buffer = Arc::new(SimBuffer {
            id: BufferId(self.next.fetch_add(1, Ordering::SeqCst)),
            device: device.to_string(),
            channel: channel.to_string(),
            released: AtomicBool::new(false),
            release_calls: AtomicUsize::new(0),
        });
        self.buffers.lock().push(Arc::clone(&buffer));
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_happens_once() {
        let alloc = SimDmaAllocator::new();
        let buf = alloc.allocate("dev", "rx").unwrap();
        assert_eq!(alloc.live_count(), 1);
        assert!(buf.release());
        assert!(!buf.release());
        assert_eq!(alloc.live_count(), 0);
        assert_eq!(alloc.buffers()[0].release_calls(), 2);
    }

    #[test]
    fn ids_are_unique() {
        let alloc = SimDmaAllocator::new();
        let a = alloc.allocate("a", "rx").unwrap();
        let b = alloc.allocate("b", "rx").unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(b.channel(), "rx");
    }

    #[test]
    fn allocation_failure_is_reported() {
        let alloc = SimDmaAllocator::new();
        alloc.set_fail(true);
        assert_eq!(alloc.allocate("a", "rx").err(), Some(HalError::OutOfMemory));
        assert!(alloc.buffers().is_empty());
    }
}
