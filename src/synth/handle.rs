use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

/// Opaque identifier for one voice. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceHandle(u64);

impl VoiceHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VoiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A contiguous block of handles reserved in one go (one per sequence note).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandleRange {
    first: u64,
    len: usize,
}

impl HandleRange {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Handle for the `index`-th note of the block.
    pub fn get(&self, index: usize) -> Option<VoiceHandle> {
        (index < self.len).then(|| VoiceHandle(self.first + index as u64))
    }

    pub fn contains(&self, handle: VoiceHandle) -> bool {
        handle.0 >= self.first && handle.0 < self.first + self.len as u64
    }

    pub fn iter(&self) -> impl Iterator<Item = VoiceHandle> {
        let first = self.first;
        (0..self.len as u64).map(move |i| VoiceHandle(first + i))
    }
}

impl From<VoiceHandle> for HandleRange {
    fn from(handle: VoiceHandle) -> Self {
        Self {
            first: handle.0,
            len: 1,
        }
    }
}

/// Shared, lock-free handle counter.
///
/// The pipeline and the controller hold clones of the same source, so a
/// handle can be issued on the control thread before the start request
/// reaches the render thread.
#[derive(Debug, Clone)]
pub struct HandleSource {
    next: Arc<AtomicU64>,
}

impl HandleSource {
    pub fn new() -> Self {
        Self {
            next: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn next(&self) -> VoiceHandle {
        VoiceHandle(self.next.fetch_add(1, Ordering::Relaxed))
    }

    pub fn reserve(&self, len: usize) -> HandleRange {
        let first = self.next.fetch_add(len as u64, Ordering::Relaxed);
        HandleRange { first, len }
    }
}

impl Default for HandleSource {
    fn default() -> Self {
        Self::new()
    }
}
