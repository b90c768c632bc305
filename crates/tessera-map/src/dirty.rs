use std::collections::HashSet;
use std::sync::Mutex;

use super::coord::ChunkCoord;

/// Set of chunks touched since the last drain.
///
/// Marks go through `&self` so edit paths can share the tracker with the
/// draining consumer; `drain` swaps the whole accumulator out under the lock,
/// so a mark racing a drain lands in the fresh set instead of being lost.
#[derive(Default, Debug)]
pub struct DirtyTracker {
    inner: Mutex<HashSet<ChunkCoord>>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self, chunk: ChunkCoord) {
        self.inner.lock().unwrap().insert(chunk);
    }

    /// Returns and clears every pending chunk.
    pub fn drain(&self) -> HashSet<ChunkCoord> {
        std::mem::take(&mut *self.inner.lock().unwrap())
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}
