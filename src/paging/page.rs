//! Page structure

use super::{FrameId, PageNumber};
use super::snapshot::PageSnapshot;

/// A fixed-size unit of the virtual address space.
///
/// A page is created at most once, on first reference, and lives for the
/// rest of the simulation; only its residency changes afterwards. The
/// payload is seeded deterministically from the page number, so cell `i`
/// of page `p` starts out as `p * page_size + i` regardless of the order
/// in which pages are touched.
pub struct Page {
    page_number: PageNumber,
    data: Vec<i64>,
    frame: Option<FrameId>,
    last_access: u64,
}

impl Page {
    /// Create a page with its deterministic initial payload.
    pub(crate) fn new(page_number: PageNumber, page_size: usize) -> Self {
        let base = page_number as i64 * page_size as i64;
        Self {
            page_number,
            data: (0..page_size as i64).map(|i| base + i).collect(),
            frame: None,
            last_access: 0,
        }
    }

    /// Page identifier
    pub fn page_number(&self) -> PageNumber {
        self.page_number
    }

    /// Occupied frame index, or `None` while not resident
    pub fn frame(&self) -> Option<FrameId> {
        self.frame
    }

    /// Logical timestamp of the most recent load or hit
    pub fn last_access(&self) -> u64 {
        self.last_access
    }

    /// Page payload
    pub fn data(&self) -> &[i64] {
        &self.data
    }

    pub(crate) fn read(&self, offset: usize) -> i64 {
        self.data[offset]
    }

    /// Overwrite one cell, returning the previous value.
    pub(crate) fn write(&mut self, offset: usize, value: i64) -> i64 {
        std::mem::replace(&mut self.data[offset], value)
    }

    pub(crate) fn load(&mut self, frame: FrameId, now: u64) {
        self.frame = Some(frame);
        self.last_access = now;
    }

    pub(crate) fn unload(&mut self) {
        self.frame = None;
    }

    pub(crate) fn touch(&mut self, now: u64) {
        self.last_access = now;
    }

    pub(crate) fn snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            page_number: self.page_number,
            frame: self.frame,
            last_access: self.last_access,
            data: self.data.clone(),
        }
    }
}
