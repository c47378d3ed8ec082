//! Read-only views of engine state

use serde::{Deserialize, Serialize};

use super::{FrameId, PageNumber};

/// Point-in-time copy of one page's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// Page identifier.
    pub page_number: PageNumber,
    /// Occupied frame, or `None` while not resident.
    pub frame: Option<FrameId>,
    /// Logical timestamp of the most recent load or hit.
    pub last_access: u64,
    /// Page payload.
    pub data: Vec<i64>,
}

/// Point-in-time copy of one frame slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    /// Frame index.
    pub frame: FrameId,
    /// The resident page, or `None` for an empty slot.
    pub page: Option<PageSnapshot>,
}
