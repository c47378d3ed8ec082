//! Replacement policies

use super::{FrameId, PageNumber};

/// A resident page offered to the replacement policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Page occupying the frame.
    pub page_number: PageNumber,
    /// Frame the page occupies.
    pub frame: FrameId,
    /// Logical timestamp of the page's most recent load or hit.
    pub last_access: u64,
}

/// Selects which resident page to evict when no frame is free.
pub trait EvictionPolicy {
    /// Pick a victim among the resident pages. Returns `None` only when
    /// `residents` is empty.
    fn select_victim(&self, residents: &[Candidate]) -> Option<Candidate>;
}

/// Least-recently-used replacement.
///
/// The victim is the resident page with the smallest `last_access`
/// timestamp; ties are broken by the smallest page number, so selection
/// is deterministic regardless of candidate order.
pub struct Lru;

impl EvictionPolicy for Lru {
    fn select_victim(&self, residents: &[Candidate]) -> Option<Candidate> {
        residents
            .iter()
            .copied()
            .min_by_key(|c| (c.last_access, c.page_number))
    }
}
