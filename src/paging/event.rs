//! Engine events

use super::{FrameId, PageNumber};

/// Discrete state changes emitted by the engine.
///
/// The engine itself never prints; subscribers render these however they
/// like. On a miss the order is `Fault`, then `Evicted` if a frame had to
/// be reclaimed, then `Loaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// The requested page was already resident.
    Hit {
        /// Requested page.
        page: PageNumber,
        /// Frame it occupies.
        frame: FrameId,
    },
    /// The requested page was not resident.
    Fault {
        /// Requested page.
        page: PageNumber,
    },
    /// A resident page lost its frame to make room.
    Evicted {
        /// Evicted page.
        page: PageNumber,
        /// Frame it gave up.
        frame: FrameId,
    },
    /// The requested page became resident.
    Loaded {
        /// Loaded page.
        page: PageNumber,
        /// Frame it was placed in.
        frame: FrameId,
    },
    /// A write went through, after residency was ensured.
    Written {
        /// Virtual address written.
        address: i64,
        /// Value replaced.
        old: i64,
        /// Value stored.
        new: i64,
    },
}

/// Observer for [`EngineEvent`]s.
pub trait EventSink {
    /// Called once per event, in emission order.
    fn on_event(&mut self, event: &EngineEvent);
}

impl<F: FnMut(&EngineEvent)> EventSink for F {
    fn on_event(&mut self, event: &EngineEvent) {
        self(event)
    }
}
