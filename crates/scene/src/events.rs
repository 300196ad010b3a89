//! Typed events published by the session's components.

use foundation::{LocationId, Millis, MovieId};
use runtime::{FetchSeq, Topic};
use streaming::Endpoint;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViewportChangeCause {
    /// Pan/zoom performed on the widget by the user.
    User,
    /// `set_center` / `fit_bounds` issued by the engine.
    Programmatic,
    Resize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ViewportChanged {
    pub at: Millis,
    pub cause: ViewportChangeCause,
}

/// The entity store swapped in a new location set.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResetCompleted {
    pub seq: FetchSeq,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingTarget {
    Location(LocationId),
    Movie(MovieId),
}

/// A selection is waiting for the next location load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPending {
    pub token: u64,
    pub target: PendingTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightChanged {
    pub location: LocationId,
    pub highlighted: bool,
}

/// Transient failure indicator for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailed {
    pub endpoint: Endpoint,
    pub message: String,
}

/// One topic per event kind. Viewport changes live on the viewport adapter.
#[derive(Debug)]
pub struct SessionEvents {
    pub reset_completed: Topic<ResetCompleted>,
    pub selection_pending: Topic<SelectionPending>,
    pub highlight_changed: Topic<HighlightChanged>,
    pub fetch_failed: Topic<FetchFailed>,
}

impl SessionEvents {
    pub fn new() -> Self {
        Self {
            reset_completed: Topic::new("reset_completed"),
            selection_pending: Topic::new("selection_pending"),
            highlight_changed: Topic::new("highlight_changed"),
            fetch_failed: Topic::new("fetch_failed"),
        }
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
