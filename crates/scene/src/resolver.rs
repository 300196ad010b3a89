use foundation::{Bounds, Coordinate, LocationId, MovieId};
use runtime::FetchSeq;

use crate::events::PendingTarget;

/// What the user picked from the search suggestions.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionTarget {
    Location { id: LocationId, coord: Coordinate },
    /// `bbox` is `None` when the server sent neither a box nor point refs.
    Movie { id: MovieId, bbox: Option<Bounds> },
}

impl SelectionTarget {
    pub fn pending(&self) -> PendingTarget {
        match self {
            SelectionTarget::Location { id, .. } => PendingTarget::Location(id.clone()),
            SelectionTarget::Movie { id, .. } => PendingTarget::Movie(id.clone()),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ViewportMove {
    PanTo(Coordinate),
    FitBounds(Bounds),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Target data is already on screen; highlight now.
    Immediate(PendingTarget),
    /// Move the viewport; the target is highlighted after the next load.
    Deferred { token: u64, movement: ViewportMove },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSelection {
    pub target: PendingTarget,
    pub token: u64,
    /// Only a location fetch issued after this sequence can satisfy the
    /// selection. `None` means any.
    pub armed_after: Option<FetchSeq>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResolverState {
    #[default]
    Immediate,
    Deferred(PendingSelection),
}

/// Turns a search selection into either an immediate highlight or a
/// viewport move plus a one-shot pending highlight.
///
/// At most one selection is pending; a new one replaces it under a fresh
/// token, so the superseded target can never be applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionResolver {
    state: ResolverState,
    next_token: u64,
}

impl SelectionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// `armed_after` is the latest location fetch issued before this call.
    pub fn select(
        &mut self,
        target: SelectionTarget,
        view_bounds: Bounds,
        view_center: Coordinate,
        armed_after: Option<FetchSeq>,
    ) -> Resolution {
        let movement = match &target {
            SelectionTarget::Location { coord, .. } if *coord == view_center => None,
            SelectionTarget::Location { coord, .. } => Some(ViewportMove::PanTo(*coord)),
            SelectionTarget::Movie { bbox: None, .. } => None,
            SelectionTarget::Movie { bbox: Some(b), .. } if view_bounds.contains_bounds(b) => None,
            SelectionTarget::Movie { bbox: Some(b), .. } => Some(ViewportMove::FitBounds(*b)),
        };

        let Some(movement) = movement else {
            self.state = ResolverState::Immediate;
            return Resolution::Immediate(target.pending());
        };

        self.next_token += 1;
        let token = self.next_token;
        self.state = ResolverState::Deferred(PendingSelection {
            target: target.pending(),
            token,
            armed_after,
        });
        Resolution::Deferred { token, movement }
    }

    /// Consumes the pending selection if the reset for `seq` satisfies it.
    pub fn on_reset(&mut self, seq: FetchSeq) -> Option<PendingSelection> {
        let ResolverState::Deferred(pending) = &self.state else {
            return None;
        };
        if pending.armed_after.is_some_and(|armed| seq <= armed) {
            return None;
        }
        match std::mem::take(&mut self.state) {
            ResolverState::Deferred(pending) => Some(pending),
            ResolverState::Immediate => None,
        }
    }

    /// Drops any pending selection; returns it if there was one.
    pub fn cancel(&mut self) -> Option<PendingSelection> {
        match std::mem::take(&mut self.state) {
            ResolverState::Deferred(pending) => Some(pending),
            ResolverState::Immediate => None,
        }
    }

    pub fn state(&self) -> &ResolverState {
        &self.state
    }

    pub fn pending(&self) -> Option<&PendingSelection> {
        match &self.state {
            ResolverState::Deferred(p) => Some(p),
            ResolverState::Immediate => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Resolution, ResolverState, SelectionResolver, SelectionTarget, ViewportMove};
    use crate::events::PendingTarget;
    use foundation::{Bounds, Coordinate, LocationId, MovieId};
    use runtime::FetchSeq;

    fn view() -> Bounds {
        Bounds::new(Coordinate::new(37.7, -122.5), Coordinate::new(37.8, -122.4))
    }

    #[test]
    fn location_at_center_resolves_immediately() {
        let mut r = SelectionResolver::new();
        let center = view().center();
        let res = r.select(
            SelectionTarget::Location { id: LocationId::new("a"), coord: center },
            view(),
            center,
            Some(FetchSeq(3)),
        );
        assert_eq!(res, Resolution::Immediate(PendingTarget::Location(LocationId::new("a"))));
        assert_eq!(r.state(), &ResolverState::Immediate);
    }

    #[test]
    fn location_elsewhere_pans_and_defers() {
        let mut r = SelectionResolver::new();
        let target = Coordinate::new(40.0, -74.0);
        let res = r.select(
            SelectionTarget::Location { id: LocationId::new("L"), coord: target },
            view(),
            view().center(),
            Some(FetchSeq(3)),
        );
        assert_eq!(res, Resolution::Deferred { token: 1, movement: ViewportMove::PanTo(target) });

        // A fetch issued before the selection cannot satisfy it.
        assert_eq!(r.on_reset(FetchSeq(3)), None);
        let applied = r.on_reset(FetchSeq(4)).expect("pending applied");
        assert_eq!(applied.target, PendingTarget::Location(LocationId::new("L")));
        assert_eq!(r.on_reset(FetchSeq(5)), None);
    }

    #[test]
    fn movie_inside_view_is_immediate_and_outside_fits() {
        let mut r = SelectionResolver::new();
        let inside = Bounds::new(Coordinate::new(37.72, -122.48), Coordinate::new(37.78, -122.42));
        let res = r.select(
            SelectionTarget::Movie { id: MovieId::new("m"), bbox: Some(inside) },
            view(),
            view().center(),
            None,
        );
        assert_eq!(res, Resolution::Immediate(PendingTarget::Movie(MovieId::new("m"))));

        // Overlapping but not contained.
        let partial = Bounds::new(Coordinate::new(37.75, -122.45), Coordinate::new(37.9, -122.3));
        let res = r.select(
            SelectionTarget::Movie { id: MovieId::new("m"), bbox: Some(partial) },
            view(),
            view().center(),
            None,
        );
        assert_eq!(
            res,
            Resolution::Deferred {
                token: 1,
                movement: ViewportMove::FitBounds(partial),
            }
        );
        assert!(r.on_reset(FetchSeq(0)).is_some());
    }

    #[test]
    fn newer_selection_supersedes_pending_one() {
        let mut r = SelectionResolver::new();
        let far = Coordinate::new(1.0, 1.0);
        r.select(
            SelectionTarget::Location {
                id: LocationId::new("old"),
                coord: far,
            },
            view(),
            view().center(),
            None,
        );
        let res = r.select(
            SelectionTarget::Movie { id: MovieId::new("m"), bbox: Some(Bounds::new(far, far)) },
            view(),
            view().center(),
            None,
        );
        assert!(matches!(res, Resolution::Deferred { token: 2, .. }));

        let applied = r.on_reset(FetchSeq(0)).unwrap();
        assert_eq!(applied.token, 2);
        assert_eq!(applied.target, PendingTarget::Movie(MovieId::new("m")));
    }

    #[test]
    fn cancel_drops_pending() {
        let mut r = SelectionResolver::new();
        r.select(
            SelectionTarget::Location {
                id: LocationId::new("x"),
                coord: Coordinate::new(0.0, 0.0),
            },
            view(),
            view().center(),
            None,
        );
        assert!(r.cancel().is_some());
        assert_eq!(r.on_reset(FetchSeq(9)), None);
        assert!(r.pending().is_none());
    }
}
