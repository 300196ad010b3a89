use std::collections::BTreeSet;

use foundation::{LocationId, MovieId};
use runtime::Topic;

use crate::events::HighlightChanged;
use crate::store::EntityStore;
use crate::surface::ListSurface;
use crate::viewport::{MarkerLayer, PinStyle};
use crate::xref::CrossReferenceIndex;

/// Everything a highlight mutation has to write through to.
pub struct Projection<'a, M: ?Sized, L: ?Sized> {
    pub store: &'a EntityStore,
    pub markers: &'a mut M,
    pub list: &'a mut L,
    pub events: &'a mut Topic<HighlightChanged>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HighlightOutcome {
    Changed,
    Unchanged,
    /// The id is not a live entity.
    Unknown,
}

impl HighlightOutcome {
    pub fn changed(self) -> bool {
        self == HighlightOutcome::Changed
    }
}

/// The session's single highlight set.
///
/// Pin color and tile class are projections of this set; every mutation
/// writes both before returning, so they never disagree with `is_highlighted`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightEngine {
    set: BTreeSet<LocationId>,
}

impl HighlightEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn highlight<M, L>(
        &mut self,
        id: &LocationId,
        proj: &mut Projection<'_, M, L>,
    ) -> HighlightOutcome
    where
        M: MarkerLayer + ?Sized,
        L: ListSurface + ?Sized,
    {
        self.set_state(id, true, proj)
    }

    pub fn unhighlight<M, L>(
        &mut self,
        id: &LocationId,
        proj: &mut Projection<'_, M, L>,
    ) -> HighlightOutcome
    where
        M: MarkerLayer + ?Sized,
        L: ListSurface + ?Sized,
    {
        self.set_state(id, false, proj)
    }

    pub fn toggle<M, L>(
        &mut self,
        id: &LocationId,
        proj: &mut Projection<'_, M, L>,
    ) -> HighlightOutcome
    where
        M: MarkerLayer + ?Sized,
        L: ListSurface + ?Sized,
    {
        let on = !self.set.contains(id);
        self.set_state(id, on, proj)
    }

    /// Adds every live location of `movie`; existing highlights are kept.
    ///
    /// Returns the number of locations that changed.
    pub fn highlight_movie<M, L>(
        &mut self,
        movie: &MovieId,
        xref: &CrossReferenceIndex,
        proj: &mut Projection<'_, M, L>,
    ) -> usize
    where
        M: MarkerLayer + ?Sized,
        L: ListSurface + ?Sized,
    {
        xref.lookup(movie)
            .iter()
            .filter(|id| self.set_state(id, true, proj).changed())
            .count()
    }

    /// Unhighlights everything; returns how many locations changed.
    pub fn clear_all<M, L>(&mut self, proj: &mut Projection<'_, M, L>) -> usize
    where
        M: MarkerLayer + ?Sized,
        L: ListSurface + ?Sized,
    {
        let ids: Vec<LocationId> = self.set.iter().cloned().collect();
        ids.iter()
            .filter(|id| self.set_state(id, false, proj).changed())
            .count()
    }

    /// Drops one id whose pin and tile are already destroyed.
    ///
    /// Returns whether it was highlighted.
    pub fn forget(&mut self, id: &LocationId) -> bool {
        self.set.remove(id)
    }

    /// Empties the set without touching either surface.
    ///
    /// Only valid right after a store reset, when every pin and tile the set
    /// referred to is already gone.
    pub fn forget_all(&mut self) {
        self.set.clear();
    }

    pub fn is_highlighted(&self, id: &LocationId) -> bool {
        self.set.contains(id)
    }

    /// Sorted snapshot.
    pub fn highlighted(&self) -> Vec<LocationId> {
        self.set.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    fn set_state<M, L>(
        &mut self,
        id: &LocationId,
        on: bool,
        proj: &mut Projection<'_, M, L>,
    ) -> HighlightOutcome
    where
        M: MarkerLayer + ?Sized,
        L: ListSurface + ?Sized,
    {
        let Some(entity) = proj.store.get(id) else {
            // A dead id can only leave the set; there is no pin or tile to restyle.
            if !on && self.set.remove(id) {
                tracing::debug!(location = %id, "dropped highlight of removed location");
                proj.events.publish(HighlightChanged {
                    location: id.clone(),
                    highlighted: false,
                });
                return HighlightOutcome::Changed;
            }
            tracing::debug!(location = %id, "highlight of unknown location ignored");
            return HighlightOutcome::Unknown;
        };
        let changed = if on {
            self.set.insert(id.clone())
        } else {
            self.set.remove(id)
        };
        if !changed {
            return HighlightOutcome::Unchanged;
        }

        let style = if on {
            PinStyle::highlighted(entity.label())
        } else {
            PinStyle::normal(entity.label())
        };
        proj.markers.set_marker_style(entity.marker(), style);
        proj.list.set_highlighted(id, on);
        proj.events.publish(HighlightChanged {
            location: id.clone(),
            highlighted: on,
        });
        HighlightOutcome::Changed
    }
}

#[cfg(test)]
mod tests {
    use super::{HighlightEngine, HighlightOutcome, Projection};
    use crate::events::HighlightChanged;
    use crate::headless::{HeadlessMap, RecordingList};
    use crate::store::EntityStore;
    use crate::store::tests::record;
    use crate::viewport::PinColor;
    use crate::xref::CrossReferenceIndex;
    use foundation::{Bounds, Coordinate, LocationId, MovieId};
    use runtime::Topic;

    struct Fixture {
        map: HeadlessMap,
        list: RecordingList,
        store: EntityStore,
        xref: CrossReferenceIndex,
        events: Topic<HighlightChanged>,
    }

    impl Fixture {
        fn new() -> Self {
            let mut map = HeadlessMap::new(Coordinate::new(37.75, -122.45), 12, 800, 600);
            let mut list = RecordingList::new(10);
            let mut store = EntityStore::new("ph.png");
            let view = Bounds::new(Coordinate::new(37.7, -122.5), Coordinate::new(37.8, -122.4));
            let t = store.begin_fetch(view, view.center());
            store.apply(
                t.seq,
                Ok(vec![
                    record("a", "m1", 0, 37.71, -122.41),
                    record("b", "m2", 1, 37.72, -122.42),
                    record("c", "m1", 2, 37.73, -122.43),
                ]),
                &mut map,
                &mut list,
            );
            let mut xref = CrossReferenceIndex::new();
            xref.rebuild(&store);
            Self {
                map,
                list,
                store,
                xref,
                events: Topic::new("highlight_changed"),
            }
        }

        fn proj(&mut self) -> Projection<'_, HeadlessMap, RecordingList> {
            Projection {
                store: &self.store,
                markers: &mut self.map,
                list: &mut self.list,
                events: &mut self.events,
            }
        }

        fn assert_consistent(&self, engine: &HighlightEngine) {
            for entity in self.store.iter() {
                let on = engine.is_highlighted(entity.id());
                let pin = self.map.marker(entity.marker()).unwrap().style;
                assert_eq!(pin.is_highlighted(), on, "pin of {}", entity.id());
                assert_eq!(pin.label, entity.label());
                assert_eq!(self.list.is_highlighted(entity.id()), on, "tile of {}", entity.id());
            }
        }
    }

    #[test]
    fn highlight_is_idempotent_and_consistent() {
        let mut fx = Fixture::new();
        let sub = fx.events.subscribe();
        let mut engine = HighlightEngine::new();
        let a = LocationId::new("a");

        assert_eq!(engine.highlight(&a, &mut fx.proj()), HighlightOutcome::Changed);
        assert_eq!(engine.highlight(&a, &mut fx.proj()), HighlightOutcome::Unchanged);
        assert_eq!(engine.highlighted(), vec![a.clone()]);
        fx.assert_consistent(&engine);
        assert_eq!(fx.events.poll(&sub).len(), 1);

        let marker = fx.store.get(&a).unwrap().marker();
        assert_eq!(fx.map.marker(marker).unwrap().style.color, PinColor::Highlighted);

        assert_eq!(engine.unhighlight(&a, &mut fx.proj()), HighlightOutcome::Changed);
        assert_eq!(engine.unhighlight(&a, &mut fx.proj()), HighlightOutcome::Unchanged);
        fx.assert_consistent(&engine);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut fx = Fixture::new();
        let mut engine = HighlightEngine::new();
        let ghost = LocationId::new("ghost");
        assert_eq!(engine.highlight(&ghost, &mut fx.proj()), HighlightOutcome::Unknown);
        assert_eq!(engine.toggle(&ghost, &mut fx.proj()), HighlightOutcome::Unknown);
        assert!(engine.is_empty());
    }

    #[test]
    fn toggle_flips_state() {
        let mut fx = Fixture::new();
        let mut engine = HighlightEngine::new();
        let b = LocationId::new("b");
        engine.toggle(&b, &mut fx.proj());
        assert!(engine.is_highlighted(&b));
        engine.toggle(&b, &mut fx.proj());
        assert!(!engine.is_highlighted(&b));
        fx.assert_consistent(&engine);
    }

    #[test]
    fn highlight_movie_is_additive_and_clear_all_resets() {
        let mut fx = Fixture::new();
        let mut engine = HighlightEngine::new();
        engine.highlight(&LocationId::new("b"), &mut fx.proj());

        let xref = fx.xref.clone();
        let changed = engine.highlight_movie(&MovieId::new("m1"), &xref, &mut fx.proj());
        assert_eq!(changed, 2);
        assert_eq!(
            engine.highlighted(),
            vec![LocationId::new("a"), LocationId::new("b"), LocationId::new("c")]
        );
        fx.assert_consistent(&engine);

        assert_eq!(engine.highlight_movie(&MovieId::new("nope"), &xref, &mut fx.proj()), 0);

        assert_eq!(engine.clear_all(&mut fx.proj()), 3);
        assert!(engine.is_empty());
        fx.assert_consistent(&engine);
    }

    #[test]
    fn clear_all_drops_ids_of_removed_locations() {
        let mut fx = Fixture::new();
        let sub = fx.events.subscribe();
        let mut engine = HighlightEngine::new();
        let xref = fx.xref.clone();
        engine.highlight_movie(&MovieId::new("m1"), &xref, &mut fx.proj());

        let a = LocationId::new("a");
        assert!(fx.store.remove(&a, &mut fx.map, &mut fx.list));
        assert!(engine.is_highlighted(&a));

        assert_eq!(engine.clear_all(&mut fx.proj()), 2);
        assert!(engine.is_empty());
        fx.assert_consistent(&engine);
        assert_eq!(fx.events.poll(&sub).iter().filter(|e| !e.highlighted).count(), 2);
        assert_eq!(engine.highlight(&a, &mut fx.proj()), HighlightOutcome::Unknown);
    }
}
