use std::collections::{HashMap, HashSet};

use foundation::{Arena, Bounds, Coordinate, Handle, LocationId, MarkerHandle, MovieId};
use runtime::{FetchSeq, SequenceGuard, Verdict};
use streaming::{FetchError, LocationQuery, LocationRecord};

use crate::surface::{ListSurface, TileView};
use crate::viewport::{MarkerLayer, PinStyle};

/// A location currently shown on both surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationEntity {
    record: LocationRecord,
    marker: MarkerHandle,
}

impl LocationEntity {
    pub fn id(&self) -> &LocationId {
        &self.record.id
    }

    pub fn coord(&self) -> Coordinate {
        self.record.coord()
    }

    pub fn movie_id(&self) -> &MovieId {
        &self.record.movie_id
    }

    pub fn marker(&self) -> MarkerHandle {
        self.marker
    }

    /// Pin and tile label: the server's 0-based rank, shown 1-based.
    pub fn label(&self) -> u32 {
        self.record.idx.saturating_add(1)
    }

    pub fn record(&self) -> &LocationRecord {
        &self.record
    }
}

/// A location fetch tagged with the sequence it must complete under.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationTicket {
    pub seq: FetchSeq,
    pub query: LocationQuery,
}

#[derive(Debug)]
pub enum StoreOutcome {
    /// Previous contents destroyed, `count` new entities live.
    Reset { seq: FetchSeq, count: usize },
    /// Superseded by a newer fetch; nothing changed.
    Stale { seq: FetchSeq },
    /// Fetch failed; previous contents retained.
    Failed { seq: FetchSeq, error: FetchError },
}

/// Live location entities, indexed by id and by marker, in display order.
///
/// Ordering contract:
/// - `iter()` yields entities in the order the server returned them (or the
///   order they were appended), never arena slot order.
#[derive(Debug)]
pub struct EntityStore {
    entities: Arena<LocationEntity>,
    by_id: HashMap<LocationId, Handle>,
    by_marker: HashMap<MarkerHandle, LocationId>,
    order: Vec<LocationId>,
    seq: SequenceGuard,
    placeholder: String,
}

impl EntityStore {
    /// `placeholder` is the street-view image new tiles start with.
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            entities: Arena::new(),
            by_id: HashMap::new(),
            by_marker: HashMap::new(),
            order: Vec::new(),
            seq: SequenceGuard::new(),
            placeholder: placeholder.into(),
        }
    }

    pub fn begin_fetch(&mut self, bounds: Bounds, center: Coordinate) -> LocationTicket {
        LocationTicket {
            seq: self.seq.issue(),
            query: LocationQuery::new(bounds, center),
        }
    }

    pub fn latest_seq(&self) -> Option<FetchSeq> {
        self.seq.latest()
    }

    pub fn fetch_in_flight(&self) -> bool {
        self.seq.in_flight()
    }

    /// Applies a location fetch result.
    ///
    /// A current success replaces everything: all markers and tiles are
    /// destroyed before any new one is created, and the list is rendered once
    /// with the complete new set.
    pub fn apply<M, L>(
        &mut self,
        seq: FetchSeq,
        result: Result<Vec<LocationRecord>, FetchError>,
        markers: &mut M,
        list: &mut L,
    ) -> StoreOutcome
    where
        M: MarkerLayer + ?Sized,
        L: ListSurface + ?Sized,
    {
        if self.seq.complete(seq) == Verdict::Stale {
            return StoreOutcome::Stale { seq };
        }
        let records = match result {
            Ok(records) => records,
            Err(error) => return StoreOutcome::Failed { seq, error },
        };

        self.destroy_all(markers, list);

        let mut seen = HashSet::with_capacity(records.len());
        for record in records {
            if !seen.insert(record.id.clone()) {
                tracing::debug!(location = %record.id, "duplicate location in response dropped");
                continue;
            }
            self.insert(record, markers);
        }

        let tiles: Vec<TileView> = self
            .iter()
            .map(|e| TileView::from_entity(e, &self.placeholder))
            .collect();
        list.render(&tiles);

        StoreOutcome::Reset {
            seq,
            count: self.order.len(),
        }
    }

    /// Adds one entity without re-rendering the list.
    ///
    /// Returns `false` (and changes nothing) if the id is already live.
    pub fn append<M, L>(&mut self, record: LocationRecord, markers: &mut M, list: &mut L) -> bool
    where
        M: MarkerLayer + ?Sized,
        L: ListSurface + ?Sized,
    {
        if self.by_id.contains_key(&record.id) {
            return false;
        }
        let handle = self.insert(record, markers);
        if let Some(entity) = self.entities.get(handle) {
            list.append(&TileView::from_entity(entity, &self.placeholder));
        }
        true
    }

    /// Removes one entity together with its marker and tile.
    pub fn remove<M, L>(&mut self, id: &LocationId, markers: &mut M, list: &mut L) -> bool
    where
        M: MarkerLayer + ?Sized,
        L: ListSurface + ?Sized,
    {
        let Some(handle) = self.by_id.remove(id) else {
            return false;
        };
        if let Some(entity) = self.entities.remove(handle) {
            self.by_marker.remove(&entity.marker);
            markers.remove_marker(entity.marker);
        }
        self.order.retain(|o| o != id);
        list.remove(id);
        true
    }

    pub fn get(&self, id: &LocationId) -> Option<&LocationEntity> {
        self.by_id.get(id).and_then(|h| self.entities.get(*h))
    }

    pub fn contains(&self, id: &LocationId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn location_for_marker(&self, marker: MarkerHandle) -> Option<&LocationId> {
        self.by_marker.get(&marker)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocationEntity> + '_ {
        self.order.iter().filter_map(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Destroys every entity and turns outstanding fetches stale.
    pub fn teardown<M, L>(&mut self, markers: &mut M, list: &mut L)
    where
        M: MarkerLayer + ?Sized,
        L: ListSurface + ?Sized,
    {
        self.seq.invalidate();
        self.destroy_all(markers, list);
    }

    fn insert<M>(&mut self, record: LocationRecord, markers: &mut M) -> Handle
    where
        M: MarkerLayer + ?Sized,
    {
        let style = PinStyle::normal(record.idx.saturating_add(1));
        let marker = markers.create_marker(record.coord(), style);
        let id = record.id.clone();
        let handle = self.entities.alloc(LocationEntity { record, marker });
        self.by_id.insert(id.clone(), handle);
        self.by_marker.insert(marker, id.clone());
        self.order.push(id);
        handle
    }

    fn destroy_all<M, L>(&mut self, markers: &mut M, list: &mut L)
    where
        M: MarkerLayer + ?Sized,
        L: ListSurface + ?Sized,
    {
        for (_, entity) in self.entities.drain() {
            markers.remove_marker(entity.marker);
        }
        self.by_id.clear();
        self.by_marker.clear();
        self.order.clear();
        list.clear();
    }
}
