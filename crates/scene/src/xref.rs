use std::collections::BTreeMap;

use foundation::{LocationId, MovieId};

use crate::store::EntityStore;

/// Movie to location index over the live entity set.
///
/// Rebuilt wholesale after every store reset; there is no incremental path.
///
/// Ordering contract:
/// - `lookup` yields locations in store display order.
/// - `movies` yields movie ids in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossReferenceIndex {
    by_movie: BTreeMap<MovieId, Vec<LocationId>>,
    by_location: BTreeMap<LocationId, MovieId>,
}

impl CrossReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rebuild(&mut self, store: &EntityStore) {
        self.by_movie.clear();
        self.by_location.clear();
        for entity in store.iter() {
            self.by_movie
                .entry(entity.movie_id().clone())
                .or_default()
                .push(entity.id().clone());
            self.by_location
                .insert(entity.id().clone(), entity.movie_id().clone());
        }
    }

    pub fn lookup(&self, movie: &MovieId) -> &[LocationId] {
        self.by_movie.get(movie).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn movie_for(&self, location: &LocationId) -> Option<&MovieId> {
        self.by_location.get(location)
    }

    pub fn movies(&self) -> impl Iterator<Item = &MovieId> + '_ {
        self.by_movie.keys()
    }

    /// Number of distinct movies.
    pub fn len(&self) -> usize {
        self.by_movie.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_movie.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_movie.clear();
        self.by_location.clear();
    }
}
