use std::collections::BTreeSet;

use foundation::{Coordinate, LocationId};

use crate::config::StreetViewConfig;
use crate::store::EntityStore;
use crate::surface::ListSurface;

/// Swaps tile placeholders for street-view thumbnails once tiles are visible.
///
/// Each tile is loaded at most once per store generation.
#[derive(Debug, Clone)]
pub struct StreetViewLoader {
    config: StreetViewConfig,
    loaded: BTreeSet<LocationId>,
}

impl StreetViewLoader {
    pub fn new(config: StreetViewConfig) -> Self {
        Self {
            config,
            loaded: BTreeSet::new(),
        }
    }

    pub fn url(&self, coord: Coordinate) -> String {
        let size = self.config.size_px;
        format!(
            "{}?size={size}x{size}&location={}&sensor=false",
            self.config.base_url,
            coord.to_url_value()
        )
    }

    /// Loads every visible tile that still shows the placeholder.
    ///
    /// Returns how many tiles were updated.
    pub fn refresh<L: ListSurface + ?Sized>(&mut self, store: &EntityStore, list: &mut L) -> usize {
        let mut updated = 0;
        for entity in store.iter() {
            if self.loaded.contains(entity.id()) || !list.is_in_view(entity.id()) {
                continue;
            }
            let url = self.url(entity.coord());
            list.set_street_view(entity.id(), &url);
            self.loaded.insert(entity.id().clone());
            updated += 1;
        }
        updated
    }

    /// Forgets loaded tiles; called after a store reset re-renders the list.
    pub fn reset(&mut self) {
        self.loaded.clear();
    }

    /// Forgets one tile removed from the list.
    pub fn forget(&mut self, id: &LocationId) {
        self.loaded.remove(id);
    }

    pub fn is_loaded(&self, id: &LocationId) -> bool {
        self.loaded.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::StreetViewLoader;
    use crate::config::StreetViewConfig;
    use crate::headless::{HeadlessMap, RecordingList};
    use crate::store::EntityStore;
    use crate::store::tests::record;
    use foundation::{Bounds, Coordinate, LocationId};

    #[test]
    fn url_matches_static_image_api() {
        let loader = StreetViewLoader::new(StreetViewConfig::default());
        assert_eq!(
            loader.url(Coordinate::new(37.8, -122.41)),
            "https://maps.googleapis.com/maps/api/streetview?size=100x100&location=37.8,-122.41&sensor=false"
        );
    }

    #[test]
    fn only_visible_tiles_load_once() {
        let mut map = HeadlessMap::new(Coordinate::new(37.75, -122.45), 12, 800, 600);
        let mut list = RecordingList::new(2);
        let mut store = EntityStore::new("ph.png");
        let view = Bounds::new(Coordinate::new(37.7, -122.5), Coordinate::new(37.8, -122.4));
        let t = store.begin_fetch(view, view.center());
        store.apply(
            t.seq,
            Ok(vec![
                record("a", "m", 0, 37.71, -122.41),
                record("b", "m", 1, 37.72, -122.42),
                record("c", "m", 2, 37.73, -122.43),
            ]),
            &mut map,
            &mut list,
        );

        let mut loader = StreetViewLoader::new(StreetViewConfig::default());
        assert_eq!(loader.refresh(&store, &mut list), 2);
        assert_eq!(list.street_view(&LocationId::new("c")), Some("ph.png"));
        assert_eq!(loader.refresh(&store, &mut list), 0);

        list.scroll_to(1);
        assert_eq!(loader.refresh(&store, &mut list), 1);
        assert!(loader.is_loaded(&LocationId::new("c")));
        assert!(
            list.street_view(&LocationId::new("c"))
                .unwrap()
                .contains("location=37.73,-122.43")
        );
    }
}
