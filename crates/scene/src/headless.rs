//! In-memory render surfaces.
//!
//! Used by the command-line driver and by tests; they honour the same
//! contracts a browser map widget and tile list would.

use foundation::math::{MAX_ZOOM, fit_zoom, project, unproject, viewport_bounds};
use foundation::{Arena, Bounds, Coordinate, LocationId, MarkerHandle};

use crate::surface::{ListSurface, TileView};
use crate::viewport::{MapWidget, MarkerLayer, PinStyle};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerView {
    pub position: Coordinate,
    pub style: PinStyle,
}

/// Web-mercator map with a fixed pixel size and an arena of pins.
#[derive(Debug, Clone)]
pub struct HeadlessMap {
    center: Coordinate,
    zoom: u8,
    width_px: u32,
    height_px: u32,
    markers: Arena<MarkerView>,
}

impl HeadlessMap {
    pub fn new(center: Coordinate, zoom: u8, width_px: u32, height_px: u32) -> Self {
        Self {
            center,
            zoom: zoom.min(MAX_ZOOM),
            width_px,
            height_px,
            markers: Arena::new(),
        }
    }

    pub fn size_px(&self) -> (u32, u32) {
        (self.width_px, self.height_px)
    }

    pub fn marker(&self, handle: MarkerHandle) -> Option<&MarkerView> {
        self.markers.get(handle.0)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn markers(&self) -> impl Iterator<Item = (MarkerHandle, &MarkerView)> + '_ {
        self.markers.iter().map(|(h, m)| (MarkerHandle(h), m))
    }

    /// Simulates a user drag: moves the center without notifying anyone.
    pub fn drag_to(&mut self, center: Coordinate) {
        self.center = center;
    }
}

impl MarkerLayer for HeadlessMap {
    fn create_marker(&mut self, position: Coordinate, style: PinStyle) -> MarkerHandle {
        MarkerHandle(self.markers.alloc(MarkerView { position, style }))
    }

    fn remove_marker(&mut self, marker: MarkerHandle) -> bool {
        self.markers.remove(marker.0).is_some()
    }

    fn set_marker_style(&mut self, marker: MarkerHandle, style: PinStyle) -> bool {
        match self.markers.get_mut(marker.0) {
            Some(m) => {
                m.style = style;
                true
            }
            None => false,
        }
    }
}

impl MapWidget for HeadlessMap {
    fn bounds(&self) -> Bounds {
        viewport_bounds(self.center, self.zoom, self.width_px, self.height_px)
    }

    fn center(&self) -> Coordinate {
        self.center
    }

    fn zoom(&self) -> u8 {
        self.zoom
    }

    fn set_center(&mut self, center: Coordinate, zoom: u8) {
        self.center = center;
        self.zoom = zoom.min(MAX_ZOOM);
    }

    fn fit_bounds(&mut self, bounds: Bounds) {
        let zoom = fit_zoom(&bounds, self.width_px, self.height_px, MAX_ZOOM);
        // Center on the projected midpoint so the box sits symmetrically.
        let [x0, y0] = project(bounds.sw, zoom);
        let [x1, y1] = project(bounds.ne, zoom);
        self.center = unproject([(x0 + x1) / 2.0, (y0 + y1) / 2.0], zoom);
        self.zoom = zoom;
    }

    fn resize(&mut self, width_px: u32, height_px: u32) {
        self.width_px = width_px;
        self.height_px = height_px;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileState {
    pub view: TileView,
    pub highlighted: bool,
}

/// Tile list with a scrollable window of `visible_rows` rows.
#[derive(Debug, Clone, Default)]
pub struct RecordingList {
    tiles: Vec<TileState>,
    first_visible: usize,
    visible_rows: usize,
    renders: usize,
    appends: usize,
}

impl RecordingList {
    pub fn new(visible_rows: usize) -> Self {
        Self {
            visible_rows,
            ..Self::default()
        }
    }

    pub fn ids(&self) -> Vec<LocationId> {
        self.tiles.iter().map(|t| t.view.location.clone()).collect()
    }

    pub fn tile(&self, id: &LocationId) -> Option<&TileState> {
        self.tiles.iter().find(|t| &t.view.location == id)
    }

    pub fn tiles(&self) -> &[TileState] {
        &self.tiles
    }

    pub fn is_highlighted(&self, id: &LocationId) -> bool {
        self.tile(id).is_some_and(|t| t.highlighted)
    }

    pub fn street_view(&self, id: &LocationId) -> Option<&str> {
        self.tile(id).map(|t| t.view.street_view.as_str())
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn scroll_to(&mut self, first_row: usize) {
        self.first_visible = first_row;
    }

    pub fn set_visible_rows(&mut self, rows: usize) {
        self.visible_rows = rows;
    }

    pub fn render_count(&self) -> usize {
        self.renders
    }

    pub fn append_count(&self) -> usize {
        self.appends
    }

    fn tile_mut(&mut self, id: &LocationId) -> Option<&mut TileState> {
        self.tiles.iter_mut().find(|t| &t.view.location == id)
    }
}

impl ListSurface for RecordingList {
    fn render(&mut self, tiles: &[TileView]) {
        self.renders += 1;
        self.first_visible = 0;
        self.tiles = tiles
            .iter()
            .map(|view| TileState {
                view: view.clone(),
                highlighted: false,
            })
            .collect();
    }

    fn append(&mut self, tile: &TileView) {
        self.appends += 1;
        self.tiles.push(TileState {
            view: tile.clone(),
            highlighted: false,
        });
    }

    fn remove(&mut self, location: &LocationId) {
        self.tiles.retain(|t| &t.view.location != location);
    }

    fn clear(&mut self) {
        self.tiles.clear();
    }

    fn set_highlighted(&mut self, location: &LocationId, highlighted: bool) {
        if let Some(t) = self.tile_mut(location) {
            t.highlighted = highlighted;
        }
    }

    fn set_street_view(&mut self, location: &LocationId, url: &str) {
        if let Some(t) = self.tile_mut(location) {
            t.view.street_view = url.to_string();
        }
    }

    fn is_in_view(&self, location: &LocationId) -> bool {
        self.tiles
            .iter()
            .position(|t| &t.view.location == location)
            .is_some_and(|row| {
                row >= self.first_visible && row < self.first_visible + self.visible_rows
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{HeadlessMap, RecordingList};
    use crate::surface::{ListSurface, TileView};
    use crate::viewport::{MapWidget, MarkerLayer, PinStyle};
    use foundation::{Bounds, Coordinate, LocationId, MovieId};

    #[test]
    fn stale_marker_handles_do_not_alias() {
        let mut map = HeadlessMap::new(Coordinate::new(0.0, 0.0), 3, 256, 256);
        let a = map.create_marker(Coordinate::new(1.0, 1.0), PinStyle::normal(1));
        assert!(map.remove_marker(a));
        let b = map.create_marker(Coordinate::new(2.0, 2.0), PinStyle::normal(2));
        assert_eq!(a.index(), b.index());
        assert!(!map.remove_marker(a));
        assert!(!map.set_marker_style(a, PinStyle::highlighted(1)));
        assert_eq!(map.marker(b).unwrap().style.label, 2);
    }

    #[test]
    fn fit_bounds_contains_target() {
        let mut map = HeadlessMap::new(Coordinate::new(0.0, 0.0), 2, 1024, 768);
        let target = Bounds::new(Coordinate::new(40.70, -74.02), Coordinate::new(40.80, -73.93));
        map.fit_bounds(target);
        assert!(map.bounds().contains_bounds(&target));
        assert!(map.zoom() > 10);
    }

    #[test]
    fn visible_window_follows_scroll() {
        let tile = |id: &str| TileView {
            location: LocationId::new(id),
            label: 1,
            movie_id: MovieId::new("m"),
            movie_title: None,
            movie_release_date: None,
            movie_poster: None,
            short_name: None,
            formatted_name: None,
            street_view: "ph".to_string(),
        };
        let mut list = RecordingList::new(1);
        list.render(&[tile("a"), tile("b")]);
        assert!(list.is_in_view(&LocationId::new("a")));
        assert!(!list.is_in_view(&LocationId::new("b")));
        list.scroll_to(1);
        assert!(list.is_in_view(&LocationId::new("b")));
        assert!(!list.is_in_view(&LocationId::new("zzz")));
    }
}
