use foundation::{LocationId, MovieId};

use crate::store::LocationEntity;

/// View-model for one tile in the list surface.
#[derive(Debug, Clone, PartialEq)]
pub struct TileView {
    pub location: LocationId,
    /// Same label as the location's pin.
    pub label: u32,
    pub movie_id: MovieId,
    pub movie_title: Option<String>,
    pub movie_release_date: Option<String>,
    pub movie_poster: Option<String>,
    pub short_name: Option<String>,
    pub formatted_name: Option<String>,
    pub street_view: String,
}

impl TileView {
    pub fn from_entity(entity: &LocationEntity, street_view_placeholder: &str) -> Self {
        let rec = entity.record();
        Self {
            location: rec.id.clone(),
            label: entity.label(),
            movie_id: rec.movie_id.clone(),
            movie_title: rec.movie_title.clone(),
            movie_release_date: rec.movie_release_date.clone(),
            movie_poster: rec.movie_poster.clone(),
            short_name: rec.short_name.clone(),
            formatted_name: rec.formatted_name.clone(),
            street_view: street_view_placeholder.to_string(),
        }
    }
}

/// The scrollable tile list.
///
/// Tiles are keyed by location id; operations on unknown ids are ignored.
pub trait ListSurface {
    /// Replaces every tile with `tiles`, in order.
    fn render(&mut self, tiles: &[TileView]);
    /// Adds one tile at the end without re-rendering the rest.
    fn append(&mut self, tile: &TileView);
    fn remove(&mut self, location: &LocationId);
    fn clear(&mut self);
    fn set_highlighted(&mut self, location: &LocationId, highlighted: bool);
    fn set_street_view(&mut self, location: &LocationId, url: &str);
    /// Whether the tile currently intersects the visible part of the list.
    fn is_in_view(&self, location: &LocationId) -> bool;
}
