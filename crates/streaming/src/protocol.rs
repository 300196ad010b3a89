//! Wire types for the location browser's JSON endpoints.
//!
//! - `GET /json/locations` → `Vec<LocationRecord>`
//! - `GET /json/movie/<id>` → `MovieDetail`
//! - `GET /json/search` → `Suggestions`
//! - `GET /json/cities` → `Vec<City>`
//!
//! Field names follow the server's JSON; unknown fields are ignored so the
//! server can grow its payloads without breaking older clients.

use foundation::{Bounds, CityId, Coordinate, LocationId, MovieId};
use serde::{Deserialize, Serialize};

/// One filming location inside the queried viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    #[serde(rename = "identifier")]
    pub id: LocationId,
    pub lat: f64,
    pub lng: f64,
    /// 0-based rank by distance from the queried center.
    pub idx: u32,
    pub movie_id: MovieId,
    #[serde(default)]
    pub movie_title: Option<String>,
    #[serde(default)]
    pub movie_release_date: Option<String>,
    #[serde(default)]
    pub movie_poster: Option<String>,
    #[serde(default)]
    pub formatted_name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub city: Option<CityId>,
    #[serde(default)]
    pub city_name: Option<String>,
}

impl LocationRecord {
    pub fn coord(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// A movie's filming location as listed on the movie itself.
///
/// The server sends either bare ids or `{identifier, lat, lng}` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationRef {
    Id(LocationId),
    Point {
        #[serde(rename = "identifier")]
        id: LocationId,
        lat: f64,
        lng: f64,
    },
}

impl LocationRef {
    pub fn id(&self) -> &LocationId {
        match self {
            LocationRef::Id(id) => id,
            LocationRef::Point { id, .. } => id,
        }
    }

    pub fn coord(&self) -> Option<Coordinate> {
        match self {
            LocationRef::Id(_) => None,
            LocationRef::Point { lat, lng, .. } => Some(Coordinate::new(*lat, *lng)),
        }
    }
}

/// Bounding box of a movie's locations; falls back to the point refs when
/// the server omitted `bbox`.
fn movie_bbox(bbox: Option<Bounds>, locations: &[LocationRef]) -> Option<Bounds> {
    bbox.or_else(|| Bounds::from_coordinates(locations.iter().filter_map(LocationRef::coord)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    #[serde(rename = "identifier")]
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub cast: Vec<Person>,
    #[serde(default)]
    pub director: Option<Person>,
    #[serde(default)]
    pub writers: Vec<Person>,
    #[serde(default)]
    pub cities: Vec<CityId>,
    /// Extent of the movie's locations in the requested city.
    #[serde(default)]
    pub bbox: Option<Bounds>,
    #[serde(default)]
    pub locations: Vec<LocationRef>,
}

impl MovieDetail {
    pub fn bbox(&self) -> Option<Bounds> {
        movie_bbox(self.bbox, &self.locations)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSuggestion {
    #[serde(rename = "identifier")]
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub bbox: Option<Bounds>,
    #[serde(default)]
    pub locations: Vec<LocationRef>,
}

impl MovieSuggestion {
    pub fn bbox(&self) -> Option<Bounds> {
        movie_bbox(self.bbox, &self.locations)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSuggestion {
    #[serde(rename = "identifier")]
    pub id: LocationId,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub formatted_name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub movie_id: Option<MovieId>,
    #[serde(default)]
    pub movie_title: Option<String>,
}

impl LocationSuggestion {
    pub fn coord(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Suggestions {
    #[serde(default)]
    pub movies: Vec<MovieSuggestion>,
    #[serde(default)]
    pub locations: Vec<LocationSuggestion>,
}

impl Suggestions {
    pub fn is_empty(&self) -> bool {
        self.movies.is_empty() && self.locations.is_empty()
    }

    pub fn movie(&self, id: &MovieId) -> Option<&MovieSuggestion> {
        self.movies.iter().find(|m| &m.id == id)
    }

    pub fn location(&self, id: &LocationId) -> Option<&LocationSuggestion> {
        self.locations.iter().find(|l| &l.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(rename = "identifier")]
    pub id: CityId,
    #[serde(default)]
    pub shorthand: Option<String>,
    pub formatted_name: String,
    pub lat: f64,
    pub lng: f64,
}

impl City {
    pub fn coord(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::{City, LocationRecord, LocationRef, MovieDetail, Suggestions};
    use foundation::{Coordinate, LocationId, MovieId};
    use pretty_assertions::assert_eq;

    #[test]
    fn location_record_parses_server_payload() {
        let json = r#"{
            "identifier": "ChIJ-loc-1",
            "city": "ChIJ-sf",
            "city_name": "San Francisco, CA, USA",
            "movie_id": "tt0071562",
            "movie_title": "The Godfather: Part II",
            "movie_release_date": "1974-12-12",
            "movie_poster": "https://image.tmdb.org/t/p/w185/poster.jpg",
            "lat": 37.7997,
            "lng": -122.4381,
            "formatted_name": "Fort Mason, San Francisco, CA",
            "short_name": "Fort Mason",
            "idx": 0
        }"#;
        let rec: LocationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.id, LocationId::new("ChIJ-loc-1"));
        assert_eq!(rec.movie_id, MovieId::new("tt0071562"));
        assert_eq!(rec.short_name.as_deref(), Some("Fort Mason"));
        assert_eq!(rec.coord(), Coordinate::new(37.7997, -122.4381));
    }

    #[test]
    fn location_record_tolerates_missing_display_fields() {
        let json = r#"{"identifier":"a","lat":1.0,"lng":2.0,"idx":3,"movie_id":"m","extra":true}"#;
        let rec: LocationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.idx, 3);
        assert_eq!(rec.movie_title, None);
    }

    #[test]
    fn location_refs_accept_ids_and_points() {
        let refs: Vec<LocationRef> =
            serde_json::from_str(r#"["a", {"identifier": "b", "lat": 1.5, "lng": -2.0}]"#).unwrap();
        assert_eq!(refs[0].id().as_str(), "a");
        assert_eq!(refs[0].coord(), None);
        assert_eq!(refs[1].id().as_str(), "b");
        assert_eq!(refs[1].coord(), Some(Coordinate::new(1.5, -2.0)));
    }

    #[test]
    fn movie_bbox_falls_back_to_location_points() {
        let json = r#"{
            "identifier": "tt1",
            "title": "Vertigo",
            "locations": [
                {"identifier": "a", "lat": 37.80, "lng": -122.47},
                {"identifier": "b", "lat": 37.78, "lng": -122.40}
            ]
        }"#;
        let movie: MovieDetail = serde_json::from_str(json).unwrap();
        let bbox = movie.bbox().expect("derived bbox");
        assert_eq!(bbox.sw, Coordinate::new(37.78, -122.47));
        assert_eq!(bbox.ne, Coordinate::new(37.80, -122.40));
    }

    #[test]
    fn suggestions_parse_and_lookup() {
        let json = r#"{
            "movies": [{
                "identifier": "tt1",
                "title": "Vertigo",
                "bbox": {"sw": {"lat": 37.7, "lng": -122.5}, "ne": {"lat": 37.8, "lng": -122.4}},
                "locations": ["a", "b"]
            }],
            "locations": [{"identifier": "a", "lat": 37.75, "lng": -122.45}]
        }"#;
        let s: Suggestions = serde_json::from_str(json).unwrap();
        assert!(!s.is_empty());
        let movie = s.movie(&MovieId::new("tt1")).expect("movie");
        assert_eq!(movie.bbox().unwrap().ne, Coordinate::new(37.8, -122.4));
        assert!(s.location(&LocationId::new("a")).is_some());
        assert!(s.location(&LocationId::new("zzz")).is_none());

        let empty: Suggestions =
            serde_json::from_str(r#"{"movies": [], "locations": []}"#).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn city_parses() {
        let json = r#"{"identifier":"sf","shorthand":"SF","formatted_name":"San Francisco, CA, USA","lat":37.77,"lng":-122.41}"#;
        let city: City = serde_json::from_str(json).unwrap();
        assert_eq!(city.coord(), Coordinate::new(37.77, -122.41));
        assert_eq!(city.shorthand.as_deref(), Some("SF"));
    }
}
