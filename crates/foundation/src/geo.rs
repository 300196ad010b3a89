//! Geographic primitives consumed by the map surface and embedded in queries.

use serde::{Deserialize, Serialize};

/// Decimal places used when rendering coordinates into query strings.
const URL_VALUE_PRECISION: i32 = 6;

/// WGS84 coordinate in degrees.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// `"lat,lng"`, rounded to six decimals.
    pub fn to_url_value(&self) -> String {
        format!("{},{}", round_url(self.lat), round_url(self.lng))
    }
}

/// Lat/lng rectangle given by its south-west and north-east corners.
///
/// Antimeridian-crossing boxes are not modelled; `sw.lng <= ne.lng` is
/// assumed by `contains`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub sw: Coordinate,
    pub ne: Coordinate,
}

impl Bounds {
    pub fn new(sw: Coordinate, ne: Coordinate) -> Self {
        Bounds { sw, ne }
    }

    /// Smallest box holding every coordinate; `None` for an empty input.
    pub fn from_coordinates(coords: impl IntoIterator<Item = Coordinate>) -> Option<Self> {
        let mut iter = coords.into_iter();
        let first = iter.next()?;
        let mut bounds = Bounds::new(first, first);
        for c in iter {
            bounds.extend(c);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, c: Coordinate) {
        self.sw.lat = self.sw.lat.min(c.lat);
        self.sw.lng = self.sw.lng.min(c.lng);
        self.ne.lat = self.ne.lat.max(c.lat);
        self.ne.lng = self.ne.lng.max(c.lng);
    }

    pub fn contains(&self, c: Coordinate) -> bool {
        c.lat >= self.sw.lat && c.lat <= self.ne.lat && c.lng >= self.sw.lng && c.lng <= self.ne.lng
    }

    /// True when both corners of `other` lie inside `self`.
    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        self.contains(other.sw) && self.contains(other.ne)
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.sw.lat + self.ne.lat) / 2.0,
            (self.sw.lng + self.ne.lng) / 2.0,
        )
    }

    /// `"sw_lat,sw_lng,ne_lat,ne_lng"`, rounded to six decimals.
    pub fn to_url_value(&self) -> String {
        format!("{},{}", self.sw.to_url_value(), self.ne.to_url_value())
    }
}

fn round_url(v: f64) -> f64 {
    let scale = 10f64.powi(URL_VALUE_PRECISION);
    let r = (v * scale).round() / scale;
    // Avoid rendering "-0".
    if r == 0.0 { 0.0 } else { r }
}

#[cfg(test)]
mod tests {
    use super::{Bounds, Coordinate};

    fn sf() -> Bounds {
        Bounds::new(Coordinate::new(37.70, -122.52), Coordinate::new(37.83, -122.35))
    }

    #[test]
    fn url_values_are_rounded_and_trimmed() {
        let c = Coordinate::new(37.774_929_1, -122.419_415_8);
        assert_eq!(c.to_url_value(), "37.774929,-122.419416");
        assert_eq!(Coordinate::new(-0.000_000_1, 1.5).to_url_value(), "0,1.5");
        assert_eq!(sf().to_url_value(), "37.7,-122.52,37.83,-122.35");
    }

    #[test]
    fn contains_is_inclusive() {
        let b = sf();
        assert!(b.contains(Coordinate::new(37.70, -122.52)));
        assert!(b.contains(Coordinate::new(37.77, -122.41)));
        assert!(!b.contains(Coordinate::new(37.90, -122.41)));
    }

    #[test]
    fn contains_bounds_requires_both_corners() {
        let b = sf();
        let inner = Bounds::new(Coordinate::new(37.75, -122.45), Coordinate::new(37.78, -122.40));
        let straddling =
            Bounds::new(Coordinate::new(37.75, -122.45), Coordinate::new(37.90, -122.40));
        assert!(b.contains_bounds(&inner));
        assert!(!b.contains_bounds(&straddling));
    }

    #[test]
    fn from_coordinates_builds_envelope() {
        assert_eq!(Bounds::from_coordinates(Vec::<Coordinate>::new()), None);
        let b = Bounds::from_coordinates([
            Coordinate::new(1.0, 5.0),
            Coordinate::new(-2.0, 7.0),
            Coordinate::new(0.5, 4.0),
        ])
        .expect("non-empty");
        assert_eq!(b.sw, Coordinate::new(-2.0, 4.0));
        assert_eq!(b.ne, Coordinate::new(1.0, 7.0));
        assert_eq!(b.center(), Coordinate::new(-0.5, 5.5));
    }
}
