use foundation::{Bounds, CityId, Coordinate, MovieId};

pub const LOCATIONS_PATH: &str = "/json/locations";
pub const MOVIE_PATH: &str = "/json/movie";
pub const SEARCH_PATH: &str = "/json/search";
pub const CITIES_PATH: &str = "/json/cities";

/// Viewport-scoped location query.
///
/// Captures the viewport at the moment the fetch is issued; the response is
/// applied against whatever the viewport is by then.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationQuery {
    pub bounds: Bounds,
    pub center: Coordinate,
}

impl LocationQuery {
    pub fn new(bounds: Bounds, center: Coordinate) -> Self {
        Self { bounds, center }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("bounds", self.bounds.to_url_value()),
            ("center", self.center.to_url_value()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieQuery {
    pub movie: MovieId,
    pub city: Option<CityId>,
}

impl MovieQuery {
    pub fn path(&self) -> String {
        format!("{MOVIE_PATH}/{}", self.movie)
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        city_pair(self.city.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub city: Option<CityId>,
}

impl SearchQuery {
    /// Blank queries are answered locally with no suggestions.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("q", self.text.clone())];
        pairs.extend(city_pair(self.city.as_ref()));
        pairs
    }
}

fn city_pair(city: Option<&CityId>) -> Vec<(&'static str, String)> {
    city.map(|c| ("city", c.to_string())).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::{LocationQuery, MovieQuery, SearchQuery};
    use foundation::{Bounds, CityId, Coordinate, MovieId};

    #[test]
    fn location_query_uses_url_values() {
        let q = LocationQuery::new(
            Bounds::new(Coordinate::new(37.7, -122.5), Coordinate::new(37.8, -122.4)),
            Coordinate::new(37.75, -122.45),
        );
        assert_eq!(
            q.query_pairs(),
            vec![
                ("bounds", "37.7,-122.5,37.8,-122.4".to_string()),
                ("center", "37.75,-122.45".to_string()),
            ]
        );
    }

    #[test]
    fn movie_and_search_queries_carry_city_context() {
        let m = MovieQuery {
            movie: MovieId::new("tt1"),
            city: Some(CityId::new("sf")),
        };
        assert_eq!(m.path(), "/json/movie/tt1");
        assert_eq!(m.query_pairs(), vec![("city", "sf".to_string())]);

        let s = SearchQuery {
            text: "vert".to_string(),
            city: None,
        };
        assert_eq!(s.query_pairs(), vec![("q", "vert".to_string())]);
        assert!(!s.is_blank());
        assert!(SearchQuery { text: "  ".into(), city: None }.is_blank());
    }
}
