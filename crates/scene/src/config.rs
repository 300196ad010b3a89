use serde::{Deserialize, Serialize};

/// Tunables for one browsing session.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Quiet period before a viewport change refetches locations.
    pub location_debounce_ms: u64,
    /// Quiet period before a search query is sent.
    pub search_debounce_ms: u64,
    /// Zoom applied when a city is selected.
    pub default_zoom: u8,
    pub street_view: StreetViewConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            location_debounce_ms: 500,
            search_debounce_ms: 1000,
            default_zoom: 15,
            street_view: StreetViewConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreetViewConfig {
    pub base_url: String,
    /// Square thumbnail edge in pixels.
    pub size_px: u32,
    /// Image shown on a tile until it scrolls into view.
    pub placeholder: String,
}

impl Default for StreetViewConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com/maps/api/streetview".to_string(),
            size_px: 100,
            placeholder: "/static/img/streetview.png".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SessionConfig;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: SessionConfig =
            serde_json::from_str(r#"{"location_debounce_ms": 250, "street_view": {"size_px": 120}}"#)
                .unwrap();
        assert_eq!(cfg.location_debounce_ms, 250);
        assert_eq!(cfg.search_debounce_ms, 1000);
        assert_eq!(cfg.default_zoom, 15);
        assert_eq!(cfg.street_view.size_px, 120);
        assert_eq!(cfg.street_view.placeholder, "/static/img/streetview.png");
    }
}
