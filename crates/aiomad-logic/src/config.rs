//! Generation settings for the search algorithms.
//!
//! The materializer takes a `GenerationSettings` by reference. Defaults
//! reproduce the stock behaviour; callers may override individual fields
//! (e.g. from a config file they parse themselves).

use serde::{Deserialize, Serialize};

use crate::constants::search;

/// Tunables for placement and path search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Chebyshev radius cap of the ring search around a requested anchor.
    pub search_radius: i32,
    /// Manhattan distance from an unreachable goal still accepted by the path builder.
    pub path_acceptable_error: i32,
    /// Manhattan radius scanned for an existing road when snapping a structure.
    pub road_snap_proximity: i32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            search_radius: search::SEARCH_RADIUS,
            path_acceptable_error: search::ACCEPTABLE_ERROR,
            road_snap_proximity: search::ROAD_SNAP_PROXIMITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let settings = GenerationSettings::default();
        assert_eq!(settings.search_radius, 5);
        assert_eq!(settings.path_acceptable_error, 5);
        assert_eq!(settings.road_snap_proximity, 5);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: GenerationSettings =
            serde_json::from_str(r#"{"search_radius": 8}"#).unwrap();
        assert_eq!(settings.search_radius, 8);
        assert_eq!(settings.road_snap_proximity, 5);
    }
}
