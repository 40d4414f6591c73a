//! What the pipeline did with each placement request.
//!
//! Soft failures never abort generation. Each one is logged where it is
//! detected and also recorded here, so callers and tests can assert on them
//! without scraping log output.

use std::fmt;

use serde::Serialize;

use crate::model::{Layer, ObjectKind, Point, TerrainType};

/// Why a requested object did not end up on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementFailure {
    /// Ring search exhausted its radius.
    NoFreeSpace,
    /// A structure of the same type already stands within the search ring.
    DuplicateNearby,
    /// Forced placement hit the map edge or an existing footprint.
    Blocked,
    /// Anchor lies on the layer's void terrain.
    VoidTerrain,
    /// Underground-only object on a map without an underground.
    NoUnderground,
    /// Docks are never placed underground.
    DockUnderground,
}

impl fmt::Display for PlacementFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PlacementFailure::NoFreeSpace => "no free space within search radius",
            PlacementFailure::DuplicateNearby => "same structure already nearby",
            PlacementFailure::Blocked => "footprint blocked",
            PlacementFailure::VoidTerrain => "anchor on void terrain",
            PlacementFailure::NoUnderground => "map has no underground",
            PlacementFailure::DockUnderground => "docks cannot be underground",
        };
        f.write_str(text)
    }
}

/// Result of one placement request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementOutcome {
    pub kind: ObjectKind,
    /// Owning zone, `None` for non-zonal clutter.
    pub zone: Option<String>,
    pub layer: Layer,
    pub requested: Point,
    pub result: Result<Point, PlacementFailure>,
}

impl PlacementOutcome {
    pub fn is_placed(&self) -> bool {
        self.result.is_ok()
    }
}

/// A terrain write dropped because another zone painted the tile first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerrainConflict {
    pub zone: String,
    pub layer: Layer,
    pub at: Point,
    pub kept: TerrainType,
    pub dropped: TerrainType,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    pub placements: Vec<PlacementOutcome>,
    pub terrain_conflicts: Vec<TerrainConflict>,
    /// Zone tiles that fell outside the map.
    pub out_of_bounds_tiles: usize,
    pub reclassified_water: usize,
    pub road_tiles: usize,
    pub river_tiles: usize,
    /// Whether entrance zones had to be dilated to fit a gate.
    pub entrance_zones_expanded: bool,
}

impl GenerationReport {
    pub fn record(&mut self, outcome: PlacementOutcome) {
        match outcome.result {
            Ok(at) => log::debug!(
                "Placed {:?} requested at {:?} at {:?} {:?}",
                outcome.kind,
                outcome.requested,
                at,
                outcome.layer
            ),
            Err(reason) => log::warn!(
                "Can't place {:?} requested at {:?} in {} ({:?}): {}",
                outcome.kind,
                outcome.requested,
                outcome.zone.as_deref().unwrap_or("non-zonal area"),
                outcome.layer,
                reason
            ),
        }
        self.placements.push(outcome);
    }

    pub fn placed(&self) -> impl Iterator<Item = &PlacementOutcome> {
        self.placements.iter().filter(|o| o.is_placed())
    }

    pub fn failed(&self) -> impl Iterator<Item = &PlacementOutcome> {
        self.placements.iter().filter(|o| !o.is_placed())
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        format!(
            "{} placed, {} failed, {} terrain conflicts, {} water tiles reclassified, \
             {} road tiles, {} river tiles",
            self.placed().count(),
            self.failed().count(),
            self.terrain_conflicts.len(),
            self.reclassified_water,
            self.road_tiles,
            self.river_tiles
        )
    }
}
