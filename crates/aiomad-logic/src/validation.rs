//! Invariant checks over a generated map.
//!
//! Pure functions that take a finished [`MapRepresentation`] and return
//! validation errors. The pipeline never calls these; tests and the simtest
//! harness do.

use std::collections::HashMap;

use crate::map::MapRepresentation;
use crate::model::{BuildingType, Layer, MapObject, Point};

/// A map validation finding.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub category: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Error severity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

// ── A. Objects ──────────────────────────────────────────────────────────

/// Check that every footprint lies fully inside the map.
pub fn check_objects_in_bounds(map: &MapRepresentation) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let grid = map.object_grid();
    for &layer in &Layer::ALL {
        for object in map.objects(layer) {
            if object.tiles().any(|p| !grid.in_bounds(p)) {
                errors.push(ValidationError {
                    category: "bounds",
                    severity: Severity::Error,
                    message: format!(
                        "{:?} at {:?} on {:?} extends past the map edge",
                        object.kind(),
                        object.anchor(),
                        layer
                    ),
                });
            }
        }
    }
    errors
}

/// Check that no two footprints on a layer share a tile, and that the
/// occupancy bitmap matches the placed footprints exactly.
pub fn check_no_overlap(map: &MapRepresentation) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let grid = map.object_grid();
    let (width, height) = map.dimensions();

    for &layer in &Layer::ALL {
        let mut claimed: HashMap<Point, Point> = HashMap::new();
        for object in map.objects(layer) {
            let anchor = object.anchor();
            for p in object.tiles() {
                if let Some(other) = claimed.insert(p, anchor) {
                    errors.push(ValidationError {
                        category: "overlap",
                        severity: Severity::Error,
                        message: format!(
                            "Objects at {:?} and {:?} both claim {:?} on {:?}",
                            other, anchor, p, layer
                        ),
                    });
                }
            }
        }

        for x in 0..width {
            for y in 0..height {
                let p = Point::new(x, y);
                if grid.is_occupied(p, layer) != claimed.contains_key(&p) {
                    errors.push(ValidationError {
                        category: "occupancy",
                        severity: Severity::Error,
                        message: format!(
                            "Occupancy of {:?} on {:?} disagrees with placed footprints",
                            p, layer
                        ),
                    });
                }
            }
        }
    }
    errors
}

/// Check that every underground gate has an identical surface twin and
/// the other way round.
pub fn check_gate_pairs(map: &MapRepresentation) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for &layer in &Layer::ALL {
        let other = match layer {
            Layer::Surface => Layer::Underground,
            Layer::Underground => Layer::Surface,
        };
        for object in map.objects(layer) {
            let MapObject::Building(gate) = object else {
                continue;
            };
            if gate.building_type != BuildingType::SubterraneanGate {
                continue;
            }
            let twin = map.object_at(other, gate.at.x, gate.at.y);
            if twin != Some(object) {
                errors.push(ValidationError {
                    category: "gate_pair",
                    severity: Severity::Error,
                    message: format!(
                        "Gate at {:?} on {:?} has no matching gate on {:?}",
                        gate.at, layer, other
                    ),
                });
            }
        }
    }
    errors
}

// ── B. Terrain ──────────────────────────────────────────────────────────

/// Check that placeable tiles were painted with non-void terrain.
pub fn check_placeable_painted(map: &MapRepresentation) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let grid = map.object_grid();
    let (width, height) = map.dimensions();
    for &layer in &Layer::ALL {
        for x in 0..width {
            for y in 0..height {
                if !grid.is_placeable(Point::new(x, y), layer) {
                    continue;
                }
                if !map.is_painted(layer, x, y) {
                    errors.push(ValidationError {
                        category: "placeable",
                        severity: Severity::Error,
                        message: format!("Unpainted tile ({x}, {y}) on {layer:?} is placeable"),
                    });
                } else if map.terrain(layer, x, y) == layer.void_terrain() {
                    errors.push(ValidationError {
                        category: "placeable",
                        severity: Severity::Error,
                        message: format!("Void tile ({x}, {y}) on {layer:?} is placeable"),
                    });
                }
            }
        }
    }
    errors
}

// ── C. Report ───────────────────────────────────────────────────────────

/// Surface every failed placement as a warning.
pub fn check_placement_failures(map: &MapRepresentation) -> Vec<ValidationError> {
    map.report()
        .failed()
        .map(|outcome| ValidationError {
            category: "placement",
            severity: Severity::Warning,
            message: format!(
                "{:?} requested at {:?} in {} was not placed: {}",
                outcome.kind,
                outcome.requested,
                outcome.zone.as_deref().unwrap_or("non-zonal area"),
                outcome
                    .result
                    .err()
                    .map(|e| e.to_string())
                    .unwrap_or_default()
            ),
        })
        .collect()
}

/// Run every check.
pub fn validate_map(map: &MapRepresentation) -> Vec<ValidationError> {
    let mut all = Vec::new();
    all.extend(check_objects_in_bounds(map));
    all.extend(check_no_overlap(map));
    all.extend(check_gate_pairs(map));
    all.extend(check_placeable_painted(map));
    all.extend(check_placement_failures(map));
    all
}

/// Only the findings with [`Severity::Error`].
pub fn errors_only(findings: Vec<ValidationError>) -> Vec<ValidationError> {
    findings
        .into_iter()
        .filter(|f| f.severity == Severity::Error)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Building, MapSize, TerrainType};
    use crate::request::{CreateMapRequest, OutsideSpec, Zone};
    use crate::shapes::Shape;

    fn square_zone(id: &str, layer: Layer, terrain: TerrainType, size: i32) -> Zone {
        let half = size / 2;
        Zone {
            id: id.into(),
            location: layer,
            terrain,
            shape: vec![
                Shape::Rect {
                    x: 0,
                    y: 0,
                    w: half,
                    h: half,
                },
                Shape::Rect {
                    x: half,
                    y: 0,
                    w: half,
                    h: half,
                },
                Shape::Rect {
                    x: 0,
                    y: half,
                    w: half,
                    h: half,
                },
                Shape::Rect {
                    x: half,
                    y: half,
                    w: half,
                    h: half,
                },
            ],
            underground_entrance: None,
            obstacles: Vec::new(),
            buildings: Vec::new(),
            towns: Vec::new(),
            roads: Vec::new(),
            rivers: Vec::new(),
            is_starting_player_area: false,
        }
    }

    fn generate(zones: Vec<Zone>) -> MapRepresentation {
        let request = CreateMapRequest {
            size: MapSize::S,
            title: "validation".into(),
            description: String::new(),
            players: 1,
            has_underground: true,
            zones,
            non_zonal_surface_spec: OutsideSpec::default(),
            non_zonal_underground_spec: OutsideSpec::default(),
        };
        MapRepresentation::from_request(&request).unwrap()
    }

    #[test]
    fn test_clean_map_has_no_errors() {
        let mut top = square_zone("top", Layer::Surface, TerrainType::Grass, 12);
        top.underground_entrance = Some(Point::new(6, 6));
        top.buildings
            .push(Building::new(Point::new(9, 9), BuildingType::GoldMine, None));
        let below = square_zone("below", Layer::Underground, TerrainType::Subterranean, 12);
        let map = generate(vec![top, below]);
        let errs = errors_only(validate_map(&map));
        assert!(errs.is_empty(), "Expected no errors, got: {:?}", errs);
    }

    #[test]
    fn test_failures_become_warnings() {
        // nothing fits inside a lake
        let mut lake = square_zone("lake", Layer::Surface, TerrainType::Water, 12);
        lake.buildings
            .push(Building::new(Point::new(6, 6), BuildingType::OrePit, None));
        let map = generate(vec![lake]);
        let findings = check_placement_failures(&map);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert!(errors_only(validate_map(&map)).is_empty());
    }
}
