//! Map materializer — turns a validated request into a populated map.
//!
//! Generation runs six phases in a fixed order. Each phase completes before
//! the next starts and never re-opens an earlier one:
//!
//! | Phase | Step                 | Effect                                          |
//! |-------|----------------------|-------------------------------------------------|
//! | 1     | create zones         | paint terrain, clean water, stamp roads/rivers  |
//! | 2     | place towns          | ring search inside each zone                    |
//! | 3     | snap roads to towns  | connect each town entrance to the nearest road  |
//! | 4     | place buildings      | entrance gates, docks, everything else          |
//! | 5     | snap roads to gates  | as phase 3, for entrance-bearing buildings      |
//! | 6     | place obstacles      | non-zonal clutter first, then zone obstacles    |
//!
//! Placement decisions are visible to every later one: an object placed
//! earlier can push a later request elsewhere or make it fail. Failures are
//! logged and recorded in the [`GenerationReport`]; the pipeline itself only
//! errors on a malformed request.

use indexmap::IndexMap;

use crate::config::GenerationSettings;
use crate::model::{
    Building, BuildingType, Dimensions, Layer, MapObject, ObjectKind, Point, RiverType, RoadType,
    TerrainType,
};
use crate::objects::ObjectGrid;
use crate::pathfinding::PathBuilder;
use crate::report::{GenerationReport, PlacementFailure, PlacementOutcome, TerrainConflict};
use crate::request::{CreateMapRequest, RequestError, Zone, ZoneFootprint};
use crate::terrain::{TerrainGrid, TileWrite};

/// A requested zone alongside its rasterized footprint.
#[derive(Debug, Clone)]
pub struct MaterializedZone {
    pub zone: Zone,
    pub footprint: ZoneFootprint,
}

/// A fully generated map, ready for an external codec.
#[derive(Debug, Clone)]
pub struct MapRepresentation {
    dimensions: Dimensions,
    title: String,
    description: String,
    players: u32,
    has_underground: bool,
    zones: IndexMap<String, MaterializedZone>,
    terrain: TerrainGrid,
    objects: ObjectGrid,
    settings: GenerationSettings,
    report: GenerationReport,
}

impl MapRepresentation {
    /// Generate with default settings.
    pub fn from_request(request: &CreateMapRequest) -> Result<Self, Vec<RequestError>> {
        Self::build(request, &GenerationSettings::default())
    }

    /// Validate `request`, then run every generation phase.
    pub fn build(
        request: &CreateMapRequest,
        settings: &GenerationSettings,
    ) -> Result<Self, Vec<RequestError>> {
        let errors = request.validate();
        if !errors.is_empty() {
            log::warn!("Rejecting map request with {} errors", errors.len());
            return Err(errors);
        }

        let dimensions = request.dimensions();
        log::info!(
            "Generating '{}' at {}x{} for {} players (underground: {})",
            request.title,
            dimensions.0,
            dimensions.1,
            request.players,
            request.has_underground
        );

        let mut map = Self {
            dimensions,
            title: request.title.clone(),
            description: request.description.clone(),
            players: request.players,
            has_underground: request.has_underground,
            zones: IndexMap::new(),
            terrain: TerrainGrid::new(dimensions),
            objects: ObjectGrid::new(dimensions, settings.search_radius),
            settings: *settings,
            report: GenerationReport::default(),
        };

        map.create_zones(request);
        map.place_towns();
        map.snap_roads_to_towns();
        map.place_buildings();
        map.snap_roads_to_gates();
        map.place_obstacles(request);

        log::info!("Map generated: {}", map.report.summary());
        Ok(map)
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn players(&self) -> u32 {
        self.players
    }

    pub fn has_underground(&self) -> bool {
        self.has_underground
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Zones in request order.
    pub fn zones(&self) -> &IndexMap<String, MaterializedZone> {
        &self.zones
    }

    /// Terrain at `(x, y)` on `layer`, void if no zone painted it.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the map.
    pub fn terrain(&self, layer: Layer, x: i32, y: i32) -> TerrainType {
        self.terrain.get_tile(Point::new(x, y), layer)
    }

    pub fn is_painted(&self, layer: Layer, x: i32, y: i32) -> bool {
        self.terrain.is_painted(Point::new(x, y), layer)
    }

    /// Object anchored at `(x, y)` on `layer`.
    pub fn object_at(&self, layer: Layer, x: i32, y: i32) -> Option<&MapObject> {
        self.objects.object_at(Point::new(x, y), layer)
    }

    pub fn road_at(&self, layer: Layer, x: i32, y: i32) -> Option<RoadType> {
        self.terrain.road_at(Point::new(x, y), layer)
    }

    pub fn river_at(&self, layer: Layer, x: i32, y: i32) -> Option<RiverType> {
        self.terrain.river_at(Point::new(x, y), layer)
    }

    pub fn objects(&self, layer: Layer) -> impl Iterator<Item = &MapObject> {
        self.objects.objects(layer)
    }

    pub fn terrain_grid(&self) -> &TerrainGrid {
        &self.terrain
    }

    pub fn object_grid(&self) -> &ObjectGrid {
        &self.objects
    }

    pub fn report(&self) -> &GenerationReport {
        &self.report
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    // ── Phase 1: zones ──────────────────────────────────────────────────

    fn create_zones(&mut self, request: &CreateMapRequest) {
        log::info!("Creating {} zones", request.zones.len());
        for zone in &request.zones {
            log::debug!("Creating zone {}", zone.id);
            let footprint = zone.footprint();
            paint_tiles(
                &mut self.terrain,
                &mut self.objects,
                &mut self.report,
                zone,
                footprint.tiles(),
            );
            self.zones.insert(
                zone.id.clone(),
                MaterializedZone {
                    zone: zone.clone(),
                    footprint,
                },
            );
        }

        let reclassified = self.terrain.remove_useless_water();
        for &p in &reclassified {
            self.objects.set_placeable(p, Layer::Surface);
        }
        self.report.reclassified_water = reclassified.len();

        let acceptable_error = self.settings.path_acceptable_error;
        for entry in self.zones.values() {
            let layer = entry.zone.location;
            for road in &entry.zone.roads {
                let tiles = PathBuilder::new(self.terrain.passable(layer))
                    .with_acceptable_error(acceptable_error)
                    .build_route(&road.path.path);
                if tiles.is_empty() {
                    log::warn!("Road in zone {} could not be routed", entry.zone.id);
                }
                for p in tiles {
                    let fresh = self.terrain.road_at(p, layer).is_none();
                    if self.terrain.set_road(p, layer, road.road_type) && fresh {
                        self.report.road_tiles += 1;
                    }
                    self.objects.set_unplaceable(p, layer);
                }
            }
        }
        for entry in self.zones.values() {
            let layer = entry.zone.location;
            for river in &entry.zone.rivers {
                let tiles = PathBuilder::new(self.terrain.passable(layer))
                    .with_acceptable_error(acceptable_error)
                    .build_route(&river.path.path);
                if tiles.is_empty() {
                    log::warn!("River in zone {} could not be routed", entry.zone.id);
                }
                for p in tiles {
                    let fresh = self.terrain.river_at(p, layer).is_none();
                    if self.terrain.set_river(p, layer, river.river_type) && fresh {
                        self.report.river_tiles += 1;
                    }
                }
            }
        }
        log::info!(
            "Zones created: {} road tiles, {} river tiles",
            self.report.road_tiles,
            self.report.river_tiles
        );
    }

    // ── Phase 2: towns ──────────────────────────────────────────────────

    fn place_towns(&mut self) {
        log::info!("Placing towns");
        for entry in self.zones.values() {
            for town in &entry.zone.towns {
                let result = self.objects.place_town(&entry.footprint, town.clone());
                self.report.record(PlacementOutcome {
                    kind: ObjectKind::Town,
                    zone: Some(entry.zone.id.clone()),
                    layer: entry.footprint.layer(),
                    requested: town.at,
                    result,
                });
            }
        }
    }

    // ── Phases 3 and 5: road snapping ───────────────────────────────────

    fn snap_roads_to_towns(&mut self) {
        log::info!("Snapping roads to towns");
        let entrances: Vec<(Layer, Point)> = self
            .objects
            .towns()
            .into_iter()
            .map(|(layer, town)| (layer, town.entrance()))
            .collect();
        for (layer, entrance) in entrances {
            self.snap_to_road(entrance, layer);
        }
    }

    fn snap_roads_to_gates(&mut self) {
        log::info!("Snapping roads to gates");
        let entrances: Vec<(Layer, Point)> = self
            .objects
            .buildings()
            .into_iter()
            .filter(|(_, b)| b.building_type.has_entrance())
            .map(|(layer, b)| (layer, b.entrance()))
            .collect();
        for (layer, entrance) in entrances {
            self.snap_to_road(entrance, layer);
        }
    }

    /// Connect `entrance` to the nearest stamped road, if one is close enough.
    fn snap_to_road(&mut self, entrance: Point, layer: Layer) {
        if !self.terrain.in_bounds(entrance) {
            log::debug!("Entrance {:?} lies outside the map, not snapping", entrance);
            return;
        }
        let Some((goal, road_type)) =
            self.terrain
                .road_closest_to(entrance, layer, self.settings.road_snap_proximity)
        else {
            log::debug!("No road near entrance {:?} {:?}", entrance, layer);
            return;
        };

        let terrain = &self.terrain;
        let objects = &self.objects;
        let tiles = PathBuilder::new(|p: Point| {
            terrain.is_painted(p, layer) && !objects.is_occupied(p, layer)
        })
        .with_acceptable_error(self.settings.path_acceptable_error)
        .build_path(entrance, goal);

        log::debug!(
            "Snapping {:?} to road at {:?} over {} tiles",
            entrance,
            goal,
            tiles.len()
        );
        for p in tiles {
            let fresh = self.terrain.road_at(p, layer).is_none();
            if self.terrain.set_road(p, layer, road_type) && fresh {
                self.report.road_tiles += 1;
            }
            self.objects.set_unplaceable(p, layer);
        }
    }

    // ── Phase 4: buildings ──────────────────────────────────────────────

    fn place_buildings(&mut self) {
        log::info!("Placing buildings");
        let zone_ids: Vec<String> = self.zones.keys().cloned().collect();
        for id in zone_ids {
            let Some(entry) = self.zones.get(&id).cloned() else {
                continue;
            };

            if let Some(at) = entry.zone.underground_entrance {
                let gate = Building::new(at, BuildingType::SubterraneanGate, None);
                let result = self.place_gate(gate, true);
                self.record_building(&entry, Layer::Surface, at, result);
            }

            let layer = entry.footprint.layer();
            for building in &entry.zone.buildings {
                let requested = building.at;
                let result = if building.building_type == BuildingType::SubterraneanGate {
                    self.place_gate(building.clone(), false)
                } else if building.building_type.is_dock() {
                    if layer == Layer::Underground {
                        Err(PlacementFailure::DockUnderground)
                    } else {
                        self.objects
                            .place_building_near_water(layer, building.clone(), &self.terrain)
                    }
                } else {
                    self.objects
                        .place_building(&entry.footprint, building.clone())
                };
                let gate_layer = if building.building_type == BuildingType::SubterraneanGate {
                    Layer::Surface
                } else {
                    layer
                };
                self.record_building(&entry, gate_layer, requested, result);
            }
        }
    }

    /// Place a gate on both layers, suppressing duplicates nearby.
    ///
    /// With `may_expand`, a failed placement dilates the underground
    /// entrance zones (once per map) and retries.
    fn place_gate(&mut self, gate: Building, may_expand: bool) -> Result<Point, PlacementFailure> {
        if !self.has_underground {
            return Err(PlacementFailure::NoUnderground);
        }
        if self.objects.already_exists_in_proximity(&gate, Layer::Surface) {
            return Err(PlacementFailure::DuplicateNearby);
        }
        match self.objects.place_building_at_both_levels(gate.clone()) {
            Ok(at) => Ok(at),
            Err(_) if may_expand => {
                log::debug!("Gate at {:?} does not fit, expanding entrance zones", gate.at);
                self.expand_entrance_zones();
                self.objects.place_building_at_both_levels(gate)
            }
            Err(e) => Err(e),
        }
    }

    /// Grow every underground zone that has an entrance by one ring of tiles.
    fn expand_entrance_zones(&mut self) {
        if self.report.entrance_zones_expanded {
            return;
        }
        self.report.entrance_zones_expanded = true;
        for entry in self.zones.values() {
            if entry.zone.underground_entrance.is_none()
                || entry.zone.location != Layer::Underground
            {
                continue;
            }
            log::info!("Expanding entrance zone {}", entry.zone.id);
            let perimeter: Vec<Point> = entry
                .zone
                .expanded_perimeter()
                .into_iter()
                .filter(|&p| !self.terrain.is_painted(p, Layer::Underground))
                .collect();
            paint_tiles(
                &mut self.terrain,
                &mut self.objects,
                &mut self.report,
                &entry.zone,
                &perimeter,
            );
        }
    }

    fn record_building(
        &mut self,
        entry: &MaterializedZone,
        layer: Layer,
        requested: Point,
        result: Result<Point, PlacementFailure>,
    ) {
        self.report.record(PlacementOutcome {
            kind: ObjectKind::Building,
            zone: Some(entry.zone.id.clone()),
            layer,
            requested,
            result,
        });
    }

    // ── Phase 6: obstacles ──────────────────────────────────────────────

    fn place_obstacles(&mut self, request: &CreateMapRequest) {
        log::info!("Placing obstacles");
        for obstacle in &request.non_zonal_surface_spec.obstacles {
            let result = self
                .objects
                .force_place_obstacle(Layer::Surface, obstacle.clone());
            self.report.record(PlacementOutcome {
                kind: ObjectKind::Obstacle,
                zone: None,
                layer: Layer::Surface,
                requested: obstacle.starting_point,
                result,
            });
        }

        for obstacle in &request.non_zonal_underground_spec.obstacles {
            let at = obstacle.starting_point;
            let result = if !self.has_underground {
                Err(PlacementFailure::NoUnderground)
            } else if !self.terrain.in_bounds(at) {
                Err(PlacementFailure::Blocked)
            } else if self.terrain.get_tile(at, Layer::Underground) == TerrainType::Rock {
                Err(PlacementFailure::VoidTerrain)
            } else {
                self.objects
                    .force_place_obstacle(Layer::Underground, obstacle.clone())
            };
            self.report.record(PlacementOutcome {
                kind: ObjectKind::Obstacle,
                zone: None,
                layer: Layer::Underground,
                requested: at,
                result,
            });
        }

        for entry in self.zones.values() {
            for obstacle in &entry.zone.obstacles {
                let result = self
                    .objects
                    .place_obstacle(&entry.footprint, obstacle.clone());
                self.report.record(PlacementOutcome {
                    kind: ObjectKind::Obstacle,
                    zone: Some(entry.zone.id.clone()),
                    layer: entry.footprint.layer(),
                    requested: obstacle.starting_point,
                    result,
                });
            }
        }
    }
}

/// Paint `tiles` with the zone's terrain, first writer wins.
///
/// Freshly painted tiles become placeable unless they hold the layer's void
/// terrain. Dropped writes are logged and recorded as conflicts.
fn paint_tiles(
    terrain: &mut TerrainGrid,
    objects: &mut ObjectGrid,
    report: &mut GenerationReport,
    zone: &Zone,
    tiles: &[Point],
) {
    let layer = zone.location;
    for &p in tiles {
        match terrain.set_tile(p, layer, zone.terrain) {
            TileWrite::Painted if zone.terrain == layer.void_terrain() => {
                objects.set_unplaceable(p, layer);
            }
            TileWrite::Painted => objects.set_placeable(p, layer),
            TileWrite::AlreadyPainted(kept) => {
                log::warn!(
                    "Tile at {:?} {:?} is already painted {:?}, zone {} keeps it",
                    p,
                    layer,
                    kept,
                    zone.id
                );
                report.terrain_conflicts.push(TerrainConflict {
                    zone: zone.id.clone(),
                    layer,
                    at: p,
                    kept,
                    dropped: zone.terrain,
                });
            }
            TileWrite::OutOfBounds => report.out_of_bounds_tiles += 1,
        }
    }
}
