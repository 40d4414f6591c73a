//! Object placement grid — buildings, towns and obstacles per layer.
//!
//! Alongside the objects themselves (keyed by anchor) each layer keeps two
//! bitmaps:
//!
//! - `placeable`: the tile belongs to some zone's interior and is not void
//! - `occupied`: some footprint already claims the tile
//!
//! # Ring search
//!
//! Every placement resolves its anchor the same way: test the requested
//! anchor, then every point on square (Chebyshev) rings of distance
//! `1..=search_radius` around it, in a fixed order, and take the first
//! anchor that passes. The search is bounded, so it always terminates.
//!
//! ```text
//!   2 2 2 2 2
//!   2 1 1 1 2
//!   2 1 0 1 2      0 = requested anchor, n = ring n
//!   2 1 1 1 2
//!   2 2 2 2 2
//! ```

use crate::model::{Building, Dimensions, Layer, MapObject, Obstacle, Point, Town};
use crate::report::PlacementFailure;
use crate::request::ZoneFootprint;
use crate::terrain::TerrainGrid;

#[derive(Debug, Clone)]
struct ObjectLayer {
    objects: Vec<Option<MapObject>>,
    placeable: Vec<bool>,
    occupied: Vec<bool>,
}

impl ObjectLayer {
    fn new(len: usize) -> Self {
        Self {
            objects: vec![None; len],
            placeable: vec![false; len],
            occupied: vec![false; len],
        }
    }
}

/// Placed objects and placement bitmaps of both layers.
#[derive(Debug, Clone)]
pub struct ObjectGrid {
    width: i32,
    height: i32,
    search_radius: i32,
    layers: [ObjectLayer; 2],
}

/// Points on square rings of distance `1..=radius` around `center`.
pub fn ring_positions(center: Point, radius: i32) -> impl Iterator<Item = Point> {
    (1..=radius).flat_map(move |distance| {
        (-distance..=distance).flat_map(move |dx| {
            (-distance..=distance)
                .filter(move |dy| dx.abs().max(dy.abs()) == distance)
                .map(move |dy| center.offset(dx, dy))
        })
    })
}

impl ObjectGrid {
    pub fn new(dimensions: Dimensions, search_radius: i32) -> Self {
        let (width, height) = dimensions;
        let len = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            search_radius,
            layers: [ObjectLayer::new(len), ObjectLayer::new(len)],
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        (self.width, self.height)
    }

    pub fn search_radius(&self) -> i32 {
        self.search_radius
    }

    pub fn in_bounds(&self, p: Point) -> bool {
        p.x >= 0 && p.x < self.width && p.y >= 0 && p.y < self.height
    }

    fn index(&self, p: Point) -> Option<usize> {
        self.in_bounds(p)
            .then(|| (p.x * self.height + p.y) as usize)
    }

    fn layer(&self, layer: Layer) -> &ObjectLayer {
        &self.layers[layer.level()]
    }

    fn layer_mut(&mut self, layer: Layer) -> &mut ObjectLayer {
        &mut self.layers[layer.level()]
    }

    // ── Bitmaps ─────────────────────────────────────────────────────────

    pub fn set_placeable(&mut self, p: Point, layer: Layer) {
        if let Some(idx) = self.index(p) {
            log::trace!("Marking {:?} {:?} as placeable", p, layer);
            self.layer_mut(layer).placeable[idx] = true;
        }
    }

    pub fn set_unplaceable(&mut self, p: Point, layer: Layer) {
        if let Some(idx) = self.index(p) {
            log::trace!("Marking {:?} {:?} as unplaceable", p, layer);
            self.layer_mut(layer).placeable[idx] = false;
        }
    }

    pub fn is_placeable(&self, p: Point, layer: Layer) -> bool {
        self.index(p)
            .is_some_and(|idx| self.layer(layer).placeable[idx])
    }

    pub fn is_occupied(&self, p: Point, layer: Layer) -> bool {
        self.index(p)
            .is_some_and(|idx| self.layer(layer).occupied[idx])
    }

    // ── Lookups ─────────────────────────────────────────────────────────

    /// Object anchored exactly at `p`.
    pub fn object_at(&self, p: Point, layer: Layer) -> Option<&MapObject> {
        self.index(p)
            .and_then(|idx| self.layer(layer).objects[idx].as_ref())
    }

    pub fn building_at(&self, p: Point, layer: Layer) -> Option<&Building> {
        match self.object_at(p, layer) {
            Some(MapObject::Building(b)) => Some(b),
            _ => None,
        }
    }

    /// All objects on `layer`, column by column.
    pub fn objects(&self, layer: Layer) -> impl Iterator<Item = &MapObject> {
        self.layer(layer).objects.iter().flatten()
    }

    /// Every placed town with its layer.
    pub fn towns(&self) -> Vec<(Layer, Town)> {
        Layer::ALL
            .iter()
            .flat_map(|&layer| {
                self.objects(layer).filter_map(move |o| match o {
                    MapObject::Town(t) => Some((layer, t.clone())),
                    _ => None,
                })
            })
            .collect()
    }

    /// Every placed building with its layer.
    pub fn buildings(&self) -> Vec<(Layer, Building)> {
        Layer::ALL
            .iter()
            .flat_map(|&layer| {
                self.objects(layer).filter_map(move |o| match o {
                    MapObject::Building(b) => Some((layer, b.clone())),
                    _ => None,
                })
            })
            .collect()
    }

    // ── Search ──────────────────────────────────────────────────────────

    /// The requested anchor followed by every ring position.
    fn candidates(&self, at: Point) -> impl Iterator<Item = Point> {
        std::iter::once(at).chain(ring_positions(at, self.search_radius))
    }

    /// Every footprint tile in bounds, placeable and not yet occupied.
    pub fn can_place_at(&self, anchor: Point, dims: Dimensions, layer: Layer) -> bool {
        let grid = self.layer(layer);
        anchor.footprint(dims).all(|p| match self.index(p) {
            Some(idx) => grid.placeable[idx] && !grid.occupied[idx],
            None => false,
        })
    }

    /// Ring search constrained to the zone's own tiles.
    pub fn find_free_space_for_level(
        &self,
        zone: &ZoneFootprint,
        at: Point,
        dims: Dimensions,
    ) -> Option<Point> {
        let layer = zone.layer();
        self.candidates(at).find(|&p| {
            self.can_place_at(p, dims, layer) && zone.contains_footprint(p, dims)
        })
    }

    /// Ring search for an anchor valid on both layers at once.
    pub fn find_connected_free_space(&self, at: Point, dims: Dimensions) -> Option<Point> {
        self.candidates(at).find(|&p| {
            self.can_place_at(p, dims, Layer::Surface)
                && self.can_place_at(p, dims, Layer::Underground)
        })
    }

    /// Ring search for an anchor whose footprint touches water.
    pub fn find_free_near_water(
        &self,
        layer: Layer,
        at: Point,
        dims: Dimensions,
        terrain: &TerrainGrid,
    ) -> Option<Point> {
        self.candidates(at).find(|&p| {
            self.can_place_at(p, dims, layer) && terrain.would_be_touching_water(p, dims, layer)
        })
    }

    /// Whether a building of the same type is anchored within the search ring.
    pub fn already_exists_in_proximity(&self, building: &Building, layer: Layer) -> bool {
        self.candidates(building.at).any(|p| {
            self.building_at(p, layer)
                .is_some_and(|placed| placed.building_type == building.building_type)
        })
    }

    // ── Placement ───────────────────────────────────────────────────────

    /// Place a gate-like building at identical coordinates on both layers.
    pub fn place_building_at_both_levels(
        &mut self,
        mut building: Building,
    ) -> Result<Point, PlacementFailure> {
        if self.building_at(building.at, Layer::Surface) == Some(&building) {
            log::debug!("The same building at {:?} already exists", building.at);
            return Ok(building.at);
        }
        let at = self
            .find_connected_free_space(building.at, building.dimensions())
            .ok_or(PlacementFailure::NoFreeSpace)?;
        building.at = at;
        self.store(Layer::Surface, MapObject::Building(building.clone()));
        self.store(Layer::Underground, MapObject::Building(building));
        Ok(at)
    }

    /// Place a town inside its zone, keeping an approach row free below it.
    pub fn place_town(
        &mut self,
        zone: &ZoneFootprint,
        mut town: Town,
    ) -> Result<Point, PlacementFailure> {
        let (w, h) = town.dimensions();
        // one row taller so the tile in front of the entrance is free too
        let at = self
            .find_free_space_for_level(zone, town.at, (w, h + 1))
            .ok_or(PlacementFailure::NoFreeSpace)?;
        town.at = at.offset(0, -1);
        let anchor = town.at;
        self.store(zone.layer(), MapObject::Town(town));
        Ok(anchor)
    }

    pub fn place_building(
        &mut self,
        zone: &ZoneFootprint,
        mut building: Building,
    ) -> Result<Point, PlacementFailure> {
        let layer = zone.layer();
        if self.building_at(building.at, layer) == Some(&building) {
            log::debug!("The same building at {:?} already exists", building.at);
            return Ok(building.at);
        }
        let at = self
            .find_free_space_for_level(zone, building.at, building.dimensions())
            .ok_or(PlacementFailure::NoFreeSpace)?;
        building.at = at;
        self.store(layer, MapObject::Building(building));
        Ok(at)
    }

    pub fn place_building_near_water(
        &mut self,
        layer: Layer,
        mut building: Building,
        terrain: &TerrainGrid,
    ) -> Result<Point, PlacementFailure> {
        let at = self
            .find_free_near_water(layer, building.at, building.dimensions(), terrain)
            .ok_or(PlacementFailure::NoFreeSpace)?;
        building.at = at;
        self.store(layer, MapObject::Building(building));
        Ok(at)
    }

    pub fn place_obstacle(
        &mut self,
        zone: &ZoneFootprint,
        mut obstacle: Obstacle,
    ) -> Result<Point, PlacementFailure> {
        let at = self
            .find_free_space_for_level(zone, obstacle.starting_point, obstacle.dimensions())
            .ok_or(PlacementFailure::NoFreeSpace)?;
        obstacle.starting_point = at;
        self.store(zone.layer(), MapObject::Obstacle(obstacle));
        Ok(at)
    }

    /// Place an obstacle at its exact anchor, ignoring `placeable`.
    ///
    /// The footprint must still be in bounds and unclaimed, so forced
    /// clutter never overlaps another object.
    pub fn force_place_obstacle(
        &mut self,
        layer: Layer,
        obstacle: Obstacle,
    ) -> Result<Point, PlacementFailure> {
        let at = obstacle.starting_point;
        let free = at
            .footprint(obstacle.dimensions())
            .all(|p| self.in_bounds(p) && !self.is_occupied(p, layer));
        if !free {
            return Err(PlacementFailure::Blocked);
        }
        self.store(layer, MapObject::Obstacle(obstacle));
        Ok(at)
    }

    /// Claim the footprint, reserve the approach tiles and keep the object.
    fn store(&mut self, layer: Layer, object: MapObject) {
        let anchor = object.anchor();
        debug_assert!(self.in_bounds(anchor), "storing object outside grid at {anchor:?}");
        for p in object.tiles() {
            if let Some(idx) = self.index(p) {
                self.layer_mut(layer).occupied[idx] = true;
            }
        }
        for p in object.reserved_tiles() {
            self.set_unplaceable(p, layer);
        }
        log::debug!("Placing {:?} at {:?} {:?}", object.kind(), anchor, layer);
        if let Some(idx) = self.index(anchor) {
            self.layer_mut(layer).objects[idx] = Some(object);
        }
    }
}
