//! Terrain grid — per-layer terrain, presence, road and river overlays.
//!
//! Storage is a fixed `width × height` array per layer. A tile that was never
//! painted reads back as the layer's void terrain, but stays distinguishable
//! from an explicitly painted void tile through [`TerrainGrid::is_painted`].
//!
//! Painting is first-writer-wins: once a tile holds terrain, a later
//! [`TerrainGrid::set_tile`] leaves it untouched and reports the conflict.

use crate::constants::ADJACENT;
use crate::model::{Dimensions, Layer, Point, RiverType, RoadType, TerrainType};

/// Outcome of a single terrain write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileWrite {
    Painted,
    /// The tile already held terrain; the write was dropped.
    AlreadyPainted(TerrainType),
    OutOfBounds,
}

#[derive(Debug, Clone)]
struct TerrainLayer {
    /// `None` means never painted.
    terrain: Vec<Option<TerrainType>>,
    roads: Vec<Option<RoadType>>,
    rivers: Vec<Option<RiverType>>,
}

impl TerrainLayer {
    fn new(len: usize) -> Self {
        Self {
            terrain: vec![None; len],
            roads: vec![None; len],
            rivers: vec![None; len],
        }
    }
}

/// Terrain of both layers of one map.
#[derive(Debug, Clone)]
pub struct TerrainGrid {
    width: i32,
    height: i32,
    layers: [TerrainLayer; 2],
}

impl TerrainGrid {
    pub fn new(dimensions: Dimensions) -> Self {
        let (width, height) = dimensions;
        let len = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            layers: [TerrainLayer::new(len), TerrainLayer::new(len)],
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        (self.width, self.height)
    }

    pub fn in_bounds(&self, p: Point) -> bool {
        p.x >= 0 && p.x < self.width && p.y >= 0 && p.y < self.height
    }

    fn index(&self, p: Point) -> Option<usize> {
        self.in_bounds(p)
            .then(|| (p.x * self.height + p.y) as usize)
    }

    fn layer(&self, layer: Layer) -> &TerrainLayer {
        &self.layers[layer.level()]
    }

    fn layer_mut(&mut self, layer: Layer) -> &mut TerrainLayer {
        &mut self.layers[layer.level()]
    }

    /// Paint `tile` at `p` unless the tile already holds terrain.
    pub fn set_tile(&mut self, p: Point, layer: Layer, tile: TerrainType) -> TileWrite {
        let Some(idx) = self.index(p) else {
            log::warn!("Tile {:?} is not in boundaries", p);
            return TileWrite::OutOfBounds;
        };
        let slot = &mut self.layer_mut(layer).terrain[idx];
        match *slot {
            Some(existing) => TileWrite::AlreadyPainted(existing),
            None => {
                *slot = Some(tile);
                TileWrite::Painted
            }
        }
    }

    /// Terrain at `p`, or the layer's void terrain if never painted.
    ///
    /// # Panics
    ///
    /// Panics if `p` is outside the map; callers check bounds first.
    pub fn get_tile(&self, p: Point, layer: Layer) -> TerrainType {
        match self.index(p) {
            Some(idx) => self.layer(layer).terrain[idx].unwrap_or(layer.void_terrain()),
            None => panic!(
                "terrain read at {:?} outside {}x{} grid",
                p, self.width, self.height
            ),
        }
    }

    /// Presence query: was this tile explicitly painted by some zone?
    pub fn is_painted(&self, p: Point, layer: Layer) -> bool {
        self.index(p)
            .is_some_and(|idx| self.layer(layer).terrain[idx].is_some())
    }

    /// Whether an overlay may sit on `p`: painted, and not void.
    fn accepts_overlay(&self, p: Point, layer: Layer, what: &str) -> Option<usize> {
        let Some(idx) = self.index(p) else {
            log::warn!("{} at {:?} is not in boundaries", what, p);
            return None;
        };
        match self.layer(layer).terrain[idx] {
            None => {
                log::warn!("Can't place {} at {:?} {:?} on a tile without terrain", what, p, layer);
                None
            }
            Some(t) if t == layer.void_terrain() => {
                log::debug!("Can't place {} at {:?} {:?} on {:?}", what, p, layer, t);
                None
            }
            Some(_) => Some(idx),
        }
    }

    /// Stamp a road overlay; no-op on unpainted, void or out-of-bounds tiles.
    pub fn set_road(&mut self, p: Point, layer: Layer, road: RoadType) -> bool {
        match self.accepts_overlay(p, layer, "road") {
            Some(idx) => {
                log::debug!("Setting road at {:?} {:?} to {:?}", p, layer, road);
                self.layer_mut(layer).roads[idx] = Some(road);
                true
            }
            None => false,
        }
    }

    /// Stamp a river overlay; same rules as [`TerrainGrid::set_road`].
    pub fn set_river(&mut self, p: Point, layer: Layer, river: RiverType) -> bool {
        match self.accepts_overlay(p, layer, "river") {
            Some(idx) => {
                log::debug!("Setting river at {:?} {:?} to {:?}", p, layer, river);
                self.layer_mut(layer).rivers[idx] = Some(river);
                true
            }
            None => false,
        }
    }

    pub fn road_at(&self, p: Point, layer: Layer) -> Option<RoadType> {
        self.index(p).and_then(|idx| self.layer(layer).roads[idx])
    }

    pub fn river_at(&self, p: Point, layer: Layer) -> Option<RiverType> {
        self.index(p).and_then(|idx| self.layer(layer).rivers[idx])
    }

    /// Passability predicate for the path builder: painted tiles only.
    pub fn passable(&self, layer: Layer) -> impl Fn(Point) -> bool + '_ {
        move |p| self.is_painted(p, layer)
    }

    /// Nearest road within `proximity` Manhattan steps of `at`, scanning
    /// rings outward in a fixed order.
    pub fn road_closest_to(
        &self,
        at: Point,
        layer: Layer,
        proximity: i32,
    ) -> Option<(Point, RoadType)> {
        for distance in 1..=proximity {
            for dx in -distance..=distance {
                for dy in -distance..=distance {
                    if dx.abs() + dy.abs() != distance {
                        continue;
                    }
                    let candidate = at.offset(dx, dy);
                    if let Some(road) = self.road_at(candidate, layer) {
                        return Some((candidate, road));
                    }
                }
            }
        }
        None
    }

    /// Whether a footprint anchored at `anchor` would touch water: any of its
    /// four corners has a Water tile in its 8-neighbourhood.
    pub fn would_be_touching_water(&self, anchor: Point, dims: Dimensions, layer: Layer) -> bool {
        let (w, h) = dims;
        let corners = [
            anchor,
            anchor.offset(-(w - 1), 0),
            anchor.offset(0, -(h - 1)),
            anchor.offset(-(w - 1), -(h - 1)),
        ];
        for corner in corners {
            for (dx, dy) in ADJACENT {
                let neighbour = corner.offset(dx, dy);
                if !self.in_bounds(neighbour) {
                    continue;
                }
                if self.get_tile(neighbour, layer) == TerrainType::Water {
                    log::debug!("Would be touching water at {:?}", neighbour);
                    return true;
                }
            }
        }
        false
    }

    /// Reclassify isolated surface water.
    ///
    /// A painted Water tile with no Water among its in-bounds 8-neighbours
    /// takes the most common terrain of its painted neighbours (ties go to
    /// the first in scan order). Decisions are made against the grid as it
    /// was before the pass, so running it twice changes nothing more.
    ///
    /// Returns the reclassified tiles.
    pub fn remove_useless_water(&mut self) -> Vec<Point> {
        let layer = Layer::Surface;
        let mut changes: Vec<(Point, TerrainType)> = Vec::new();

        for x in 0..self.width {
            for y in 0..self.height {
                let p = Point::new(x, y);
                if !self.is_painted(p, layer) || self.get_tile(p, layer) != TerrainType::Water {
                    continue;
                }

                let mut touches_water = false;
                let mut votes: Vec<(TerrainType, usize)> = Vec::new();
                for (dx, dy) in ADJACENT {
                    let neighbour = p.offset(dx, dy);
                    if !self.in_bounds(neighbour) {
                        continue;
                    }
                    let terrain = self.get_tile(neighbour, layer);
                    if terrain == TerrainType::Water {
                        touches_water = true;
                        break;
                    }
                    if !self.is_painted(neighbour, layer) {
                        continue;
                    }
                    match votes.iter_mut().find(|(t, _)| *t == terrain) {
                        Some((_, count)) => *count += 1,
                        None => votes.push((terrain, 1)),
                    }
                }
                if touches_water {
                    continue;
                }

                // max_by_key keeps the last maximum; fold keeps the first.
                let winner = votes
                    .iter()
                    .fold(None::<(TerrainType, usize)>, |best, &(t, n)| match best {
                        Some((_, best_n)) if best_n >= n => best,
                        _ => Some((t, n)),
                    });
                if let Some((terrain, _)) = winner {
                    changes.push((p, terrain));
                }
            }
        }

        for &(p, terrain) in &changes {
            log::debug!("Forced tile at {:?} to be {:?}", p, terrain);
            if let Some(idx) = self.index(p) {
                self.layer_mut(layer).terrain[idx] = Some(terrain);
            }
        }
        if !changes.is_empty() {
            log::info!("Reclassified {} isolated water tiles", changes.len());
        }
        changes.into_iter().map(|(p, _)| p).collect()
    }
}
