//! Core map vocabulary — coordinates, layers, terrain and object types.
//!
//! Every footprint entity is anchored at the **bottom-right** corner of its
//! bounding box: a `w×h` object anchored at `(x, y)` covers
//! `[x-w+1, x] × [y-h+1, y]`.

use serde::{Deserialize, Serialize};

use crate::constants::footprints;

/// Width and height of a footprint, in tiles.
pub type Dimensions = (i32, i32);

/// A tile coordinate. Signed so offsets can step past the map edge;
/// anything negative is simply out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub const fn manhattan(self, other: Point) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Every tile covered by a `dims` footprint anchored at this point.
    pub fn footprint(self, dims: Dimensions) -> impl Iterator<Item = Point> {
        let (w, h) = dims;
        (0..w).flat_map(move |dx| (0..h).map(move |dy| Point::new(self.x - dx, self.y - dy)))
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// One of the map's two parallel grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Surface,
    Underground,
}

impl Layer {
    pub const ALL: [Layer; 2] = [Layer::Surface, Layer::Underground];

    /// Default, placement-blocking terrain for this layer.
    pub const fn void_terrain(self) -> TerrainType {
        match self {
            Layer::Surface => TerrainType::Water,
            Layer::Underground => TerrainType::Rock,
        }
    }

    /// Level index as the map codec numbers it (z coordinate).
    pub const fn level(self) -> usize {
        match self {
            Layer::Surface => 0,
            Layer::Underground => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainType {
    Grass,
    Dirt,
    Sand,
    Snow,
    Swamp,
    Rough,
    Subterranean,
    Lava,
    Water,
    Rock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadType {
    Dirt,
    Gravel,
    Cobblestone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiverType {
    Clear,
    Icy,
    Muddy,
    Lava,
}

/// Map size class requested by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapSize {
    S,
    M,
    L,
    #[serde(rename = "XL")]
    Xl,
}

impl MapSize {
    pub const fn dimensions(self) -> Dimensions {
        match self {
            MapSize::S => (36, 36),
            MapSize::M => (72, 72),
            MapSize::L => (108, 108),
            MapSize::Xl => (144, 144),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
    // mines
    Sawmill,
    OrePit,
    AlchemistsLab,
    SulfurDune,
    CrystalCavern,
    GemPond,
    GoldMine,
    AbandonedMine,
    // transport
    SubterraneanGate,
    Boat,
    Shipyard,
}

impl BuildingType {
    pub const fn dimensions(self) -> Dimensions {
        match self {
            BuildingType::SubterraneanGate => footprints::SUBTERRANEAN_GATE,
            BuildingType::Sawmill => footprints::SAWMILL,
            BuildingType::OrePit => footprints::ORE_PIT,
            BuildingType::SulfurDune => footprints::SULFUR_DUNE,
            BuildingType::AlchemistsLab => footprints::ALCHEMISTS_LAB,
            BuildingType::GemPond => footprints::GEM_POND,
            BuildingType::GoldMine => footprints::GOLD_MINE,
            BuildingType::AbandonedMine => footprints::ABANDONED_MINE,
            BuildingType::CrystalCavern => footprints::CRYSTAL_CAVERN,
            BuildingType::Boat | BuildingType::Shipyard => footprints::SINGLE_TILE,
        }
    }

    /// Docks must touch water and never go underground.
    pub const fn is_dock(self) -> bool {
        matches!(self, BuildingType::Boat | BuildingType::Shipyard)
    }

    /// Structures that get a road snapped to their entrance.
    pub const fn has_entrance(self) -> bool {
        matches!(self, BuildingType::SubterraneanGate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TownType {
    Castle,
    Rampart,
    Tower,
    Inferno,
    Necropolis,
    Dungeon,
    Stronghold,
    Fortress,
    Random,
}

impl TownType {
    pub const fn dimensions(self) -> Dimensions {
        footprints::TOWN
    }
}

/// Tile directly below the bottom-centre of a footprint: the visitable side.
fn approach_tile(at: Point, dims: Dimensions) -> Point {
    Point::new(at.x - dims.0 / 2, at.y + 1)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    /// Bottom-right corner.
    pub at: Point,
    pub building_type: BuildingType,
    /// Owning player index, `< players`.
    #[serde(default)]
    pub owner: Option<u32>,
}

impl Building {
    pub fn new(at: Point, building_type: BuildingType, owner: Option<u32>) -> Self {
        Self {
            at,
            building_type,
            owner,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        self.building_type.dimensions()
    }

    pub fn entrance(&self) -> Point {
        approach_tile(self.at, self.dimensions())
    }

    /// Tiles kept clear of other objects once this building stands.
    pub fn reserved_tiles(&self) -> Vec<Point> {
        vec![self.entrance()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Town {
    /// Bottom-right corner.
    pub at: Point,
    pub town_type: TownType,
    #[serde(default)]
    pub owner: Option<u32>,
}

impl Town {
    pub fn new(at: Point, town_type: TownType, owner: Option<u32>) -> Self {
        Self {
            at,
            town_type,
            owner,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        self.town_type.dimensions()
    }

    pub fn entrance(&self) -> Point {
        approach_tile(self.at, self.dimensions())
    }

    pub fn reserved_tiles(&self) -> Vec<Point> {
        vec![self.entrance()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Bottom-right corner.
    pub starting_point: Point,
    pub width: i32,
    pub height: i32,
}

impl Obstacle {
    pub fn new(starting_point: Point, width: i32, height: i32) -> Self {
        Self {
            starting_point,
            width,
            height,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        (self.width, self.height)
    }
}

/// Anything that claims a footprint on the object grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MapObject {
    Building(Building),
    Town(Town),
    Obstacle(Obstacle),
}

impl MapObject {
    pub fn anchor(&self) -> Point {
        match self {
            MapObject::Building(b) => b.at,
            MapObject::Town(t) => t.at,
            MapObject::Obstacle(o) => o.starting_point,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        match self {
            MapObject::Building(b) => b.dimensions(),
            MapObject::Town(t) => t.dimensions(),
            MapObject::Obstacle(o) => o.dimensions(),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            MapObject::Building(_) => ObjectKind::Building,
            MapObject::Town(_) => ObjectKind::Town,
            MapObject::Obstacle(_) => ObjectKind::Obstacle,
        }
    }

    pub fn reserved_tiles(&self) -> Vec<Point> {
        match self {
            MapObject::Building(b) => b.reserved_tiles(),
            MapObject::Town(t) => t.reserved_tiles(),
            MapObject::Obstacle(_) => Vec::new(),
        }
    }

    /// Tiles claimed by this object's bounding box.
    pub fn tiles(&self) -> impl Iterator<Item = Point> {
        self.anchor().footprint(self.dimensions())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Building,
    Town,
    Obstacle,
}
