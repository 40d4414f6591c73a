//! Map constants — neighbour offsets, footprint sizes, search defaults.
//!
//! Plain constants with no grid dependency. Both the materializer and the
//! simtest harness use these.

/// 8-neighbourhood offsets, in the fixed scan order every ring check uses.
pub const ADJACENT: [(i32, i32); 8] = [
    (-1, 1),
    (0, 1),
    (0, -1),
    (1, 0),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, -1),
];

/// 4-directional moves for path search, in expansion order.
pub const ORTHOGONAL: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

pub mod search {
    /// Chebyshev radius cap for ring-search placement.
    pub const SEARCH_RADIUS: i32 = 5;
    /// Manhattan distance from an unreachable goal still accepted as "close enough".
    pub const ACCEPTABLE_ERROR: i32 = 5;
    /// Manhattan radius scanned for an existing road when snapping structures.
    pub const ROAD_SNAP_PROXIMITY: i32 = 5;
}

pub mod limits {
    pub const MIN_ZONE_SHAPES: usize = 4;
    pub const MAX_OBSTACLE_WIDTH: i32 = 8;
    pub const MAX_OBSTACLE_HEIGHT: i32 = 6;
}

pub mod footprints {
    // Buildings are a bit bigger than their sprites so neighbours never touch.
    pub const SUBTERRANEAN_GATE: (i32, i32) = (3, 3);
    pub const SAWMILL: (i32, i32) = (4, 3);
    pub const ORE_PIT: (i32, i32) = (3, 3);
    pub const SULFUR_DUNE: (i32, i32) = (3, 1);
    pub const ALCHEMISTS_LAB: (i32, i32) = (3, 1);
    pub const GEM_POND: (i32, i32) = (3, 2);
    pub const GOLD_MINE: (i32, i32) = (3, 1);
    pub const ABANDONED_MINE: (i32, i32) = (3, 1);
    pub const CRYSTAL_CAVERN: (i32, i32) = (3, 2);
    pub const SINGLE_TILE: (i32, i32) = (1, 1);
    pub const TOWN: (i32, i32) = (5, 3);
}
