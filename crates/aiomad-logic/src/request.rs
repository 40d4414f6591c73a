//! Map request — the planner's declarative output and its validation.
//!
//! A [`CreateMapRequest`] names the map size, the players and a list of
//! [`Zone`]s, each a union of shapes carrying terrain and object requests.
//! Malformed requests are rejected here, before any grid is built:
//! [`CreateMapRequest::validate`] returns every problem found, and
//! [`CreateMapRequest::from_json`] parses then validates.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{limits, ADJACENT};
use crate::model::{
    Building, Dimensions, Layer, MapSize, Obstacle, Point, RiverType, RoadType, TerrainType, Town,
};
use crate::shapes::{union_tiles, Shape};

/// Waypoints of a road or river, joined by path search at materialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoints {
    pub path: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Road {
    pub path: Waypoints,
    pub road_type: RoadType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct River {
    pub path: Waypoints,
    pub river_type: RiverType,
}

/// A named region: union of shapes plus what should stand inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub location: Layer,
    pub terrain: TerrainType,
    pub shape: Vec<Shape>,
    /// Bottom-right corner of a subterranean gate linking this zone to the other layer.
    #[serde(default)]
    pub underground_entrance: Option<Point>,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    #[serde(default)]
    pub buildings: Vec<Building>,
    #[serde(default)]
    pub towns: Vec<Town>,
    #[serde(default)]
    pub roads: Vec<Road>,
    #[serde(default)]
    pub rivers: Vec<River>,
    #[serde(default)]
    pub is_starting_player_area: bool,
}

impl Zone {
    /// Deduplicated union of every shape's tiles, in insertion order.
    pub fn all_tiles(&self) -> Vec<Point> {
        union_tiles(&self.shape)
    }

    /// The zone's tiles dilated by one ring of 8-neighbours, clipped to
    /// non-negative coordinates.
    pub fn expanded_perimeter(&self) -> Vec<Point> {
        let mut seen = HashSet::new();
        let mut tiles = Vec::new();
        for tile in self.all_tiles() {
            let ring = std::iter::once(tile)
                .chain(ADJACENT.iter().map(|&(dx, dy)| tile.offset(dx, dy)));
            for p in ring {
                if p.x >= 0 && p.y >= 0 && seen.insert(p) {
                    tiles.push(p);
                }
            }
        }
        tiles
    }

    pub fn footprint(&self) -> ZoneFootprint {
        ZoneFootprint::new(self.location, self.all_tiles())
    }
}

/// A zone's rasterized tile set, with O(1) containment checks.
#[derive(Debug, Clone)]
pub struct ZoneFootprint {
    layer: Layer,
    tiles: Vec<Point>,
    tile_set: HashSet<Point>,
}

impl ZoneFootprint {
    pub fn new(layer: Layer, tiles: Vec<Point>) -> Self {
        let tile_set = tiles.iter().copied().collect();
        Self {
            layer,
            tiles,
            tile_set,
        }
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn tiles(&self) -> &[Point] {
        &self.tiles
    }

    pub fn contains(&self, p: Point) -> bool {
        self.tile_set.contains(&p)
    }

    /// Whether every tile of a `dims` footprint anchored at `anchor` lies in the zone.
    pub fn contains_footprint(&self, anchor: Point, dims: Dimensions) -> bool {
        anchor.footprint(dims).all(|p| self.contains(p))
    }
}

/// Clutter placed outside any zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutsideSpec {
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
}

/// Everything the planner decided about one map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMapRequest {
    pub size: MapSize,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub players: u32,
    pub has_underground: bool,
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub non_zonal_surface_spec: OutsideSpec,
    #[serde(default)]
    pub non_zonal_underground_spec: OutsideSpec,
}

/// A reason a request is rejected before generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The document is not valid JSON for this schema.
    Parse(String),
    NoPlayers,
    EmptyZoneId,
    DuplicateZoneId(String),
    /// Zone has fewer than the minimum number of shapes.
    TooFewShapes { zone: String, count: usize },
    NegativeCoordinate { zone: String, what: &'static str },
    /// A coordinate or shape extent past the map edge; `None` for non-zonal clutter.
    OutsideMap {
        zone: Option<String>,
        what: &'static str,
    },
    /// Shape with non-positive size, radius, amplitude or frequency.
    DegenerateShape { zone: String, kind: &'static str },
    CollinearTriangle { zone: String },
    EmptyPath { zone: String },
    ObstacleSize {
        zone: Option<String>,
        width: i32,
        height: i32,
    },
    OwnerOutOfRange {
        zone: String,
        owner: u32,
        players: u32,
    },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Parse(msg) => write!(f, "request is not valid: {msg}"),
            RequestError::NoPlayers => write!(f, "a map needs at least one player"),
            RequestError::EmptyZoneId => write!(f, "zone id is empty"),
            RequestError::DuplicateZoneId(id) => write!(f, "zone id '{id}' is used twice"),
            RequestError::TooFewShapes { zone, count } => write!(
                f,
                "zone '{zone}' has {count} shapes, needs at least {}",
                limits::MIN_ZONE_SHAPES
            ),
            RequestError::NegativeCoordinate { zone, what } => {
                write!(f, "zone '{zone}' has a negative coordinate in {what}")
            }
            RequestError::OutsideMap { zone, what } => write!(
                f,
                "{what} in {} lies outside the map",
                zone.as_deref()
                    .map_or("non-zonal area".to_string(), |z| format!("zone '{z}'"))
            ),
            RequestError::DegenerateShape { zone, kind } => {
                write!(f, "zone '{zone}' has a degenerate {kind}")
            }
            RequestError::CollinearTriangle { zone } => {
                write!(f, "zone '{zone}' has a triangle with collinear vertices")
            }
            RequestError::EmptyPath { zone } => {
                write!(f, "zone '{zone}' has a path with no waypoints")
            }
            RequestError::ObstacleSize {
                zone,
                width,
                height,
            } => write!(
                f,
                "obstacle {width}x{height} in {} is outside 1..={}x1..={}",
                zone.as_deref().unwrap_or("non-zonal area"),
                limits::MAX_OBSTACLE_WIDTH,
                limits::MAX_OBSTACLE_HEIGHT
            ),
            RequestError::OwnerOutOfRange {
                zone,
                owner,
                players,
            } => write!(
                f,
                "zone '{zone}' assigns owner {owner} but the map has {players} players"
            ),
        }
    }
}

impl std::error::Error for RequestError {}

impl CreateMapRequest {
    /// Parse a planner document and validate it.
    pub fn from_json(json: &str) -> Result<Self, Vec<RequestError>> {
        let request: CreateMapRequest =
            serde_json::from_str(json).map_err(|e| vec![RequestError::Parse(e.to_string())])?;
        let errors = request.validate();
        if errors.is_empty() {
            Ok(request)
        } else {
            Err(errors)
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        self.size.dimensions()
    }

    /// Validate the request, returning all errors found.
    pub fn validate(&self) -> Vec<RequestError> {
        let mut errors = Vec::new();

        if self.players == 0 {
            errors.push(RequestError::NoPlayers);
        }

        let mut ids = HashSet::new();
        for zone in &self.zones {
            if zone.id.trim().is_empty() {
                errors.push(RequestError::EmptyZoneId);
            } else if !ids.insert(zone.id.as_str()) {
                errors.push(RequestError::DuplicateZoneId(zone.id.clone()));
            }
            validate_zone(zone, self.players, self.dimensions(), &mut errors);
        }

        for obstacle in self
            .non_zonal_surface_spec
            .obstacles
            .iter()
            .chain(&self.non_zonal_underground_spec.obstacles)
        {
            if !inside(obstacle.starting_point, self.dimensions()) {
                errors.push(RequestError::OutsideMap {
                    zone: None,
                    what: "obstacle",
                });
            }
            if !obstacle_size_ok(obstacle) {
                errors.push(RequestError::ObstacleSize {
                    zone: None,
                    width: obstacle.width,
                    height: obstacle.height,
                });
            }
        }

        errors
    }
}

fn obstacle_size_ok(obstacle: &Obstacle) -> bool {
    (1..=limits::MAX_OBSTACLE_WIDTH).contains(&obstacle.width)
        && (1..=limits::MAX_OBSTACLE_HEIGHT).contains(&obstacle.height)
}

fn negative(p: Point) -> bool {
    p.x < 0 || p.y < 0
}

fn inside(p: Point, dimensions: Dimensions) -> bool {
    !negative(p) && p.x < dimensions.0 && p.y < dimensions.1
}

/// Anchors and waypoints must sit on the map.
fn check_anchor(
    zone: &Zone,
    at: Point,
    what: &'static str,
    dimensions: Dimensions,
    errors: &mut Vec<RequestError>,
) {
    if negative(at) {
        errors.push(RequestError::NegativeCoordinate {
            zone: zone.id.clone(),
            what,
        });
    } else if !inside(at, dimensions) {
        errors.push(RequestError::OutsideMap {
            zone: Some(zone.id.clone()),
            what,
        });
    }
}

fn validate_zone(
    zone: &Zone,
    players: u32,
    dimensions: Dimensions,
    errors: &mut Vec<RequestError>,
) {
    let id = || zone.id.clone();

    if zone.shape.len() < limits::MIN_ZONE_SHAPES {
        errors.push(RequestError::TooFewShapes {
            zone: id(),
            count: zone.shape.len(),
        });
    }

    for shape in &zone.shape {
        let kind = shape.kind_name();
        let (anchors, sizes_ok): (Vec<Point>, bool) = match *shape {
            Shape::Rect { x, y, w, h } => (vec![Point::new(x, y)], w >= 1 && h >= 1),
            Shape::Circle { cx, cy, r } => (vec![Point::new(cx, cy)], r >= 1),
            Shape::Oval { cx, cy, rx, ry } => (vec![Point::new(cx, cy)], rx >= 1 && ry >= 1),
            Shape::Triangle {
                x1,
                y1,
                x2,
                y2,
                x3,
                y3,
            } => {
                let cross = (x2 - x1) * (y3 - y1) - (y2 - y1) * (x3 - x1);
                if cross == 0 {
                    errors.push(RequestError::CollinearTriangle { zone: id() });
                }
                (
                    vec![Point::new(x1, y1), Point::new(x2, y2), Point::new(x3, y3)],
                    true,
                )
            }
            Shape::Zigzag {
                start_x,
                start_y,
                end_x,
                end_y,
                amplitude,
                frequency,
            } => (
                vec![Point::new(start_x, start_y), Point::new(end_x, end_y)],
                amplitude >= 1 && frequency >= 1,
            ),
            Shape::Point { x, y } => (vec![Point::new(x, y)], true),
            Shape::Path { ref path } => {
                if path.is_empty() {
                    errors.push(RequestError::EmptyPath { zone: id() });
                }
                (path.clone(), true)
            }
        };
        if anchors.into_iter().any(negative) {
            errors.push(RequestError::NegativeCoordinate {
                zone: id(),
                what: kind,
            });
        } else if shape.extent().is_some_and(|e| !e.fits_within(dimensions)) {
            errors.push(RequestError::OutsideMap {
                zone: Some(id()),
                what: kind,
            });
        }
        if !sizes_ok {
            errors.push(RequestError::DegenerateShape { zone: id(), kind });
        }
    }

    if let Some(at) = zone.underground_entrance {
        check_anchor(zone, at, "underground entrance", dimensions, errors);
    }

    for obstacle in &zone.obstacles {
        check_anchor(zone, obstacle.starting_point, "obstacle", dimensions, errors);
        if !obstacle_size_ok(obstacle) {
            errors.push(RequestError::ObstacleSize {
                zone: Some(id()),
                width: obstacle.width,
                height: obstacle.height,
            });
        }
    }

    let owners = zone
        .buildings
        .iter()
        .map(|b| (b.at, b.owner, "building"))
        .chain(zone.towns.iter().map(|t| (t.at, t.owner, "town")));
    for (at, owner, what) in owners {
        check_anchor(zone, at, what, dimensions, errors);
        if let Some(owner) = owner.filter(|&o| o >= players) {
            errors.push(RequestError::OwnerOutOfRange {
                zone: id(),
                owner,
                players,
            });
        }
    }

    let waypoints = zone
        .roads
        .iter()
        .map(|r| (&r.path, "road"))
        .chain(zone.rivers.iter().map(|r| (&r.path, "river")));
    for (path, what) in waypoints {
        if let Some(&at) = path.path.iter().find(|&&p| !inside(p, dimensions)) {
            check_anchor(zone, at, what, dimensions, errors);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BuildingType, TownType};

    fn square_zone(id: &str, x: i32, y: i32, size: i32) -> Zone {
        let half = size / 2;
        Zone {
            id: id.to_string(),
            location: Layer::Surface,
            terrain: TerrainType::Grass,
            shape: vec![
                Shape::Rect {
                    x,
                    y,
                    w: half,
                    h: half,
                },
                Shape::Rect {
                    x: x + half,
                    y,
                    w: size - half,
                    h: half,
                },
                Shape::Rect {
                    x,
                    y: y + half,
                    w: half,
                    h: size - half,
                },
                Shape::Rect {
                    x: x + half,
                    y: y + half,
                    w: size - half,
                    h: size - half,
                },
            ],
            underground_entrance: None,
            obstacles: vec![],
            buildings: vec![],
            towns: vec![],
            roads: vec![],
            rivers: vec![],
            is_starting_player_area: false,
        }
    }

    fn request(zones: Vec<Zone>) -> CreateMapRequest {
        CreateMapRequest {
            size: MapSize::S,
            title: "Test".into(),
            description: String::new(),
            players: 2,
            has_underground: false,
            zones,
            non_zonal_surface_spec: OutsideSpec::default(),
            non_zonal_underground_spec: OutsideSpec::default(),
        }
    }

    #[test]
    fn valid_request_has_no_errors() {
        let req = request(vec![square_zone("a", 0, 0, 10), square_zone("b", 10, 0, 10)]);
        let errors = req.validate();
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }

    #[test]
    fn zone_tiles_are_union_of_shapes() {
        let zone = square_zone("a", 0, 0, 10);
        let tiles = zone.all_tiles();
        assert_eq!(tiles.len(), 100);
        assert_eq!(tiles.iter().collect::<HashSet<_>>().len(), 100);
    }

    #[test]
    fn too_few_shapes() {
        let mut zone = square_zone("a", 0, 0, 10);
        zone.shape.truncate(3);
        let errors = request(vec![zone]).validate();
        assert!(errors.contains(&RequestError::TooFewShapes {
            zone: "a".into(),
            count: 3
        }));
    }

    #[test]
    fn duplicate_zone_ids() {
        let errors =
            request(vec![square_zone("a", 0, 0, 8), square_zone("a", 8, 0, 8)]).validate();
        assert!(errors.contains(&RequestError::DuplicateZoneId("a".into())));
    }

    #[test]
    fn degenerate_shapes() {
        let mut zone = square_zone("a", 0, 0, 10);
        zone.shape.push(Shape::Rect {
            x: 0,
            y: 0,
            w: 0,
            h: 3,
        });
        zone.shape.push(Shape::Circle { cx: 5, cy: 5, r: 0 });
        zone.shape.push(Shape::Triangle {
            x1: 0,
            y1: 0,
            x2: 1,
            y2: 1,
            x3: 2,
            y3: 2,
        });
        let errors = request(vec![zone]).validate();
        assert!(errors.contains(&RequestError::DegenerateShape {
            zone: "a".into(),
            kind: "rect"
        }));
        assert!(errors.contains(&RequestError::DegenerateShape {
            zone: "a".into(),
            kind: "circle"
        }));
        assert!(errors.contains(&RequestError::CollinearTriangle { zone: "a".into() }));
    }

    #[test]
    fn negative_coordinates_rejected() {
        let mut zone = square_zone("a", 0, 0, 10);
        zone.shape.push(Shape::Point { x: -1, y: 3 });
        let errors = request(vec![zone]).validate();
        assert!(errors.contains(&RequestError::NegativeCoordinate {
            zone: "a".into(),
            what: "point"
        }));
    }

    #[test]
    fn anchors_past_the_map_edge_rejected() {
        let mut zone = square_zone("a", 0, 0, 10);
        zone.obstacles
            .push(Obstacle::new(Point::new(i32::MAX, 3), 1, 1));
        zone.towns.push(Town::new(Point::new(36, 4), TownType::Castle, None));
        zone.underground_entrance = Some(Point::new(5, 36));
        zone.roads.push(Road {
            path: Waypoints {
                path: vec![Point::new(1, 1), Point::new(40, 1)],
            },
            road_type: RoadType::Dirt,
        });
        let mut req = request(vec![zone]);
        req.non_zonal_underground_spec
            .obstacles
            .push(Obstacle::new(Point::new(35, 99), 1, 1));

        let errors = req.validate();
        for what in ["obstacle", "town", "underground entrance", "road"] {
            assert!(
                errors.contains(&RequestError::OutsideMap {
                    zone: Some("a".into()),
                    what
                }),
                "missing {what} in {errors:?}"
            );
        }
        assert!(errors.contains(&RequestError::OutsideMap {
            zone: None,
            what: "obstacle"
        }));
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn shapes_spilling_off_the_map_rejected() {
        let mut zone = square_zone("a", 0, 0, 10);
        zone.shape.push(Shape::Rect {
            x: 1,
            y: 0,
            w: i32::MAX,
            h: 1,
        });
        zone.shape.push(Shape::Circle {
            cx: 2,
            cy: 20,
            r: 3,
        });
        zone.shape.push(Shape::Path {
            path: vec![Point::new(0, 0), Point::new(0, 36)],
        });
        let errors = request(vec![zone]).validate();
        for what in ["rect", "circle", "path"] {
            assert!(errors.contains(&RequestError::OutsideMap {
                zone: Some("a".into()),
                what
            }));
        }
        assert_eq!(errors.len(), 3);

        // flush against the far edge is still on the map
        let mut edge = square_zone("b", 26, 26, 10);
        edge.shape.push(Shape::Oval {
            cx: 31,
            cy: 33,
            rx: 4,
            ry: 2,
        });
        assert!(request(vec![edge]).validate().is_empty());
    }

    #[test]
    fn oversized_request_never_reaches_generation() {
        let json = r#"{
            "size": "S",
            "players": 1,
            "has_underground": false,
            "zones": [{
                "id": "huge",
                "location": "surface",
                "terrain": "grass",
                "shape": [
                    {"kind": "rect", "x": 1, "y": 0, "w": 2147483647, "h": 1},
                    {"kind": "point", "x": 1, "y": 1},
                    {"kind": "point", "x": 2, "y": 2},
                    {"kind": "point", "x": 3, "y": 3}
                ]
            }]
        }"#;
        let errors = CreateMapRequest::from_json(json).unwrap_err();
        assert_eq!(
            errors,
            vec![RequestError::OutsideMap {
                zone: Some("huge".into()),
                what: "rect"
            }]
        );
    }

    #[test]
    fn owner_must_be_a_player() {
        let mut zone = square_zone("a", 0, 0, 10);
        zone.towns.push(Town::new(Point::new(6, 6), TownType::Castle, Some(2)));
        zone.buildings
            .push(Building::new(Point::new(3, 3), BuildingType::GoldMine, Some(1)));
        let errors = request(vec![zone]).validate();
        assert_eq!(
            errors,
            vec![RequestError::OwnerOutOfRange {
                zone: "a".into(),
                owner: 2,
                players: 2
            }]
        );
    }

    #[test]
    fn obstacle_limits() {
        let mut req = request(vec![square_zone("a", 0, 0, 10)]);
        req.non_zonal_surface_spec
            .obstacles
            .push(Obstacle::new(Point::new(3, 3), 9, 1));
        req.zones[0].obstacles.push(Obstacle::new(Point::new(3, 3), 2, 7));
        let errors = req.validate();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn expanded_perimeter_grows_by_one_ring() {
        let mut zone = square_zone("a", 2, 2, 4);
        let grown = zone.expanded_perimeter();
        // 4x4 becomes 6x6
        assert_eq!(grown.len(), 36);

        zone = square_zone("b", 0, 0, 4);
        // clipped at the origin: 5x5
        assert_eq!(zone.expanded_perimeter().len(), 25);
    }

    #[test]
    fn footprint_containment() {
        let fp = square_zone("a", 0, 0, 10).footprint();
        assert!(fp.contains_footprint(Point::new(9, 9), (3, 3)));
        assert!(!fp.contains_footprint(Point::new(1, 1), (3, 3)));
        assert_eq!(fp.layer(), Layer::Surface);
    }

    #[test]
    fn parse_minimal_json() {
        let json = r#"{
            "size": "S",
            "players": 2,
            "has_underground": false,
            "zones": [{
                "id": "start",
                "location": "surface",
                "terrain": "grass",
                "shape": [
                    {"kind": "rect", "x": 0, "y": 0, "w": 5, "h": 5},
                    {"kind": "circle", "cx": 5, "cy": 5, "r": 3},
                    {"kind": "point", "x": 9, "y": 9},
                    {"kind": "path", "path": [{"x": 0, "y": 9}, {"x": 4, "y": 9}]}
                ],
                "towns": [{"at": {"x": 6, "y": 6}, "town_type": "castle", "owner": 0}]
            }]
        }"#;
        let req = CreateMapRequest::from_json(json).unwrap();
        assert_eq!(req.zones.len(), 1);
        assert_eq!(req.zones[0].towns[0].town_type, TownType::Castle);
        assert!(req.non_zonal_surface_spec.obstacles.is_empty());
    }

    #[test]
    fn parse_error_is_reported() {
        let errors = CreateMapRequest::from_json("{\"size\": \"Q\"}").unwrap_err();
        assert!(matches!(errors[0], RequestError::Parse(_)));
    }

    #[test]
    fn errors_render_readably() {
        let err = RequestError::TooFewShapes {
            zone: "lake".into(),
            count: 2,
        };
        assert_eq!(err.to_string(), "zone 'lake' has 2 shapes, needs at least 4");
    }
}
