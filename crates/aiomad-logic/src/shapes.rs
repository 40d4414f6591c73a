//! Shape rasterization — geometric primitives to concrete tile sets.
//!
//! Each [`Shape`] variant enumerates the tiles it covers through a single
//! dispatch, [`Shape::tiles`]. Rasterization is pure: the same shape always
//! yields the same ordered list of unique tiles, with no grid dependency.
//!
//! ```
//! use aiomad_logic::model::Point;
//! use aiomad_logic::shapes::Shape;
//!
//! let rect = Shape::Rect { x: 0, y: 0, w: 2, h: 3 };
//! assert_eq!(rect.tiles().len(), 6);
//! assert!(rect.tiles().contains(&Point::new(1, 2)));
//! ```

use std::collections::HashSet;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::model::{Dimensions, Point};

/// A geometric primitive on the tile grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    /// Axis-aligned rectangle covering `[x, x+w) × [y, y+h)`.
    Rect { x: i32, y: i32, w: i32, h: i32 },
    /// Euclidean disk, boundary inclusive.
    Circle { cx: i32, cy: i32, r: i32 },
    Triangle {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        x3: i32,
        y3: i32,
    },
    /// Axis-aligned ellipse, boundary inclusive.
    Oval { cx: i32, cy: i32, rx: i32, ry: i32 },
    /// Sinusoidal stroke from start to end; `frequency` full cycles.
    Zigzag {
        start_x: i32,
        start_y: i32,
        end_x: i32,
        end_y: i32,
        amplitude: i32,
        frequency: i32,
    },
    Point { x: i32, y: i32 },
    /// Manhattan staircase through the waypoints, x first then y.
    Path { path: Vec<Point> },
}

impl Shape {
    /// Ordered, duplicate-free tiles covered by this shape.
    pub fn tiles(&self) -> Vec<Point> {
        match *self {
            Shape::Rect { x, y, w, h } => rect_tiles(x, y, w, h),
            Shape::Circle { cx, cy, r } => oval_tiles(cx, cy, r, r),
            Shape::Triangle {
                x1,
                y1,
                x2,
                y2,
                x3,
                y3,
            } => triangle_tiles(Point::new(x1, y1), Point::new(x2, y2), Point::new(x3, y3)),
            Shape::Oval { cx, cy, rx, ry } => oval_tiles(cx, cy, rx, ry),
            Shape::Zigzag {
                start_x,
                start_y,
                end_x,
                end_y,
                amplitude,
                frequency,
            } => zigzag_tiles(
                Point::new(start_x, start_y),
                Point::new(end_x, end_y),
                amplitude,
                frequency,
            ),
            Shape::Point { x, y } => vec![Point::new(x, y)],
            Shape::Path { ref path } => staircase_tiles(path),
        }
    }

    /// Bounding box of the tiles this shape may cover, `None` for an
    /// empty path. Degenerate sizes count as a single tile.
    pub fn extent(&self) -> Option<Extent> {
        match *self {
            Shape::Rect { x, y, w, h } => Extent::around([Point::new(x, y)]).map(|e| Extent {
                max_x: e.max_x + i64::from(w.max(1)) - 1,
                max_y: e.max_y + i64::from(h.max(1)) - 1,
                ..e
            }),
            Shape::Circle { cx, cy, r } => {
                let r = i64::from(r.max(0));
                Extent::around([Point::new(cx, cy)]).map(|e| e.padded(r, r))
            }
            Shape::Oval { cx, cy, rx, ry } => Extent::around([Point::new(cx, cy)])
                .map(|e| e.padded(i64::from(rx.max(0)), i64::from(ry.max(0)))),
            Shape::Triangle {
                x1,
                y1,
                x2,
                y2,
                x3,
                y3,
            } => Extent::around([Point::new(x1, y1), Point::new(x2, y2), Point::new(x3, y3)]),
            Shape::Zigzag {
                start_x,
                start_y,
                end_x,
                end_y,
                amplitude,
                ..
            } => {
                // the wave swings along the stroke's perpendicular only
                let dx = (i64::from(end_x) - i64::from(start_x)).abs();
                let dy = (i64::from(end_y) - i64::from(start_y)).abs();
                let length = dx.max(dy).max(1);
                let amplitude = i64::from(amplitude.max(0));
                let pad_x = (amplitude * dy + length - 1) / length;
                let pad_y = (amplitude * dx + length - 1) / length;
                Extent::around([Point::new(start_x, start_y), Point::new(end_x, end_y)])
                    .map(|e| e.padded(pad_x, pad_y))
            }
            Shape::Point { x, y } => Extent::around([Point::new(x, y)]),
            Shape::Path { ref path } => Extent::around(path.iter().copied()),
        }
    }

    /// Short tag used in logs and validation messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Rect { .. } => "rect",
            Shape::Circle { .. } => "circle",
            Shape::Triangle { .. } => "triangle",
            Shape::Oval { .. } => "oval",
            Shape::Zigzag { .. } => "zigzag",
            Shape::Point { .. } => "point",
            Shape::Path { .. } => "path",
        }
    }
}

/// Inclusive bounding box of every tile a shape can cover.
///
/// Kept in `i64` so oversized requests are measured without overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl Extent {
    fn around(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        points.into_iter().fold(None, |acc: Option<Extent>, p| {
            let (x, y) = (i64::from(p.x), i64::from(p.y));
            Some(match acc {
                None => Extent {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                },
                Some(e) => Extent {
                    min_x: e.min_x.min(x),
                    min_y: e.min_y.min(y),
                    max_x: e.max_x.max(x),
                    max_y: e.max_y.max(y),
                },
            })
        })
    }

    fn padded(self, pad_x: i64, pad_y: i64) -> Self {
        Extent {
            min_x: self.min_x - pad_x,
            min_y: self.min_y - pad_y,
            max_x: self.max_x + pad_x,
            max_y: self.max_y + pad_y,
        }
    }

    /// Whether the box lies inside `[0, width) × [0, height)`.
    pub fn fits_within(&self, dimensions: Dimensions) -> bool {
        let (width, height) = dimensions;
        self.min_x >= 0
            && self.min_y >= 0
            && self.max_x < i64::from(width)
            && self.max_y < i64::from(height)
    }
}

/// Union of several shapes, first-seen order, duplicates removed.
pub fn union_tiles<'a>(shapes: impl IntoIterator<Item = &'a Shape>) -> Vec<Point> {
    let mut seen = HashSet::new();
    let mut tiles = Vec::new();
    for shape in shapes {
        for tile in shape.tiles() {
            if seen.insert(tile) {
                tiles.push(tile);
            }
        }
    }
    tiles
}

fn dedup_in_order(tiles: Vec<Point>) -> Vec<Point> {
    let mut seen = HashSet::with_capacity(tiles.len());
    tiles.into_iter().filter(|t| seen.insert(*t)).collect()
}

fn rect_tiles(x: i32, y: i32, w: i32, h: i32) -> Vec<Point> {
    let mut tiles = Vec::with_capacity((i64::from(w.max(0)) * i64::from(h.max(0))) as usize);
    for yy in y..y + h {
        for xx in x..x + w {
            tiles.push(Point::new(xx, yy));
        }
    }
    tiles
}

/// Integer ellipse test `dx²·ry² + dy²·rx² ≤ rx²·ry²`; a circle is `rx == ry`.
fn oval_tiles(cx: i32, cy: i32, rx: i32, ry: i32) -> Vec<Point> {
    let rx_sq = i64::from(rx) * i64::from(rx);
    let ry_sq = i64::from(ry) * i64::from(ry);
    let mut tiles = Vec::new();
    for yy in cy - ry..=cy + ry {
        for xx in cx - rx..=cx + rx {
            let dx = i64::from(xx - cx);
            let dy = i64::from(yy - cy);
            if dx * dx * ry_sq + dy * dy * rx_sq <= rx_sq * ry_sq {
                tiles.push(Point::new(xx, yy));
            }
        }
    }
    tiles
}

/// Barycentric inclusion on integers: all three weights share the sign of
/// the (non-zero) denominator or are zero.
fn triangle_tiles(a: Point, b: Point, c: Point) -> Vec<Point> {
    let (ax, ay) = (i64::from(a.x), i64::from(a.y));
    let (bx, by) = (i64::from(b.x), i64::from(b.y));
    let (cx, cy) = (i64::from(c.x), i64::from(c.y));
    let denom = (by - cy) * (ax - cx) + (cx - bx) * (ay - cy);
    if denom == 0 {
        return Vec::new();
    }
    let min_x = a.x.min(b.x).min(c.x);
    let max_x = a.x.max(b.x).max(c.x);
    let min_y = a.y.min(b.y).min(c.y);
    let max_y = a.y.max(b.y).max(c.y);

    let mut tiles = Vec::new();
    for yy in min_y..=max_y {
        for xx in min_x..=max_x {
            let (px, py) = (i64::from(xx), i64::from(yy));
            let wa = (by - cy) * (px - cx) + (cx - bx) * (py - cy);
            let wb = (cy - ay) * (px - cx) + (ax - cx) * (py - cy);
            let wc = denom - wa - wb;
            let inside = if denom > 0 {
                wa >= 0 && wb >= 0 && wc >= 0
            } else {
                wa <= 0 && wb <= 0 && wc <= 0
            };
            if inside {
                tiles.push(Point::new(xx, yy));
            }
        }
    }
    tiles
}

fn zigzag_tiles(start: Point, end: Point, amplitude: i32, frequency: i32) -> Vec<Point> {
    let dx = f64::from(end.x - start.x);
    let dy = f64::from(end.y - start.y);
    let steps = (end.x - start.x)
        .abs()
        .max((end.y - start.y).abs())
        .max(1);
    let length = f64::from(steps);

    // Unit-ish perpendicular, scaled by the dominant axis length.
    let perp_x = -dy / length;
    let perp_y = dx / length;

    let mut tiles = Vec::with_capacity(steps as usize + 1);
    for i in 0..=steps {
        let t = f64::from(i) / length;
        let base_x = f64::from(start.x) + t * dx;
        let base_y = f64::from(start.y) + t * dy;
        let offset = (t * f64::from(frequency) * 2.0 * PI).sin() * f64::from(amplitude);

        let x = (base_x + offset * perp_x).round_ties_even() as i32;
        let y = (base_y + offset * perp_y).round_ties_even() as i32;
        if x >= 0 && y >= 0 {
            tiles.push(Point::new(x, y));
        }
    }
    dedup_in_order(tiles)
}

fn staircase_tiles(waypoints: &[Point]) -> Vec<Point> {
    if waypoints.len() < 2 {
        return waypoints.to_vec();
    }
    let mut tiles = Vec::new();
    for pair in waypoints.windows(2) {
        let (mut current, target) = (pair[0], pair[1]);
        tiles.push(current);
        while current != target {
            if current.x != target.x {
                current.x += (target.x - current.x).signum();
            } else {
                current.y += (target.y - current.y).signum();
            }
            tiles.push(current);
        }
    }
    dedup_in_order(tiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_covers_half_open_box() {
        let tiles = Shape::Rect {
            x: 2,
            y: 3,
            w: 3,
            h: 2,
        }
        .tiles();
        assert_eq!(tiles.len(), 6);
        assert_eq!(tiles[0], Point::new(2, 3));
        assert!(tiles.contains(&Point::new(4, 4)));
        assert!(!tiles.contains(&Point::new(5, 3)));
        assert!(!tiles.contains(&Point::new(2, 5)));
    }

    #[test]
    fn circle_is_inclusive_disk() {
        let tiles = Shape::Circle { cx: 5, cy: 5, r: 1 }.tiles();
        // centre plus the 4 orthogonal neighbours
        assert_eq!(tiles.len(), 5);
        assert!(tiles.contains(&Point::new(5, 4)));
        assert!(!tiles.contains(&Point::new(4, 4)));

        let r2 = Shape::Circle { cx: 5, cy: 5, r: 2 }.tiles();
        assert_eq!(r2.len(), 13);
    }

    #[test]
    fn oval_respects_both_radii() {
        let tiles = Shape::Oval {
            cx: 10,
            cy: 10,
            rx: 3,
            ry: 1,
        }
        .tiles();
        assert!(tiles.contains(&Point::new(13, 10)));
        assert!(tiles.contains(&Point::new(10, 11)));
        assert!(!tiles.contains(&Point::new(10, 12)));
        assert!(!tiles.contains(&Point::new(13, 11)));
    }

    #[test]
    fn oval_with_equal_radii_matches_circle() {
        let oval = Shape::Oval {
            cx: 6,
            cy: 6,
            rx: 3,
            ry: 3,
        }
        .tiles();
        let circle = Shape::Circle { cx: 6, cy: 6, r: 3 }.tiles();
        assert_eq!(oval, circle);
    }

    #[test]
    fn triangle_includes_vertices_and_edges() {
        let tiles = Shape::Triangle {
            x1: 0,
            y1: 0,
            x2: 4,
            y2: 0,
            x3: 0,
            y3: 4,
        }
        .tiles();
        assert!(tiles.contains(&Point::new(0, 0)));
        assert!(tiles.contains(&Point::new(4, 0)));
        assert!(tiles.contains(&Point::new(2, 2)));
        assert!(!tiles.contains(&Point::new(3, 3)));
        // 5 + 4 + 3 + 2 + 1
        assert_eq!(tiles.len(), 15);
    }

    #[test]
    fn triangle_winding_does_not_matter() {
        let cw = Shape::Triangle {
            x1: 0,
            y1: 0,
            x2: 0,
            y2: 4,
            x3: 4,
            y3: 0,
        }
        .tiles();
        assert_eq!(cw.len(), 15);
    }

    #[test]
    fn collinear_triangle_is_empty() {
        let tiles = Shape::Triangle {
            x1: 0,
            y1: 0,
            x2: 2,
            y2: 2,
            x3: 4,
            y3: 4,
        }
        .tiles();
        assert!(tiles.is_empty());
    }

    #[test]
    fn zigzag_starts_and_ends_on_endpoints() {
        let tiles = Shape::Zigzag {
            start_x: 0,
            start_y: 5,
            end_x: 10,
            end_y: 5,
            amplitude: 2,
            frequency: 1,
        }
        .tiles();
        assert_eq!(tiles.first(), Some(&Point::new(0, 5)));
        assert_eq!(tiles.last(), Some(&Point::new(10, 5)));
        assert!(tiles.iter().all(|t| (t.y - 5).abs() <= 2));
        assert!(tiles.iter().any(|t| t.y != 5));
    }

    #[test]
    fn zigzag_drops_negative_coordinates() {
        let tiles = Shape::Zigzag {
            start_x: 0,
            start_y: 0,
            end_x: 8,
            end_y: 0,
            amplitude: 3,
            frequency: 2,
        }
        .tiles();
        assert!(tiles.iter().all(|t| t.x >= 0 && t.y >= 0));
    }

    #[test]
    fn path_walks_x_then_y() {
        let tiles = Shape::Path {
            path: vec![Point::new(0, 0), Point::new(2, 2)],
        }
        .tiles();
        assert_eq!(
            tiles,
            vec![
                Point::new(0, 0),
                Point::new(1, 0),
                Point::new(2, 0),
                Point::new(2, 1),
                Point::new(2, 2),
            ]
        );
    }

    #[test]
    fn path_dedups_backtracking() {
        let tiles = Shape::Path {
            path: vec![Point::new(0, 0), Point::new(2, 0), Point::new(0, 0)],
        }
        .tiles();
        assert_eq!(tiles.len(), 3);
    }

    #[test]
    fn single_waypoint_path_is_that_point() {
        let tiles = Shape::Path {
            path: vec![Point::new(7, 1)],
        }
        .tiles();
        assert_eq!(tiles, vec![Point::new(7, 1)]);
    }

    #[test]
    fn rasterization_is_deterministic() {
        let shapes = [
            Shape::Circle { cx: 8, cy: 8, r: 4 },
            Shape::Zigzag {
                start_x: 1,
                start_y: 1,
                end_x: 20,
                end_y: 9,
                amplitude: 3,
                frequency: 2,
            },
            Shape::Triangle {
                x1: 3,
                y1: 1,
                x2: 9,
                y2: 7,
                x3: 1,
                y3: 8,
            },
        ];
        for shape in &shapes {
            assert_eq!(shape.tiles(), shape.tiles(), "{}", shape.kind_name());
        }
    }

    #[test]
    fn union_keeps_first_seen_order() {
        let a = Shape::Rect {
            x: 0,
            y: 0,
            w: 2,
            h: 1,
        };
        let b = Shape::Rect {
            x: 1,
            y: 0,
            w: 2,
            h: 1,
        };
        let tiles = union_tiles([&a, &b]);
        assert_eq!(
            tiles,
            vec![Point::new(0, 0), Point::new(1, 0), Point::new(2, 0)]
        );
    }

    #[test]
    fn extent_covers_every_rasterized_tile() {
        let shapes = [
            Shape::Rect {
                x: 2,
                y: 3,
                w: 4,
                h: 5,
            },
            Shape::Circle { cx: 8, cy: 8, r: 3 },
            Shape::Oval {
                cx: 10,
                cy: 6,
                rx: 4,
                ry: 2,
            },
            Shape::Triangle {
                x1: 1,
                y1: 9,
                x2: 7,
                y2: 2,
                x3: 12,
                y3: 11,
            },
            Shape::Zigzag {
                start_x: 3,
                start_y: 4,
                end_x: 17,
                end_y: 12,
                amplitude: 3,
                frequency: 2,
            },
            Shape::Path {
                path: vec![Point::new(4, 4), Point::new(9, 1)],
            },
        ];
        for shape in &shapes {
            let extent = shape.extent().unwrap();
            for t in shape.tiles() {
                let (x, y) = (i64::from(t.x), i64::from(t.y));
                assert!(
                    (extent.min_x..=extent.max_x).contains(&x)
                        && (extent.min_y..=extent.max_y).contains(&y),
                    "{} tile {:?} outside {:?}",
                    shape.kind_name(),
                    t,
                    extent
                );
            }
        }
    }

    #[test]
    fn horizontal_zigzag_only_swings_vertically() {
        let extent = Shape::Zigzag {
            start_x: 31,
            start_y: 31,
            end_x: 35,
            end_y: 31,
            amplitude: 2,
            frequency: 1,
        }
        .extent()
        .unwrap();
        assert_eq!((extent.min_x, extent.max_x), (31, 35));
        assert_eq!((extent.min_y, extent.max_y), (29, 33));
        assert!(extent.fits_within((36, 36)));
    }

    #[test]
    fn oversized_rect_is_measured_without_overflow() {
        let extent = Shape::Rect {
            x: 1,
            y: 0,
            w: i32::MAX,
            h: 1,
        }
        .extent()
        .unwrap();
        assert_eq!(extent.max_x, i64::from(i32::MAX));
        assert!(!extent.fits_within((36, 36)));
        assert!(Shape::Circle { cx: 2, cy: 2, r: 3 }
            .extent()
            .is_some_and(|e| !e.fits_within((36, 36))));
        assert_eq!(Shape::Path { path: Vec::new() }.extent(), None);
    }

    #[test]
    fn shape_wire_format_uses_kind_tag() {
        let json = r#"{"kind":"circle","cx":4,"cy":4,"r":2}"#;
        let shape: Shape = serde_json::from_str(json).unwrap();
        assert_eq!(shape, Shape::Circle { cx: 4, cy: 4, r: 2 });
    }
}
