//! Passability-aware path search between waypoints.
//!
//! `PathBuilder` runs A* over 4-directional grid moves with unit step cost
//! and a Manhattan heuristic. Open-set ties are broken by insertion order,
//! so the same inputs always produce the same path.
//!
//! When the goal cannot be reached the builder degrades in a fixed order:
//!
//! 1. search start → goal
//! 2. search goal → start (the start tile itself is never passability-checked,
//!    so the reverse search can succeed where the forward one fails)
//! 3. take any tile at exactly `acceptable_error` Manhattan distance from the
//!    goal that the forward search reached, and return the path to it
//!
//! Only when all three fail is the result empty.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::constants::{search, ORTHOGONAL};
use crate::model::Point;

/// A* path builder over a passability predicate.
///
/// The predicate must reject tiles outside the grid; the builder only
/// rejects negative coordinates on its own.
pub struct PathBuilder<F>
where
    F: Fn(Point) -> bool,
{
    is_passable: F,
    acceptable_error: i32,
}

/// Result of one directed A* run.
struct SearchOutcome {
    path: Option<Vec<Point>>,
    /// Parent links of every tile the search enqueued.
    came_from: HashMap<Point, Point>,
}

impl<F> PathBuilder<F>
where
    F: Fn(Point) -> bool,
{
    pub fn new(is_passable: F) -> Self {
        Self {
            is_passable,
            acceptable_error: search::ACCEPTABLE_ERROR,
        }
    }

    pub fn with_acceptable_error(mut self, acceptable_error: i32) -> Self {
        self.acceptable_error = acceptable_error;
        self
    }

    /// Path from `start` to `goal` (both inclusive), or empty if even the
    /// close-enough fallback fails.
    pub fn build_path(&self, start: Point, goal: Point) -> Vec<Point> {
        let forward = self.search(start, goal);
        if let Some(path) = forward.path {
            return path;
        }

        if let Some(mut path) = self.search(goal, start).path {
            log::debug!("Reached {:?} only by walking back from {:?}", start, goal);
            path.reverse();
            return path;
        }

        match self.closest_reached(start, goal, &forward.came_from) {
            Some(path) => {
                log::debug!(
                    "Goal {:?} unreachable, settling for {:?}",
                    goal,
                    path.last()
                );
                path
            }
            None => {
                log::debug!("No path between {:?} and {:?}", start, goal);
                Vec::new()
            }
        }
    }

    /// Concatenated paths through consecutive waypoints.
    ///
    /// Fewer than two waypoints are returned unchanged.
    pub fn build_route(&self, waypoints: &[Point]) -> Vec<Point> {
        if waypoints.len() < 2 {
            return waypoints.to_vec();
        }
        let mut tiles = Vec::new();
        for pair in waypoints.windows(2) {
            tiles.extend(self.build_path(pair[0], pair[1]));
        }
        tiles
    }

    fn search(&self, start: Point, goal: Point) -> SearchOutcome {
        let mut open = BinaryHeap::new();
        let mut came_from: HashMap<Point, Point> = HashMap::new();
        let mut g_score: HashMap<Point, i32> = HashMap::new();
        let mut closed: HashSet<Point> = HashSet::new();
        let mut sequence: u64 = 0;

        g_score.insert(start, 0);
        open.push(Reverse((start.manhattan(goal), sequence, 0, start)));

        while let Some(Reverse((_, _, g, current))) = open.pop() {
            if !closed.insert(current) {
                continue;
            }

            if current == goal {
                let path = walk_back(current, start, &came_from);
                return SearchOutcome {
                    path: Some(path),
                    came_from,
                };
            }

            for (dx, dy) in ORTHOGONAL {
                let next = current.offset(dx, dy);
                if next.x < 0
                    || next.y < 0
                    || closed.contains(&next)
                    || !(self.is_passable)(next)
                {
                    continue;
                }
                let tentative = g + 1;
                if g_score.get(&next).map_or(true, |&best| tentative < best) {
                    came_from.insert(next, current);
                    g_score.insert(next, tentative);
                    sequence += 1;
                    open.push(Reverse((
                        tentative + next.manhattan(goal),
                        sequence,
                        tentative,
                        next,
                    )));
                }
            }
        }

        SearchOutcome {
            path: None,
            came_from,
        }
    }

    fn closest_reached(
        &self,
        start: Point,
        goal: Point,
        came_from: &HashMap<Point, Point>,
    ) -> Option<Vec<Point>> {
        let e = self.acceptable_error;
        for dx in -e..=e {
            for dy in -e..=e {
                if dx.abs() + dy.abs() != e {
                    continue;
                }
                let candidate = goal.offset(dx, dy);
                if came_from.contains_key(&candidate) {
                    return Some(walk_back(candidate, start, came_from));
                }
            }
        }
        None
    }
}

/// Follow parent links from `end` back to `start`, returned start-first.
fn walk_back(end: Point, start: Point, came_from: &HashMap<Point, Point>) -> Vec<Point> {
    let mut path = Vec::new();
    let mut current = end;
    while let Some(&parent) = came_from.get(&current) {
        path.push(current);
        current = parent;
    }
    path.push(start);
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid(width: i32, height: i32) -> impl Fn(Point) -> bool {
        move |p: Point| p.x < width && p.y < height
    }

    fn assert_connected(path: &[Point]) {
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan(pair[1]), 1, "gap in path {path:?}");
        }
    }

    #[test]
    fn test_straight_line() {
        let builder = PathBuilder::new(open_grid(10, 10));
        let path = builder.build_path(Point::new(0, 0), Point::new(4, 0));
        assert_eq!(path.len(), 5);
        assert_eq!(path[0], Point::new(0, 0));
        assert_eq!(path[4], Point::new(4, 0));
    }

    #[test]
    fn test_shortest_manhattan_length() {
        let builder = PathBuilder::new(open_grid(10, 10));
        let path = builder.build_path(Point::new(0, 0), Point::new(3, 4));
        assert_eq!(path.len(), 8);
        assert_connected(&path);
    }

    #[test]
    fn test_same_tile() {
        let builder = PathBuilder::new(open_grid(5, 5));
        let path = builder.build_path(Point::new(2, 2), Point::new(2, 2));
        assert_eq!(path, vec![Point::new(2, 2)]);
    }

    #[test]
    fn test_routes_around_wall() {
        // wall at x=3 except a gap at y=6
        let passable =
            |p: Point| (0..8).contains(&p.x) && (0..8).contains(&p.y) && (p.x != 3 || p.y == 6);
        let builder = PathBuilder::new(passable);
        let path = builder.build_path(Point::new(0, 0), Point::new(6, 0));
        assert!(path.contains(&Point::new(3, 6)));
        assert_eq!(path.last(), Some(&Point::new(6, 0)));
        assert_connected(&path);
    }

    #[test]
    fn test_reverse_search_when_goal_tile_blocked() {
        // Only the corridor y=0, x in 0..5 is passable; the goal (5, 0) is not,
        // so the forward search can never enqueue it.
        let passable = |p: Point| p.y == 0 && (0..5).contains(&p.x);
        let builder = PathBuilder::new(passable);
        let path = builder.build_path(Point::new(0, 0), Point::new(5, 0));
        assert_eq!(path.len(), 6);
        assert_eq!(path.first(), Some(&Point::new(0, 0)));
        assert_eq!(path.last(), Some(&Point::new(5, 0)));
        assert_connected(&path);
    }

    #[test]
    fn test_close_enough_fallback() {
        // Row y=0 is reachable; the goal sits alone at (9, 5).
        let passable = |p: Point| (p.y == 0 && (0..10).contains(&p.x)) || p == Point::new(9, 5);
        let builder = PathBuilder::new(passable);
        let path = builder.build_path(Point::new(0, 0), Point::new(9, 5));
        assert_eq!(path.first(), Some(&Point::new(0, 0)));
        assert_eq!(path.last(), Some(&Point::new(9, 0)));
        assert_eq!(path.len(), 10);
    }

    #[test]
    fn test_fallback_respects_acceptable_error() {
        let passable = |p: Point| (p.y == 0 && (0..10).contains(&p.x)) || p == Point::new(9, 5);
        let builder = PathBuilder::new(passable).with_acceptable_error(3);
        let path = builder.build_path(Point::new(0, 0), Point::new(9, 5));
        assert!(path.is_empty());
    }

    #[test]
    fn test_unreachable_is_empty() {
        let passable = |p: Point| p.x < 3 && p.y < 3 || p == Point::new(20, 20);
        let builder = PathBuilder::new(passable);
        let path = builder.build_path(Point::new(0, 0), Point::new(20, 20));
        assert!(path.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let builder = PathBuilder::new(open_grid(20, 20));
        let a = builder.build_path(Point::new(1, 1), Point::new(15, 12));
        let b = builder.build_path(Point::new(1, 1), Point::new(15, 12));
        assert_eq!(a, b);
    }

    #[test]
    fn test_route_through_waypoints() {
        let builder = PathBuilder::new(open_grid(10, 10));
        let route = builder.build_route(&[Point::new(0, 0), Point::new(3, 0), Point::new(3, 3)]);
        assert!(route.contains(&Point::new(3, 0)));
        assert_eq!(route.last(), Some(&Point::new(3, 3)));
        assert_eq!(builder.build_route(&[Point::new(2, 2)]), vec![Point::new(2, 2)]);
    }
}
