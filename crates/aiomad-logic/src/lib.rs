//! Map materialization logic for aiomad.
//!
//! This crate turns a declarative map request (zones made of shapes, each
//! carrying terrain plus towns, buildings, obstacles, roads and rivers) into
//! a populated two-layer tile map. Everything is plain data in, plain data
//! out: no I/O, no engine, no threads. The resulting [`map::MapRepresentation`]
//! is handed to an external codec that writes the game's binary format.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Search radii and other generation tunables |
//! | [`constants`] | Neighbour offsets, footprint sizes, limits |
//! | [`map`] | Six-phase materializer and the finished map's accessors |
//! | [`model`] | Points, layers, terrain, buildings, towns, obstacles |
//! | [`objects`] | Object placement grid with ring-search placement |
//! | [`pathfinding`] | A* path builder with a fallback ladder |
//! | [`report`] | Per-request placement outcomes and terrain conflicts |
//! | [`request`] | Request wire model, zone footprints, validation |
//! | [`shapes`] | Shape rasterizer (rect, circle, triangle, oval, zigzag, path) |
//! | [`terrain`] | Terrain grid with road/river overlays and water cleanup |
//! | [`validation`] | Invariant checks over a generated map |
//!
//! # Example
//!
//! ```
//! use aiomad_logic::map::MapRepresentation;
//! use aiomad_logic::model::{Layer, TerrainType};
//! use aiomad_logic::request::CreateMapRequest;
//!
//! let json = r#"{
//!     "size": "S",
//!     "players": 1,
//!     "has_underground": false,
//!     "zones": [{
//!         "id": "meadow",
//!         "location": "surface",
//!         "terrain": "grass",
//!         "shape": [
//!             {"kind": "rect", "x": 0, "y": 0, "w": 5, "h": 5},
//!             {"kind": "rect", "x": 5, "y": 0, "w": 5, "h": 5},
//!             {"kind": "rect", "x": 0, "y": 5, "w": 5, "h": 5},
//!             {"kind": "rect", "x": 5, "y": 5, "w": 5, "h": 5}
//!         ],
//!         "obstacles": [{"starting_point": {"x": 5, "y": 5}, "width": 1, "height": 1}]
//!     }]
//! }"#;
//!
//! let request = CreateMapRequest::from_json(json).unwrap();
//! let map = MapRepresentation::from_request(&request).unwrap();
//! assert_eq!(map.terrain(Layer::Surface, 5, 5), TerrainType::Grass);
//! assert!(map.object_at(Layer::Surface, 5, 5).is_some());
//! ```

pub mod config;
pub mod constants;
pub mod map;
pub mod model;
pub mod objects;
pub mod pathfinding;
pub mod report;
pub mod request;
pub mod shapes;
pub mod terrain;
pub mod validation;
