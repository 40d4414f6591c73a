//! aiomad Headless Generation Harness
//!
//! Runs the map pipeline end to end on a planner request and checks the
//! map invariants. Runs entirely in-process: no codec, no files written.
//!
//! Usage:
//!   cargo run -p aiomad-simtest
//!   cargo run -p aiomad-simtest -- --verbose
//!   cargo run -p aiomad-simtest -- path/to/request.json

use aiomad_logic::config::GenerationSettings;
use aiomad_logic::map::MapRepresentation;
use aiomad_logic::model::{
    Building, BuildingType, Layer, MapObject, MapSize, Obstacle, Point, RiverType, RoadType,
    TerrainType, Town, TownType,
};
use aiomad_logic::pathfinding::PathBuilder;
use aiomad_logic::request::{
    CreateMapRequest, OutsideSpec, RequestError, River, Road, Waypoints, Zone,
};
use aiomad_logic::shapes::Shape;
use aiomad_logic::terrain::TerrainGrid;
use aiomad_logic::validation;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ── Bundled request (same JSON the integration tests use) ───────────────
const SAMPLE_REQUEST_JSON: &str = include_str!("../../../data/sample_request.json");

/// Seeds swept by the randomized generation check.
const SWEEP_SEEDS: u64 = 64;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    let request_path = std::env::args().skip(1).find(|a| !a.starts_with("--"));

    let default_filter = if verbose { "info" } else { "error" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    println!("=== aiomad Generation Harness ===\n");

    let request_json = match &request_path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("Cannot read {}: {}", path, e);
                std::process::exit(2);
            }
        },
        None => SAMPLE_REQUEST_JSON.to_string(),
    };

    let mut results = Vec::new();

    // 1. Planner request end to end
    results.extend(validate_request(&request_json, verbose));

    // 2. Malformed requests are refused
    results.extend(validate_rejections(verbose));

    // 3. Shape rasterizer
    results.extend(validate_shapes(verbose));

    // 4. Path builder fallback ladder
    results.extend(validate_pathfinding(verbose));

    // 5. Water cleanup
    results.extend(validate_water_cleanup(verbose));

    // 6. Randomized request sweep
    results.extend(validate_random_sweep(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

/// One result per invariant check, named `<prefix>_<category>`.
fn invariant_results(prefix: &str, map: &MapRepresentation) -> Vec<TestResult> {
    let checks = [
        ("bounds", validation::check_objects_in_bounds(map)),
        ("no_overlap", validation::check_no_overlap(map)),
        ("gate_pairs", validation::check_gate_pairs(map)),
        ("placeable_painted", validation::check_placeable_painted(map)),
    ];
    checks
        .into_iter()
        .map(|(name, errors)| TestResult {
            name: format!("{}_{}", prefix, name),
            passed: errors.is_empty(),
            detail: match errors.first() {
                None => "ok".into(),
                Some(first) => format!("{} errors, first: {}", errors.len(), first.message),
            },
        })
        .collect()
}

fn same_map(a: &MapRepresentation, b: &MapRepresentation) -> bool {
    let (width, height) = a.dimensions();
    Layer::ALL.iter().all(|&layer| {
        a.objects(layer).eq(b.objects(layer))
            && (0..width).all(|x| {
                (0..height).all(|y| {
                    a.terrain(layer, x, y) == b.terrain(layer, x, y)
                        && a.road_at(layer, x, y) == b.road_at(layer, x, y)
                        && a.river_at(layer, x, y) == b.river_at(layer, x, y)
                })
            })
    })
}

// ── 1. Planner request ──────────────────────────────────────────────────

fn validate_request(json: &str, verbose: bool) -> Vec<TestResult> {
    println!("--- Planner Request ---");
    let mut results = Vec::new();

    let request = match CreateMapRequest::from_json(json) {
        Ok(r) => r,
        Err(errors) => {
            let detail = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            results.push(TestResult {
                name: "request_parse".into(),
                passed: false,
                detail,
            });
            return results;
        }
    };
    results.push(TestResult {
        name: "request_parse".into(),
        passed: true,
        detail: format!("'{}' with {} zones", request.title, request.zones.len()),
    });

    let map = match MapRepresentation::from_request(&request) {
        Ok(m) => m,
        Err(errors) => {
            results.push(TestResult {
                name: "request_generate".into(),
                passed: false,
                detail: format!("{} request errors", errors.len()),
            });
            return results;
        }
    };
    results.push(TestResult {
        name: "request_generate".into(),
        passed: true,
        detail: map.report().summary(),
    });

    results.extend(invariant_results("request", &map));

    let towns_requested: usize = request.zones.iter().map(|z| z.towns.len()).sum();
    let towns_placed = Layer::ALL
        .iter()
        .flat_map(|&layer| map.objects(layer))
        .filter(|o| matches!(o, MapObject::Town(_)))
        .count();
    results.push(TestResult {
        name: "request_towns_placed".into(),
        passed: towns_placed <= towns_requested && (towns_requested == 0 || towns_placed > 0),
        detail: format!("{}/{} towns placed", towns_placed, towns_requested),
    });

    // every zone keeps its own terrain somewhere
    let missing: Vec<&str> = map
        .zones()
        .values()
        .filter(|entry| {
            let layer = entry.zone.location;
            !entry.footprint.tiles().iter().any(|p| {
                map.terrain_grid().in_bounds(*p)
                    && map.terrain(layer, p.x, p.y) == entry.zone.terrain
            })
        })
        .map(|entry| entry.zone.id.as_str())
        .collect();
    results.push(TestResult {
        name: "request_zone_terrain".into(),
        passed: missing.is_empty(),
        detail: if missing.is_empty() {
            "every zone painted".into()
        } else {
            format!("zones without own terrain: {}", missing.join(", "))
        },
    });

    match MapRepresentation::from_request(&request) {
        Ok(again) => results.push(TestResult {
            name: "request_deterministic".into(),
            passed: same_map(&map, &again),
            detail: "two runs produce identical maps".into(),
        }),
        Err(_) => results.push(TestResult {
            name: "request_deterministic".into(),
            passed: false,
            detail: "second run rejected the request".into(),
        }),
    }

    if verbose {
        for finding in validation::check_placement_failures(&map) {
            println!("  [{}] {}", finding.category, finding.message);
        }
    }

    results
}

// ── 2. Rejections ───────────────────────────────────────────────────────

fn validate_rejections(_verbose: bool) -> Vec<TestResult> {
    println!("--- Request Validation ---");
    let mut results = Vec::new();

    let parse = CreateMapRequest::from_json("{\"size\": \"XXL\"}");
    results.push(TestResult {
        name: "reject_bad_json".into(),
        passed: parse.is_err(),
        detail: "unknown map size refused".into(),
    });

    let mut few_shapes = random_request(&mut StdRng::seed_from_u64(7));
    if let Some(zone) = few_shapes.zones.first_mut() {
        zone.shape.truncate(3);
    }
    results.push(TestResult {
        name: "reject_too_few_shapes".into(),
        passed: MapRepresentation::from_request(&few_shapes).is_err(),
        detail: "zone with 3 shapes refused".into(),
    });

    let mut no_players = random_request(&mut StdRng::seed_from_u64(8));
    no_players.players = 0;
    results.push(TestResult {
        name: "reject_no_players".into(),
        passed: !no_players.validate().is_empty(),
        detail: "zero players refused".into(),
    });

    let mut big_rock = random_request(&mut StdRng::seed_from_u64(9));
    big_rock
        .non_zonal_surface_spec
        .obstacles
        .push(Obstacle::new(Point::new(10, 10), 9, 1));
    results.push(TestResult {
        name: "reject_oversized_obstacle".into(),
        passed: !big_rock.validate().is_empty(),
        detail: "9-wide obstacle refused".into(),
    });

    let mut far_town = random_request(&mut StdRng::seed_from_u64(10));
    if let Some(zone) = far_town.zones.first_mut() {
        zone.towns
            .push(Town::new(Point::new(36, 3), TownType::Castle, None));
    }
    let off_map = far_town
        .validate()
        .iter()
        .any(|e| matches!(e, RequestError::OutsideMap { .. }));
    results.push(TestResult {
        name: "reject_outside_map".into(),
        passed: off_map,
        detail: "town past the map edge refused".into(),
    });

    results
}

// ── 3. Shapes ───────────────────────────────────────────────────────────

fn validate_shapes(_verbose: bool) -> Vec<TestResult> {
    println!("--- Shape Rasterizer ---");
    let mut results = Vec::new();

    let shapes = [
        Shape::Rect {
            x: 2,
            y: 3,
            w: 4,
            h: 5,
        },
        Shape::Circle {
            cx: 10,
            cy: 10,
            r: 3,
        },
        Shape::Triangle {
            x1: 0,
            y1: 0,
            x2: 6,
            y2: 0,
            x3: 0,
            y3: 6,
        },
        Shape::Oval {
            cx: 12,
            cy: 8,
            rx: 5,
            ry: 2,
        },
        Shape::Zigzag {
            start_x: 0,
            start_y: 10,
            end_x: 20,
            end_y: 10,
            amplitude: 3,
            frequency: 2,
        },
        Shape::Point { x: 4, y: 4 },
        Shape::Path {
            path: vec![Point::new(0, 0), Point::new(5, 3), Point::new(2, 7)],
        },
    ];

    for shape in &shapes {
        let first = shape.tiles();
        let second = shape.tiles();
        let mut unique = first.clone();
        unique.sort();
        unique.dedup();
        results.push(TestResult {
            name: format!("shape_{}", shape.kind_name()),
            passed: !first.is_empty() && first == second && unique.len() == first.len(),
            detail: format!("{} tiles, stable and duplicate-free", first.len()),
        });
    }

    let rect = Shape::Rect {
        x: 2,
        y: 3,
        w: 4,
        h: 5,
    }
    .tiles();
    results.push(TestResult {
        name: "shape_rect_area".into(),
        passed: rect.len() == 20,
        detail: format!("4x5 rect covers {} tiles", rect.len()),
    });

    results
}

// ── 4. Pathfinding ──────────────────────────────────────────────────────

fn validate_pathfinding(_verbose: bool) -> Vec<TestResult> {
    println!("--- Path Builder ---");
    let mut results = Vec::new();

    let open = |p: Point| p.x < 10 && p.y < 10;
    let straight = PathBuilder::new(open).build_path(Point::new(0, 0), Point::new(0, 9));
    results.push(TestResult {
        name: "path_straight".into(),
        passed: straight.len() == 10,
        detail: format!("{} tiles for a 9-step run", straight.len()),
    });

    // goal sits behind an impassable tile, reachable only by walking back
    let corridor = |p: Point| p.y == 0 && p.x < 6;
    let reverse = PathBuilder::new(corridor).build_path(Point::new(0, 0), Point::new(6, 0));
    results.push(TestResult {
        name: "path_reverse_fallback".into(),
        passed: reverse.first() == Some(&Point::new(0, 0))
            && reverse.last() == Some(&Point::new(6, 0)),
        detail: format!("{} tiles via goal→start search", reverse.len()),
    });

    let island = |p: Point| (p.y == 0 && p.x < 10) || p == Point::new(9, 5);
    let close = PathBuilder::new(island).build_path(Point::new(0, 0), Point::new(9, 5));
    results.push(TestResult {
        name: "path_close_enough".into(),
        passed: close.last() == Some(&Point::new(9, 0)),
        detail: format!("settled for {:?}", close.last()),
    });

    let walled = |p: Point| p.x < 3 && p.y < 3;
    let none = PathBuilder::new(walled).build_path(Point::new(0, 0), Point::new(20, 20));
    results.push(TestResult {
        name: "path_unreachable".into(),
        passed: none.is_empty(),
        detail: "no path, no partial route".into(),
    });

    results
}

// ── 5. Water cleanup ────────────────────────────────────────────────────

fn validate_water_cleanup(_verbose: bool) -> Vec<TestResult> {
    println!("--- Water Cleanup ---");
    let mut results = Vec::new();

    let mut grid = TerrainGrid::new((5, 5));
    for x in 0..5 {
        for y in 0..5 {
            let terrain = match (x, y) {
                (2, 2) | (4, 0) | (4, 1) => TerrainType::Water,
                _ => TerrainType::Grass,
            };
            grid.set_tile(Point::new(x, y), Layer::Surface, terrain);
        }
    }
    let changed = grid.remove_useless_water();
    results.push(TestResult {
        name: "water_isolated_tile".into(),
        passed: changed == vec![Point::new(2, 2)]
            && grid.get_tile(Point::new(2, 2), Layer::Surface) == TerrainType::Grass,
        detail: format!("{} tiles reclassified", changed.len()),
    });
    results.push(TestResult {
        name: "water_idempotent".into(),
        passed: grid.remove_useless_water().is_empty(),
        detail: "second pass changes nothing".into(),
    });

    results
}

// ── 6. Randomized sweep ─────────────────────────────────────────────────

fn validate_random_sweep(verbose: bool) -> Vec<TestResult> {
    println!("--- Randomized Sweep ({} seeds) ---", SWEEP_SEEDS);
    let mut results = Vec::new();
    let settings = GenerationSettings::default();

    let mut generated = 0;
    let mut placed = 0;
    let mut failed = 0;
    let mut broken: Vec<String> = Vec::new();

    for seed in 0..SWEEP_SEEDS {
        let request = random_request(&mut StdRng::seed_from_u64(seed));
        let map = match MapRepresentation::build(&request, &settings) {
            Ok(m) => m,
            Err(errors) => {
                broken.push(format!("seed {}: rejected ({})", seed, errors[0]));
                continue;
            }
        };
        generated += 1;
        placed += map.report().placed().count();
        failed += map.report().failed().count();

        let errors = validation::errors_only(validation::validate_map(&map));
        if let Some(first) = errors.first() {
            broken.push(format!("seed {}: [{}] {}", seed, first.category, first.message));
        }
        if verbose {
            println!("  seed {:>3}: {}", seed, map.report().summary());
        }
    }

    results.push(TestResult {
        name: "sweep_all_generated".into(),
        passed: generated == SWEEP_SEEDS,
        detail: format!("{}/{} requests generated", generated, SWEEP_SEEDS),
    });
    results.push(TestResult {
        name: "sweep_invariants".into(),
        passed: broken.is_empty(),
        detail: if broken.is_empty() {
            format!("{} placed, {} soft failures, no invariant broken", placed, failed)
        } else {
            broken.join(" | ")
        },
    });

    results
}

const LAND: [TerrainType; 6] = [
    TerrainType::Grass,
    TerrainType::Dirt,
    TerrainType::Sand,
    TerrainType::Snow,
    TerrainType::Swamp,
    TerrainType::Rough,
];

const BUILDINGS: [BuildingType; 11] = [
    BuildingType::Sawmill,
    BuildingType::OrePit,
    BuildingType::AlchemistsLab,
    BuildingType::SulfurDune,
    BuildingType::CrystalCavern,
    BuildingType::GemPond,
    BuildingType::GoldMine,
    BuildingType::AbandonedMine,
    BuildingType::SubterraneanGate,
    BuildingType::Boat,
    BuildingType::Shipyard,
];

fn random_point(rng: &mut StdRng, limit: i32) -> Point {
    Point::new(rng.gen_range(0..limit), rng.gen_range(0..limit))
}

/// A random shape near `center` that stays on a `size`-wide square map.
fn random_shape(rng: &mut StdRng, center: Point, size: i32) -> Shape {
    let x = center.x + rng.gen_range(-4..=4);
    let y = center.y + rng.gen_range(-4..=4);
    // at least `lo`, and `pad` tiles clear of the far edge
    let fit = |v: i32, lo: i32, pad: i32| v.clamp(lo, size - 1 - pad);
    match rng.gen_range(0..5) {
        0 => {
            let r = rng.gen_range(1..=4);
            Shape::Circle {
                cx: fit(x, r, r),
                cy: fit(y, r, r),
                r,
            }
        }
        1 => {
            let rx = rng.gen_range(1..=5);
            let ry = rng.gen_range(1..=3);
            Shape::Oval {
                cx: fit(x, rx, rx),
                cy: fit(y, ry, ry),
                rx,
                ry,
            }
        }
        2 => {
            let dx = rng.gen_range(1..=6);
            let dy = rng.gen_range(1..=6);
            let (x, y) = (fit(x, 0, dx), fit(y, 0, dy));
            Shape::Triangle {
                x1: x,
                y1: y,
                x2: x + dx,
                y2: y,
                x3: x,
                y3: y + dy,
            }
        }
        _ => {
            let w = rng.gen_range(1..=8);
            let h = rng.gen_range(1..=8);
            Shape::Rect {
                x: fit(x, 0, w - 1),
                y: fit(y, 0, h - 1),
                w,
                h,
            }
        }
    }
}

/// A valid request with random zones packed onto a small map.
fn random_request(rng: &mut StdRng) -> CreateMapRequest {
    let (size, _) = MapSize::S.dimensions();
    let players = rng.gen_range(1..=4);
    let has_underground = rng.gen_bool(0.5);

    let zone_count = rng.gen_range(2..=6);
    let mut zones = Vec::new();
    for i in 0..zone_count {
        let location = if has_underground && rng.gen_bool(0.3) {
            Layer::Underground
        } else {
            Layer::Surface
        };
        let terrain = match location {
            Layer::Underground if rng.gen_bool(0.7) => TerrainType::Subterranean,
            Layer::Underground => TerrainType::Lava,
            Layer::Surface if rng.gen_bool(0.15) => TerrainType::Water,
            Layer::Surface => LAND[rng.gen_range(0..LAND.len())],
        };
        let center = random_point(rng, size);
        let shape = (0..rng.gen_range(4..=6))
            .map(|_| random_shape(rng, center, size))
            .collect();
        let near = |rng: &mut StdRng| {
            Point::new(
                (center.x + rng.gen_range(-3..=3)).clamp(0, size - 1),
                (center.y + rng.gen_range(-3..=3)).clamp(0, size - 1),
            )
        };

        let towns = (0..rng.gen_range(0..=1))
            .map(|_| {
                let owner = rng.gen_bool(0.5).then(|| rng.gen_range(0..players));
                Town::new(near(rng), TownType::Random, owner)
            })
            .collect();
        let buildings = (0..rng.gen_range(0..=3))
            .map(|_| {
                let kind = BUILDINGS[rng.gen_range(0..BUILDINGS.len())];
                Building::new(near(rng), kind, None)
            })
            .collect();
        let obstacles = (0..rng.gen_range(0..=3))
            .map(|_| Obstacle::new(near(rng), rng.gen_range(1..=3), rng.gen_range(1..=2)))
            .collect();
        let roads = (0..rng.gen_range(0..=1))
            .map(|_| Road {
                path: Waypoints {
                    path: vec![near(rng), near(rng)],
                },
                road_type: RoadType::Dirt,
            })
            .collect();
        let rivers = (0..rng.gen_range(0..=1))
            .map(|_| River {
                path: Waypoints {
                    path: vec![near(rng), near(rng)],
                },
                river_type: RiverType::Clear,
            })
            .collect();

        zones.push(Zone {
            id: format!("zone_{}", i),
            location,
            terrain,
            shape,
            underground_entrance: rng.gen_bool(0.3).then(|| near(rng)),
            obstacles,
            buildings,
            towns,
            roads,
            rivers,
            is_starting_player_area: i == 0,
        });
    }

    let clutter = |rng: &mut StdRng| OutsideSpec {
        obstacles: (0..rng.gen_range(0..=3))
            .map(|_| {
                Obstacle::new(
                    random_point(rng, size),
                    rng.gen_range(1..=4),
                    rng.gen_range(1..=3),
                )
            })
            .collect(),
    };

    CreateMapRequest {
        size: MapSize::S,
        title: "random".into(),
        description: String::new(),
        players,
        has_underground,
        zones,
        non_zonal_surface_spec: clutter(rng),
        non_zonal_underground_spec: clutter(rng),
    }
}
