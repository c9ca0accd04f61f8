//! Factory functions for test data.
//!
//! Parts, ready-made buildings and view image sets used by tests and by the
//! agent command interface.

use std::f64::consts::FRAC_PI_2;

use shared::*;

// ── Part factories ──────────────────────────────────────────────

/// Floor slab centered at the origin.
pub fn floor(width: f64, depth: f64) -> Part {
    Part::new(PartKind::Floor, [0.0, 0.0, 0.0], [width, 0.2, depth]).with_color("#8b7355")
}

/// Wall running along X; `yaw` turns it about its center.
pub fn wall(position: [f64; 3], length: f64, height: f64, yaw: f64) -> Part {
    Part::new(PartKind::Wall, position, [length, height, 0.2])
        .with_yaw(yaw)
        .with_color("#d9c7a7")
}

pub fn flat_roof(y: f64, width: f64, depth: f64) -> Part {
    Part::new(PartKind::Roof, [0.0, y, 0.0], [width, 0.2, depth]).with_color("#8b2e2e")
}

pub fn gable(position: [f64; 3], width: f64, height: f64) -> Part {
    Part::new(PartKind::TriangleWall, position, [width, height, 0.2]).with_color("#d9c7a7")
}

pub fn door(position: [f64; 3]) -> Part {
    Part::new(PartKind::Door, position, [1.0, 2.0, 0.1]).with_color("#5a3a1a")
}

// ── Object factories ────────────────────────────────────────────

/// Single 4×0.2×4 floor, the object a reset produces.
pub fn floor_only() -> BuildingObject {
    BuildingObject::canonical_default()
}

/// Four walls on a 4×4 floor with a flat roof overhanging by 0.2 on each side.
pub fn simple_house() -> BuildingObject {
    BuildingObject::new(vec![
        floor(4.0, 4.0),
        wall([0.0, 1.35, 1.9], 4.0, 2.5, 0.0),
        wall([0.0, 1.35, -1.9], 4.0, 2.5, 0.0),
        wall([-1.9, 1.35, 0.0], 4.0, 2.5, FRAC_PI_2),
        wall([1.9, 1.35, 0.0], 4.0, 2.5, FRAC_PI_2),
        door([0.0, 1.1, 2.0]),
        flat_roof(2.7, 4.4, 4.4),
    ])
}

/// Long 6×3 shed with gable ends instead of a roof slab.
pub fn gabled_shed() -> BuildingObject {
    BuildingObject::new(vec![
        floor(6.0, 3.0),
        wall([0.0, 1.1, 1.4], 6.0, 2.0, 0.0),
        wall([0.0, 1.1, -1.4], 6.0, 2.0, 0.0),
        gable([-2.9, 2.6, 0.0], 3.0, 1.0).with_yaw(FRAC_PI_2),
        gable([2.9, 2.6, 0.0], 3.0, 1.0).with_yaw(FRAC_PI_2),
    ])
}

// ── Views ───────────────────────────────────────────────────────

/// One image per view; payloads are tagged so pairs can be told apart.
pub fn view_images(tag: &str) -> ViewImages {
    ViewName::ALL
        .iter()
        .map(|view| {
            (
                *view,
                ImagePayload {
                    media_type: "image/png".to_string(),
                    data: format!("{tag}-{}", view.as_str()),
                },
            )
        })
        .collect()
}
