//! Yaw conversion and 90° snapping.

use serde::{Deserialize, Serialize};

/// Which way to animate from one yaw to another (UI affordance only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationDirection {
    Clockwise,
    Counterclockwise,
}

pub fn deg_to_rad(degrees: f64) -> f64 {
    degrees.to_radians()
}

pub fn rad_to_deg(radians: f64) -> f64 {
    radians.to_degrees()
}

/// Wrap into [0, 360)
fn wrap_degrees(degrees: f64) -> f64 {
    (degrees % 360.0 + 360.0) % 360.0
}

/// Snap an arbitrary angle to the nearest quarter turn.
/// Always returns one of 0, 90, 180, 270. Non-finite input maps to 0.
pub fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let snapped = (wrap_degrees(degrees) / 90.0).round() * 90.0 % 360.0;
    // -0.0 from the remainder would break equality checks downstream
    snapped.abs()
}

/// Clockwise when the forward difference is at most half a turn.
pub fn rotation_direction(from_degrees: f64, to_degrees: f64) -> RotationDirection {
    if wrap_degrees(to_degrees - from_degrees) <= 180.0 {
        RotationDirection::Clockwise
    } else {
        RotationDirection::Counterclockwise
    }
}

/// Advance a yaw (radians) by exactly one quarter turn, snapped.
pub fn quarter_turn(yaw: f64) -> f64 {
    deg_to_rad(normalize_degrees(rad_to_deg(yaw) + 90.0))
}

/// True when a yaw (radians) snaps to 90° or 270°, i.e. X and Z trade places.
pub fn is_odd_quarter(yaw: f64) -> bool {
    let quarter = normalize_degrees(rad_to_deg(yaw));
    quarter == 90.0 || quarter == 270.0
}
