//! Footprint and bounding-box math for part collections.
//!
//! Only yaw is modeled: parts are treated as boxes rotated about Y, and the
//! vertical extent is never rotated.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use shared::{BuildingObject, Part};

use crate::rotation::is_odd_quarter;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    /// Box containing nothing; the identity for `union`.
    pub const EMPTY: Aabb = Aabb {
        min: DVec3::INFINITY,
        max: DVec3::NEG_INFINITY,
    };

    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_size(center: DVec3, size: DVec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Center of the bounding box
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Width, height, depth; zero for the empty box.
    pub fn size(&self) -> DVec3 {
        if self.is_empty() {
            DVec3::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn max_dimension(&self) -> f64 {
        self.size().max_element()
    }
}

/// A ray in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    pub direction: DVec3,
}

/// Intersect a ray with the horizontal plane `y = height`.
/// Returns None if the ray is parallel to the plane or the hit is behind the origin.
pub fn ray_ground_plane(ray: &Ray, height: f64) -> Option<DVec3> {
    let denom = ray.direction.y;
    if denom.abs() < 1e-9 {
        return None;
    }
    let t = (height - ray.origin.y) / denom;
    if t < 0.0 {
        return None;
    }
    Some(ray.origin + ray.direction * t)
}

/// Grid-unit extent of an object on the XZ plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    pub width: u32,
    pub depth: u32,
}

impl Footprint {
    pub const UNIT: Footprint = Footprint { width: 1, depth: 1 };

    pub fn as_array(&self) -> [u32; 2] {
        [self.width, self.depth]
    }
}

/// Half-extents `(x, z)` of a part on the object's XZ plane after its own yaw.
///
/// Exact for a rotated rectangle; triangular parts get the bound of their
/// rectangle, which overestimates their silhouette.
pub fn part_extents(part: &Part) -> (f64, f64) {
    let hx = part.size[0] / 2.0;
    let hz = part.size[2] / 2.0;
    let (sin, cos) = part.yaw().sin_cos();

    let extent_x = (hx * cos).abs() + (hz * sin).abs();
    let extent_z = (hx * sin).abs() + (hz * cos).abs();
    (extent_x, extent_z)
}

fn grid_units(span: f64) -> u32 {
    if !span.is_finite() {
        return 1;
    }
    span.ceil().max(1.0) as u32
}

/// Footprint in whole grid cells, never smaller than 1×1.
pub fn footprint(parts: &[Part]) -> Footprint {
    if parts.is_empty() {
        return Footprint::UNIT;
    }

    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_z = f64::INFINITY;
    let mut max_z = f64::NEG_INFINITY;

    for part in parts {
        let (ex, ez) = part_extents(part);
        let [px, _, pz] = part.position;
        min_x = min_x.min(px - ex);
        max_x = max_x.max(px + ex);
        min_z = min_z.min(pz - ez);
        max_z = max_z.max(pz + ez);
    }

    Footprint {
        width: grid_units(max_x - min_x),
        depth: grid_units(max_z - min_z),
    }
}

/// Object-local 3D bounds; the empty box for an empty part list.
pub fn bounding_box(parts: &[Part]) -> Aabb {
    parts.iter().fold(Aabb::EMPTY, |acc, part| {
        let (ex, ez) = part_extents(part);
        let half = DVec3::new(ex, part.size[1] / 2.0, ez);
        let center = DVec3::from_array(part.position);
        acc.union(&Aabb::new(center - half, center + half))
    })
}

/// `[width, height, depth]` as persisted after placement
pub fn object_dimensions(object: &BuildingObject) -> [f64; 3] {
    bounding_box(&object.parts).size().to_array()
}

/// Footprint as seen after an object-level yaw; quarter turns of 90° and
/// 270° swap width and depth.
pub fn rotated_footprint(footprint: Footprint, yaw: f64) -> Footprint {
    if is_odd_quarter(yaw) {
        Footprint {
            width: footprint.depth,
            depth: footprint.width,
        }
    } else {
        footprint
    }
}
