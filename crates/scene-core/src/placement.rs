//! Grid placement: pointer events → snapped cells, click vs drag, rotation.
//!
//! The controller is the only writer of [`PlacementState`]. Gestures run
//! Idle → press → Armed → (travel beyond threshold → Dragging) → release →
//! Idle, and a placement is committed only when releasing out of Armed.
//! A drag is camera-orbit intent and never places anything.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use shared::{BuildingObject, PlacementRecord};

use crate::geometry::{footprint, object_dimensions, rotated_footprint, Footprint};
use crate::rotation::{is_odd_quarter, quarter_turn};
use crate::settings::GridSettings;

/// Center of a grid cell in world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub x: f64,
    pub z: f64,
}

/// Pointer position in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance(&self, other: &ScreenPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// An object committed to a cell
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedObject {
    pub object: BuildingObject,
    pub world_x: f64,
    pub world_y: f64,
    pub world_z: f64,
}

impl PlacedObject {
    pub fn position(&self) -> [f64; 3] {
        [self.world_x, self.world_y, self.world_z]
    }

    /// The object with its world placement and yaw filled in
    pub fn world_object(&self, rotation_y: f64) -> BuildingObject {
        BuildingObject {
            position: Some(self.position()),
            rotation: Some([0.0, rotation_y, 0.0]),
            ..self.object.clone()
        }
    }
}

/// Session-scoped placement state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementState {
    pub hover_cell: Option<GridCell>,
    pub placed_object: Option<PlacedObject>,
    /// Yaw in radians, always a quarter turn
    pub rotation_y: f64,
}

impl PlacementState {
    /// What gets written back to storage for the placed object.
    /// The box is expressed in world axes, so odd quarter turns swap width and depth.
    pub fn placement_record(&self) -> Option<PlacementRecord> {
        let placed = self.placed_object.as_ref()?;
        let [w, h, d] = object_dimensions(&placed.object);
        let bounding_box = if is_odd_quarter(self.rotation_y) {
            [d, h, w]
        } else {
            [w, h, d]
        };
        Some(PlacementRecord {
            position: placed.position(),
            rotation: [0.0, self.rotation_y, 0.0],
            bounding_box,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Armed { last: ScreenPoint, travelled: f64 },
    Dragging,
}

/// Result of releasing the pointer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PointerUpOutcome {
    /// Click inside the grid; object committed to this cell
    Placed { cell: GridCell },
    /// Gesture was a drag; nothing placed
    Dragged,
    /// Click outside the grid; nothing placed
    OutOfBounds,
    /// Release without a matching press
    Ignored,
}

/// Owns the placement state for one interactive session
pub struct PlacementController {
    settings: GridSettings,
    object: BuildingObject,
    state: PlacementState,
    gesture: Gesture,
}

impl PlacementController {
    /// Enter placement mode for `object` with an empty state.
    pub fn new(settings: GridSettings, object: BuildingObject) -> Self {
        Self {
            settings,
            object,
            state: PlacementState::default(),
            gesture: Gesture::Idle,
        }
    }

    pub fn state(&self) -> &PlacementState {
        &self.state
    }

    pub fn object(&self) -> &BuildingObject {
        &self.object
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture == Gesture::Dragging
    }

    /// Snap a world point to a cell; `None` outside the grid.
    pub fn snap(&self, point: DVec3) -> Option<GridCell> {
        let cell = self.settings.cell_size;
        if !(cell > 0.0 && cell.is_finite()) || !point.is_finite() {
            return None;
        }
        // + 0.0 turns -0.0 into 0.0
        let x = (point.x / cell).round() * cell + 0.0;
        let z = (point.z / cell).round() * cell + 0.0;
        let half = self.settings.half_extent;
        (x.abs() <= half && z.abs() <= half).then_some(GridCell { x, z })
    }

    pub fn on_pointer_down(&mut self, screen: ScreenPoint) {
        self.gesture = Gesture::Armed {
            last: screen,
            travelled: 0.0,
        };
    }

    /// Update hover and drag detection. `world` is the pointer's hit on the
    /// ground plane, `None` when the ray misses it.
    pub fn on_pointer_move(
        &mut self,
        screen: ScreenPoint,
        world: Option<DVec3>,
    ) -> Option<GridCell> {
        if let Gesture::Armed { last, travelled } = self.gesture {
            let travelled = travelled + last.distance(&screen);
            self.gesture = if travelled > self.settings.drag_threshold_px {
                tracing::debug!("Gesture became a drag after {travelled:.1}px");
                Gesture::Dragging
            } else {
                Gesture::Armed {
                    last: screen,
                    travelled,
                }
            };
        }

        self.state.hover_cell = world.and_then(|p| self.snap(p));
        self.state.hover_cell
    }

    /// Pointer left the viewport
    pub fn on_pointer_leave(&mut self) {
        self.state.hover_cell = None;
    }

    pub fn on_pointer_up(&mut self, world: Option<DVec3>) -> PointerUpOutcome {
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Idle => PointerUpOutcome::Ignored,
            Gesture::Dragging => PointerUpOutcome::Dragged,
            Gesture::Armed { .. } => match world.and_then(|p| self.snap(p)) {
                Some(cell) => {
                    self.state.placed_object = Some(PlacedObject {
                        object: self.object.clone(),
                        world_x: cell.x,
                        world_y: self.settings.ground_offset,
                        world_z: cell.z,
                    });
                    tracing::info!("Placed object at cell ({}, {})", cell.x, cell.z);
                    PointerUpOutcome::Placed { cell }
                }
                None => PointerUpOutcome::OutOfBounds,
            },
        }
    }

    /// Turn the placed object by 90°. Returns the new yaw, or `None` when
    /// nothing is placed.
    pub fn rotate(&mut self) -> Option<f64> {
        self.state.placed_object.as_ref()?;
        self.state.rotation_y = quarter_turn(self.state.rotation_y);
        Some(self.state.rotation_y)
    }

    /// Footprint to draw under the hover cell, following the current yaw
    pub fn hover_footprint(&self) -> Footprint {
        rotated_footprint(footprint(&self.object.parts), self.state.rotation_y)
    }

    /// Clear everything; the session stays in placement mode.
    pub fn reset(&mut self) {
        self.state = PlacementState::default();
        self.gesture = Gesture::Idle;
    }

    /// Leave placement mode, handing back the final state.
    pub fn leave_placement_mode(self) -> PlacementState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Part, PartKind};
    use std::f64::consts::FRAC_PI_2;

    fn floor_object() -> BuildingObject {
        BuildingObject::new(vec![Part::new(PartKind::Floor, [0.0; 3], [4.0, 0.2, 4.0])])
    }

    fn controller() -> PlacementController {
        PlacementController::new(GridSettings::default(), floor_object())
    }

    fn world(x: f64, z: f64) -> Option<DVec3> {
        Some(DVec3::new(x, 0.0, z))
    }

    #[test]
    fn test_snap_rounds_to_cell_centers() {
        let c = controller();
        assert_eq!(c.snap(DVec3::new(2.3, 5.0, -1.9)), Some(GridCell { x: 2.0, z: -2.0 }));
        assert_eq!(c.snap(DVec3::new(-0.2, 0.0, 0.2)), Some(GridCell { x: 0.0, z: 0.0 }));
        assert_eq!(c.snap(DVec3::new(10.4, 0.0, 0.0)), Some(GridCell { x: 10.0, z: 0.0 }));
        assert_eq!(c.snap(DVec3::new(10.6, 0.0, 0.0)), None);
        assert_eq!(c.snap(DVec3::new(0.0, 0.0, -11.0)), None);
    }

    #[test]
    fn test_snap_with_coarse_cells() {
        let settings = GridSettings {
            cell_size: 2.0,
            half_extent: 4.0,
            ..GridSettings::default()
        };
        let c = PlacementController::new(settings, floor_object());
        assert_eq!(c.snap(DVec3::new(2.9, 0.0, -1.2)), Some(GridCell { x: 2.0, z: -2.0 }));
        assert_eq!(c.snap(DVec3::new(5.1, 0.0, 0.0)), None);
    }

    #[test]
    fn test_hover_follows_pointer_and_clears_out_of_bounds() {
        let mut c = controller();
        assert_eq!(
            c.on_pointer_move(ScreenPoint::new(0.0, 0.0), world(1.2, 3.7)),
            Some(GridCell { x: 1.0, z: 4.0 })
        );
        assert_eq!(c.state().hover_cell, Some(GridCell { x: 1.0, z: 4.0 }));

        assert_eq!(c.on_pointer_move(ScreenPoint::new(1.0, 0.0), world(50.0, 0.0)), None);
        assert_eq!(c.state().hover_cell, None);

        c.on_pointer_move(ScreenPoint::new(2.0, 0.0), world(0.0, 0.0));
        c.on_pointer_move(ScreenPoint::new(3.0, 0.0), None);
        assert_eq!(c.state().hover_cell, None);
        assert!(c.state().placed_object.is_none());
    }

    #[test]
    fn test_click_places_at_snapped_release_point() {
        let mut c = controller();
        c.on_pointer_down(ScreenPoint::new(100.0, 100.0));
        c.on_pointer_move(ScreenPoint::new(102.0, 101.0), world(2.1, -1.8));
        let outcome = c.on_pointer_up(world(2.3, -1.9));

        assert_eq!(outcome, PointerUpOutcome::Placed { cell: GridCell { x: 2.0, z: -2.0 } });
        let placed = c.state().placed_object.as_ref().unwrap();
        assert_eq!((placed.world_x, placed.world_z), (2.0, -2.0));
        assert_eq!(placed.world_y, 1.1);
    }

    #[test]
    fn test_drag_never_places() {
        let mut c = controller();
        c.on_pointer_down(ScreenPoint::new(0.0, 0.0));
        // Small steps that add up past the 6px threshold
        for i in 1..=4 {
            c.on_pointer_move(ScreenPoint::new(2.0 * i as f64, 0.0), world(0.0, 0.0));
        }
        assert!(c.is_dragging());
        assert_eq!(c.on_pointer_up(world(1.0, 1.0)), PointerUpOutcome::Dragged);
        assert!(c.state().placed_object.is_none());
        assert!(!c.is_dragging());
    }

    #[test]
    fn test_back_and_forth_travel_counts_as_drag() {
        let mut c = controller();
        c.on_pointer_down(ScreenPoint::new(0.0, 0.0));
        for x in [4.0, 0.0, 4.0] {
            c.on_pointer_move(ScreenPoint::new(x, 0.0), world(0.0, 0.0));
        }
        assert_eq!(c.on_pointer_up(world(0.0, 0.0)), PointerUpOutcome::Dragged);
    }

    #[test]
    fn test_movement_at_threshold_is_still_a_click() {
        let mut c = controller();
        c.on_pointer_down(ScreenPoint::new(0.0, 0.0));
        c.on_pointer_move(ScreenPoint::new(6.0, 0.0), world(0.0, 0.0));
        assert!(matches!(c.on_pointer_up(world(0.0, 0.0)), PointerUpOutcome::Placed { .. }));
    }

    #[test]
    fn test_out_of_bounds_click_and_stray_release() {
        let mut c = controller();
        assert_eq!(c.on_pointer_up(world(0.0, 0.0)), PointerUpOutcome::Ignored);

        c.on_pointer_down(ScreenPoint::new(0.0, 0.0));
        assert_eq!(c.on_pointer_up(world(30.0, 0.0)), PointerUpOutcome::OutOfBounds);
        c.on_pointer_down(ScreenPoint::new(0.0, 0.0));
        assert_eq!(c.on_pointer_up(None), PointerUpOutcome::OutOfBounds);
        assert!(c.state().placed_object.is_none());
    }

    #[test]
    fn test_rotate_requires_placement_and_is_preserved_on_replace() {
        let mut c = controller();
        assert_eq!(c.rotate(), None);
        assert_eq!(c.state().rotation_y, 0.0);

        c.on_pointer_down(ScreenPoint::new(0.0, 0.0));
        c.on_pointer_up(world(0.0, 0.0));
        let yaw = c.rotate().unwrap();
        assert!((yaw - FRAC_PI_2).abs() < 1e-12);

        // Moving the object keeps its yaw
        c.on_pointer_down(ScreenPoint::new(0.0, 0.0));
        c.on_pointer_up(world(3.0, 3.0));
        assert_eq!(c.state().rotation_y, yaw);
        assert_eq!(c.state().placed_object.as_ref().unwrap().world_x, 3.0);
    }

    #[test]
    fn test_hover_footprint_follows_rotation() {
        let wide = BuildingObject::new(vec![Part::new(PartKind::Floor, [0.0; 3], [6.0, 0.2, 2.0])]);
        let mut c = PlacementController::new(GridSettings::default(), wide);
        assert_eq!(c.hover_footprint().as_array(), [6, 2]);

        c.on_pointer_down(ScreenPoint::new(0.0, 0.0));
        c.on_pointer_up(world(0.0, 0.0));
        c.rotate();
        assert_eq!(c.hover_footprint().as_array(), [2, 6]);
    }

    #[test]
    fn test_placement_record_and_reset() {
        let wide = BuildingObject::new(vec![Part::new(PartKind::Floor, [0.0; 3], [6.0, 0.2, 2.0])]);
        let mut c = PlacementController::new(GridSettings::default(), wide);
        assert!(c.state().placement_record().is_none());

        c.on_pointer_down(ScreenPoint::new(0.0, 0.0));
        c.on_pointer_up(world(-4.4, 2.6));
        let record = c.state().placement_record().unwrap();
        assert_eq!(record.position, [-4.0, 1.1, 3.0]);
        assert_eq!(record.bounding_box, [6.0, 0.2, 2.0]);

        c.rotate();
        let record = c.state().placement_record().unwrap();
        assert_eq!(record.bounding_box, [2.0, 0.2, 6.0]);
        assert!((record.rotation[1] - FRAC_PI_2).abs() < 1e-12);

        let placed = c.state().placed_object.as_ref().unwrap();
        let world_obj = placed.world_object(c.state().rotation_y);
        assert_eq!(world_obj.position, Some([-4.0, 1.1, 3.0]));

        c.reset();
        assert_eq!(*c.state(), PlacementState::default());
    }
}
