//! Headless placement harness.
//!
//! Drives a [`PlacementController`] from screen coordinates the way the
//! viewport would, using a top-down orthographic view of the grid instead of
//! a real camera.

use glam::DVec3;
use shared::{BuildingObject, PlacementRecord, ValidationError};

use crate::geometry::{ray_ground_plane, Footprint, Ray};
use crate::i18n::{t, Lang};
use crate::placement::{PlacementController, PlacementState, PointerUpOutcome, ScreenPoint};
use crate::settings::GridSettings;

/// Top-down orthographic view: the viewport center looks at the world origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopDownView {
    pub width_px: f64,
    pub height_px: f64,
    pub pixels_per_unit: f64,
    /// Camera height above the ground plane
    pub eye_height: f64,
}

impl Default for TopDownView {
    fn default() -> Self {
        Self {
            width_px: 800.0,
            height_px: 600.0,
            pixels_per_unit: 20.0,
            eye_height: 50.0,
        }
    }
}

impl TopDownView {
    fn contains(&self, screen: ScreenPoint) -> bool {
        (0.0..=self.width_px).contains(&screen.x) && (0.0..=self.height_px).contains(&screen.y)
    }

    /// Pick ray through a pixel; None outside the viewport.
    pub fn ray(&self, screen: ScreenPoint) -> Option<Ray> {
        if !self.contains(screen) || self.pixels_per_unit <= 0.0 {
            return None;
        }
        let x = (screen.x - self.width_px / 2.0) / self.pixels_per_unit;
        let z = (screen.y - self.height_px / 2.0) / self.pixels_per_unit;
        Some(Ray {
            origin: DVec3::new(x, self.eye_height, z),
            direction: DVec3::NEG_Y,
        })
    }

    /// Inverse of [`TopDownView::ray`] for a ground point.
    pub fn world_to_screen(&self, x: f64, z: f64) -> ScreenPoint {
        ScreenPoint::new(
            x * self.pixels_per_unit + self.width_px / 2.0,
            z * self.pixels_per_unit + self.height_px / 2.0,
        )
    }
}

/// Headless placement session: one object, one controller, one view
pub struct PlacementHarness {
    view: TopDownView,
    settings: GridSettings,
    controller: PlacementController,
    language: Lang,
}

impl PlacementHarness {
    /// Session with the canonical floor object and default settings.
    pub fn new() -> Self {
        Self::with_settings(GridSettings::default(), TopDownView::default())
    }

    pub fn with_settings(settings: GridSettings, view: TopDownView) -> Self {
        Self {
            view,
            controller: PlacementController::new(
                settings.clone(),
                BuildingObject::canonical_default(),
            ),
            settings,
            language: Lang::default(),
        }
    }

    // ── Session ───────────────────────────────────────────────

    /// Start a fresh placement session for `object`.
    pub fn load_object(&mut self, object: BuildingObject) -> Result<(), ValidationError> {
        object.validate()?;
        self.controller = PlacementController::new(self.settings.clone(), object);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.controller.reset();
    }

    pub fn set_language(&mut self, language: Lang) {
        self.language = language;
    }

    // ── Pointer input ─────────────────────────────────────────

    fn ground_hit(&self, screen: ScreenPoint) -> Option<DVec3> {
        self.view.ray(screen).and_then(|ray| ray_ground_plane(&ray, 0.0))
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.controller.on_pointer_down(ScreenPoint::new(x, y));
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> Option<[f64; 2]> {
        let screen = ScreenPoint::new(x, y);
        let hit = self.ground_hit(screen);
        self.controller.on_pointer_move(screen, hit).map(|c| [c.x, c.z])
    }

    /// Pointer left the viewport; the hover highlight goes away.
    pub fn pointer_leave(&mut self) {
        self.controller.on_pointer_leave();
    }

    pub fn pointer_up(&mut self, x: f64, y: f64) -> PointerUpOutcome {
        let hit = self.ground_hit(ScreenPoint::new(x, y));
        self.controller.on_pointer_up(hit)
    }

    /// Press and release at the same pixel
    pub fn click(&mut self, x: f64, y: f64) -> PointerUpOutcome {
        self.pointer_down(x, y);
        self.pointer_up(x, y)
    }

    /// Click on the pixel above a ground point
    pub fn click_world(&mut self, x: f64, z: f64) -> PointerUpOutcome {
        let screen = self.view.world_to_screen(x, z);
        self.click(screen.x, screen.y)
    }

    pub fn rotate(&mut self) -> Option<f64> {
        self.controller.rotate()
    }

    // ── Inspection ────────────────────────────────────────────

    pub fn view(&self) -> &TopDownView {
        &self.view
    }

    pub fn state(&self) -> &PlacementState {
        self.controller.state()
    }

    pub fn object(&self) -> &BuildingObject {
        self.controller.object()
    }

    pub fn hover_footprint(&self) -> Footprint {
        self.controller.hover_footprint()
    }

    pub fn placement_record(&self) -> Option<PlacementRecord> {
        self.controller.state().placement_record()
    }

    pub fn is_placed(&self) -> bool {
        self.controller.state().placed_object.is_some()
    }

    /// Status-bar hint for the current state
    pub fn hint(&self) -> &'static str {
        if self.is_placed() {
            t(self.language, "place.rotate_hint")
        } else {
            t(self.language, "place.hint")
        }
    }

    pub fn message(&self, key: &str) -> &'static str {
        t(self.language, key)
    }
}

impl Default for PlacementHarness {
    fn default() -> Self {
        Self::new()
    }
}
