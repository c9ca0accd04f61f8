//! Six-view capture: framing math, sequential rendering, camera restoration.
//!
//! The renderer's camera is borrowed exclusively for the whole capture and
//! held through a [`CameraGuard`], which puts the saved pose back when it is
//! dropped. Early returns, errors and unwinding all pass through that drop.

use std::ops::{Deref, DerefMut};

use base64::Engine as _;
use glam::DVec3;
use serde::Serialize;
use shared::{ImagePayload, ViewImages, ViewName};
use thiserror::Error;

use crate::geometry::Aabb;
use crate::settings::CaptureSettings;

/// Camera pose: position, look-at point (orientation) and up vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraPose {
    pub position: DVec3,
    pub target: DVec3,
    pub up: DVec3,
}

impl CameraPose {
    pub fn look_at(position: DVec3, target: DVec3, up: DVec3) -> Self {
        Self {
            position,
            target,
            up,
        }
    }
}

/// What a capture frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTarget {
    /// One placed object by id
    Object(String),
    /// Everything currently in the scene
    Scene,
}

impl std::fmt::Display for CaptureTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureTarget::Object(id) => write!(f, "object {id}"),
            CaptureTarget::Scene => write!(f, "scene"),
        }
    }
}

/// Encoded frame read back from the render target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFrame {
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl RenderedFrame {
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            media_type: "image/png".to_string(),
            bytes,
        }
    }

    pub fn into_payload(self) -> ImagePayload {
        ImagePayload {
            media_type: self.media_type,
            data: base64::engine::general_purpose::STANDARD.encode(&self.bytes),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("render failed: {0}")]
    Render(String),
    #[error("frame readback failed: {0}")]
    Readback(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CaptureError {
    #[error("invalid vertical field of view: {0} rad")]
    InvalidFov(f64),
    #[error("nothing to capture for {0}")]
    UnknownTarget(String),
    #[error("capture of the {view} view failed: {source}")]
    View {
        view: &'static str,
        #[source]
        source: RenderError,
    },
}

/// What the capture needs from the 3D renderer
pub trait CaptureRenderer {
    fn camera_pose(&self) -> CameraPose;
    fn set_camera_pose(&mut self, pose: &CameraPose);
    /// Vertical field of view (radians)
    fn vertical_fov(&self) -> f64;
    /// Current world bounds of a target; `None` when the target is unknown
    fn target_bounds(&self, target: &CaptureTarget) -> Option<Aabb>;
    /// Render one frame synchronously with the current camera
    fn render(&mut self) -> Result<(), RenderError>;
    /// Read back the last rendered frame
    fn read_frame(&mut self) -> Result<RenderedFrame, RenderError>;
}

/// Exclusive hold on a renderer's camera; restores the saved pose on drop.
pub struct CameraGuard<'a, R: CaptureRenderer + ?Sized> {
    renderer: &'a mut R,
    saved: CameraPose,
}

impl<'a, R: CaptureRenderer + ?Sized> CameraGuard<'a, R> {
    pub fn acquire(renderer: &'a mut R) -> Self {
        let saved = renderer.camera_pose();
        Self { renderer, saved }
    }
}

impl<R: CaptureRenderer + ?Sized> Deref for CameraGuard<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        self.renderer
    }
}

impl<R: CaptureRenderer + ?Sized> DerefMut for CameraGuard<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        self.renderer
    }
}

impl<R: CaptureRenderer + ?Sized> Drop for CameraGuard<'_, R> {
    fn drop(&mut self) {
        self.renderer.set_camera_pose(&self.saved);
        tracing::debug!("Camera restored to {:?}", self.saved.position);
    }
}

/// All six views, each with exactly one image
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureViewSet {
    images: ViewImages,
}

impl CaptureViewSet {
    /// `None` unless every view is present
    pub fn from_images(images: ViewImages) -> Option<Self> {
        ViewName::ALL
            .iter()
            .all(|v| images.contains_key(v))
            .then_some(Self { images })
    }

    pub fn get(&self, view: ViewName) -> Option<&ImagePayload> {
        self.images.get(&view)
    }

    pub fn images(&self) -> &ViewImages {
        &self.images
    }

    pub fn into_images(self) -> ViewImages {
        self.images
    }
}

/// Unit direction from the center toward the camera for a view
pub fn view_direction(view: ViewName) -> DVec3 {
    match view {
        ViewName::Top => DVec3::Y,
        ViewName::Bottom => DVec3::NEG_Y,
        ViewName::Left => DVec3::NEG_X,
        ViewName::Right => DVec3::X,
        ViewName::Front => DVec3::Z,
        ViewName::Back => DVec3::NEG_Z,
    }
}

/// Up vector for a view; vertical views cannot use +Y.
pub fn view_up(view: ViewName) -> DVec3 {
    match view {
        // Looking down, the front of the object faces the bottom of the frame
        ViewName::Top => DVec3::NEG_Z,
        ViewName::Bottom => DVec3::Z,
        _ => DVec3::Y,
    }
}

/// Frames an object from the six canonical directions
pub struct ViewCaptureScheduler {
    settings: CaptureSettings,
}

impl ViewCaptureScheduler {
    pub fn new(settings: CaptureSettings) -> Self {
        Self { settings }
    }

    /// Look-at center and camera distance for `bounds`.
    /// Empty, non-finite or zero-size bounds use the fallback framing.
    pub fn framing(&self, bounds: &Aabb, fov: f64) -> Result<(DVec3, f64), CaptureError> {
        if !(fov.is_finite() && fov > 0.0 && fov < std::f64::consts::PI) {
            return Err(CaptureError::InvalidFov(fov));
        }

        let max_dim = bounds.max_dimension();
        if bounds.is_empty() || !bounds.is_finite() || !(max_dim > 0.0 && max_dim.is_finite()) {
            tracing::debug!("Unusable bounds {bounds:?}, using fallback framing");
            return Ok((
                DVec3::from_array(self.settings.fallback_center),
                self.settings.fallback_distance,
            ));
        }

        let distance = (max_dim / 2.0) / (fov / 2.0).tan() * self.settings.padding;
        Ok((bounds.center(), distance))
    }

    /// Camera poses for the six views, in capture order
    pub fn plan_views(
        &self,
        bounds: &Aabb,
        fov: f64,
    ) -> Result<[(ViewName, CameraPose); 6], CaptureError> {
        let (center, distance) = self.framing(bounds, fov)?;
        Ok(ViewName::ALL.map(|view| {
            let position = center + view_direction(view) * distance;
            (view, CameraPose::look_at(position, center, view_up(view)))
        }))
    }

    /// Render the six views one after another. All-or-nothing: the first
    /// failing view fails the whole call. The camera is restored either way.
    pub fn capture<R: CaptureRenderer + ?Sized>(
        &self,
        renderer: &mut R,
        bounds: &Aabb,
    ) -> Result<CaptureViewSet, CaptureError> {
        let poses = self.plan_views(bounds, renderer.vertical_fov())?;

        let mut camera = CameraGuard::acquire(renderer);
        let mut images = ViewImages::new();
        for (view, pose) in poses {
            let fail = |source| CaptureError::View {
                view: view.as_str(),
                source,
            };
            camera.set_camera_pose(&pose);
            camera.render().map_err(fail)?;
            let frame = camera.read_frame().map_err(fail)?;
            images.insert(view, frame.into_payload());
        }
        drop(camera);

        tracing::info!("Captured {} views", images.len());
        Ok(CaptureViewSet { images })
    }

    /// Capture a target using the bounds the renderer reports for it
    pub fn capture_target<R: CaptureRenderer + ?Sized>(
        &self,
        renderer: &mut R,
        target: &CaptureTarget,
    ) -> Result<CaptureViewSet, CaptureError> {
        let bounds = renderer
            .target_bounds(target)
            .ok_or_else(|| CaptureError::UnknownTarget(target.to_string()))?;
        self.capture(renderer, &bounds)
    }
}
