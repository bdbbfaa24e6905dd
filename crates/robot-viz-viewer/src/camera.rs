//! Orbit camera for the Z-up viewport

use glam::{DMat4, DVec3};
use robot_viz::scene::BoundingBox;

/// Vertical field of view used by the viewer
pub const DEFAULT_FOV_Y: f64 = 45.0_f64 * std::f64::consts::PI / 180.0;

const MIN_DISTANCE: f64 = 0.01;
const MAX_PITCH: f64 = 1.55;

/// Camera orbiting a target point with +Z up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub target: DVec3,
    pub distance: f64,
    /// Rotation around world Z, radians
    pub yaw: f64,
    /// Elevation above the XY plane, radians
    pub pitch: f64,
    pub fov_y: f64,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: DVec3::new(0.0, 0.0, 0.3),
            distance: 2.0,
            yaw: std::f64::consts::FRAC_PI_4,
            pitch: 0.4,
            fov_y: DEFAULT_FOV_Y,
        }
    }
}

impl OrbitCamera {
    /// Eye position in world space
    pub fn eye(&self) -> DVec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target + self.distance * DVec3::new(cos_pitch * cos_yaw, cos_pitch * sin_yaw, sin_pitch)
    }

    /// Unit vector from the eye towards the target
    pub fn forward(&self) -> DVec3 {
        (self.target - self.eye()).normalize_or_zero()
    }

    pub fn near(&self) -> f64 {
        (self.distance * 0.01).max(1e-4)
    }

    pub fn far(&self) -> f64 {
        self.distance * 100.0 + 10.0
    }

    pub fn view(&self) -> DMat4 {
        DMat4::look_at_rh(self.eye(), self.target, DVec3::Z)
    }

    /// Clip space from world space for a viewport with the given aspect ratio
    pub fn view_projection(&self, aspect: f64) -> DMat4 {
        DMat4::perspective_rh(self.fov_y, aspect.max(1e-6), self.near(), self.far()) * self.view()
    }

    /// Rotate around the target by screen-space drag in points
    pub fn orbit(&mut self, dx: f64, dy: f64) {
        self.yaw -= dx * 0.01;
        self.pitch = (self.pitch + dy * 0.01).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Move the target in the view plane by screen-space drag in points
    pub fn pan(&mut self, dx: f64, dy: f64, viewport_height: f64) {
        let forward = self.forward();
        let right = forward.cross(DVec3::Z).normalize_or_zero();
        let up = right.cross(forward);
        // World units per screen point at the target depth
        let scale = 2.0 * self.distance * (self.fov_y * 0.5).tan() / viewport_height.max(1.0);
        self.target += (-right * dx + up * dy) * scale;
    }

    /// Scroll zoom, positive `delta` moves closer
    pub fn zoom(&mut self, delta: f64) {
        self.distance = (self.distance * (-delta * 0.002).exp()).max(MIN_DISTANCE);
    }

    /// Frame a bounding box so all of it is in view
    pub fn fit_bounds(&mut self, bounds: &BoundingBox) {
        self.target = bounds.center();
        let radius = bounds.radius().max(0.05);
        self.distance = (radius / (self.fov_y * 0.5).sin()).max(MIN_DISTANCE) * 1.1;
    }

    /// React to drag and scroll on the viewport.
    ///
    /// Primary drag orbits, secondary or middle drag pans, scroll zooms.
    pub fn handle_input(&mut self, response: &egui::Response, ui: &egui::Ui) {
        let delta = response.drag_delta();
        if response.dragged_by(egui::PointerButton::Primary) {
            self.orbit(delta.x as f64, delta.y as f64);
        } else if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan(delta.x as f64, delta.y as f64, response.rect.height() as f64);
        }

        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                self.zoom(scroll as f64);
            }
        }
    }
}
