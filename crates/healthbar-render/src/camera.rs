//! Perspective camera and world-to-screen projection.
//!
//! Screen coordinates have their origin at the top-left corner with Y
//! increasing downward. The third component of a projected point is the
//! view-space depth: negative for points behind the camera.

use glam::{DVec3, Mat4, Vec3, Vec4Swizzles};

/// Default vertical field of view in radians (70°).
pub const DEFAULT_FOV_Y: f32 = 70.0 * std::f32::consts::PI / 180.0;

/// Default near plane distance.
pub const DEFAULT_NEAR: f32 = 0.05;

/// Default far plane distance.
pub const DEFAULT_FAR: f32 = 512.0;

/// Maps world points onto the screen.
pub trait ScreenProjector {
    /// Projects a world point to `(x, y, depth)` in screen pixels.
    fn project_to_screen(&self, world_point: DVec3) -> Vec3;
}

/// First-person perspective camera.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Eye position in world coordinates.
    pub position: DVec3,
    /// Heading in radians; forward is `(sin yaw, 0, cos yaw)` at zero pitch.
    pub yaw: f32,
    /// Pitch in radians, positive looks up.
    pub pitch: f32,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Near plane distance.
    pub near: f32,
    /// Far plane distance.
    pub far: f32,
    /// Viewport size in pixels (width, height).
    pub viewport_size: (u32, u32),
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            fov_y: DEFAULT_FOV_Y,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            viewport_size: (1280, 720),
        }
    }
}

impl Camera {
    /// Creates a camera with the given viewport size.
    #[must_use]
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            viewport_size: (viewport_width, viewport_height),
            ..Self::default()
        }
    }

    /// Sets the viewport size.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport_size = (width, height);
    }

    /// Places the eye and orientation.
    pub fn look(&mut self, position: DVec3, yaw: f32, pitch: f32) {
        self.position = position;
        self.yaw = yaw;
        self.pitch = pitch;
    }

    /// Unit view direction.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(sy * cp, sp, cy * cp).normalize_or_zero()
    }

    /// Width over height; 1 for a degenerate viewport.
    #[must_use]
    pub fn aspect(&self) -> f32 {
        let (w, h) = self.viewport_size;
        if h == 0 {
            1.0
        } else {
            w as f32 / h as f32
        }
    }

    /// View matrix relative to the eye; the eye sits at the origin so large
    /// world coordinates keep their precision.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(Vec3::ZERO, self.forward(), Vec3::Y)
    }

    /// Projection matrix.
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect(), self.near, self.far)
    }

    /// Combined view-projection matrix.
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

impl ScreenProjector for Camera {
    fn project_to_screen(&self, world_point: DVec3) -> Vec3 {
        let rel = (world_point - self.position).as_vec3();
        let clip = self.view_projection() * rel.extend(1.0);

        // w is the distance along the view direction
        if clip.w <= f32::EPSILON {
            return Vec3::new(0.0, 0.0, clip.w.min(-f32::EPSILON));
        }

        let ndc = clip.xyz() / clip.w;
        let (w, h) = self.viewport_size;
        let x = (ndc.x * 0.5 + 0.5) * w as f32;
        let y = (0.5 - ndc.y * 0.5) * h as f32;
        Vec3::new(x, y, clip.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_of_view() {
        let camera = Camera::new(800, 600);
        let p = camera.project_to_screen(DVec3::new(0.0, 0.0, 10.0));
        assert!((p.x - 400.0).abs() < 1e-3);
        assert!((p.y - 300.0).abs() < 1e-3);
        assert!((p.z - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_behind_camera_has_negative_depth() {
        let camera = Camera::new(800, 600);
        assert!(camera.project_to_screen(DVec3::new(0.0, 0.0, -5.0)).z < 0.0);
        assert!(camera.project_to_screen(DVec3::new(3.0, 0.0, 0.0)).z < 0.0);
    }

    #[test]
    fn test_screen_y_grows_downward() {
        let camera = Camera::new(800, 600);
        let above = camera.project_to_screen(DVec3::new(0.0, 2.0, 10.0));
        let below = camera.project_to_screen(DVec3::new(0.0, -2.0, 10.0));
        assert!(above.y < 300.0);
        assert!(below.y > 300.0);
    }

    #[test]
    fn test_yaw_turns_view() {
        let mut camera = Camera::new(800, 600);
        camera.look(DVec3::new(100.0, 64.0, 100.0), std::f32::consts::FRAC_PI_2, 0.0);
        // Yaw of 90° looks down +X
        let p = camera.project_to_screen(DVec3::new(110.0, 64.0, 100.0));
        assert!((p.x - 400.0).abs() < 1e-2);
        assert!((p.z - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_degenerate_viewport_aspect() {
        let camera = Camera::new(800, 0);
        assert_eq!(camera.aspect(), 1.0);
    }
}
