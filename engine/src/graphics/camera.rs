//! Perspective camera with pointer-driven orientation
//!
//! Orientation is stored both as a unit facing direction and as yaw/pitch
//! angles in degrees. Pitch stays within [-89, 89] so the view never flips
//! over the poles, and yaw is kept in (-360, 0] so it cannot grow without
//! bound and lose precision.

use bitflags::bitflags;
use glam::{Mat4, Vec2, Vec3};
use tracing::warn;

/// Largest pitch magnitude in degrees
pub const PITCH_LIMIT: f32 = 89.0;

/// Anything the renderer can view a scene through
pub trait CameraProjection {
    fn view_matrix(&self) -> Mat4;
    fn projection_matrix(&self) -> Mat4;
    /// World-space eye position
    fn position(&self) -> Vec3;

    /// Projection times view, the matrix uploaded as the camera matrix
    fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

bitflags! {
    /// Movement keys held during a frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MovementKeys: u8 {
        const FORWARD  = 1 << 0;
        const BACKWARD = 1 << 1;
        const LEFT     = 1 << 2;
        const RIGHT    = 1 << 3;
        const UP       = 1 << 4;
        const DOWN     = 1 << 5;
    }
}

/// Input snapshot consumed by [`Camera::update`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraInput {
    /// Cursor position in window coordinates, y pointing down
    pub cursor: Vec2,
    pub keys: MovementKeys,
}

/// Wrap a yaw angle into (-360, 0]
pub fn wrap_yaw(yaw: f32) -> f32 {
    let wrapped = yaw + 360.0 * (yaw / -360.0).floor();
    if wrapped <= -360.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Unit direction for yaw and pitch in degrees
pub fn direction_from_angles(yaw: f32, pitch: f32) -> Vec3 {
    let (yaw, pitch) = (yaw.to_radians(), pitch.to_radians());
    Vec3::new(pitch.cos() * yaw.cos(), pitch.sin(), pitch.cos() * yaw.sin()).normalize()
}

/// First-person perspective camera
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    direction: Vec3,
    yaw: f32,
    pitch: f32,
    /// Vertical field of view in degrees
    fov: f32,
    viewport: Vec2,
    near: f32,
    far: f32,
    sensitivity: f32,
    speed: f32,
    input_enabled: bool,
    prev_cursor: Option<Vec2>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec2::new(1280.0, 720.0), Vec3::NEG_Z, 45.0)
    }
}

impl Camera {
    /// Camera at `position` looking along `direction`
    ///
    /// Input starts disabled; sensitivity is 0.14 degrees per pixel and speed
    /// one unit per second.
    pub fn new(position: Vec3, viewport: Vec2, direction: Vec3, fov: f32) -> Self {
        let mut camera = Self {
            position,
            direction: Vec3::NEG_Z,
            yaw: -90.0,
            pitch: 0.0,
            fov,
            viewport,
            near: 0.1,
            far: 1000.0,
            sensitivity: 0.14,
            speed: 1.0,
            input_enabled: false,
            prev_cursor: None,
        };
        camera.set_direction(direction);
        camera
    }

    pub fn with_input(mut self, enabled: bool) -> Self {
        self.input_enabled = enabled;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn with_clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Face along `direction`, re-deriving yaw and pitch from it
    ///
    /// The next [`update_orientation`](Self::update_orientation) call only
    /// records the cursor baseline. A zero vector is ignored.
    pub fn set_direction(&mut self, direction: Vec3) {
        let Some(direction) = direction.try_normalize() else {
            warn!("Ignoring zero-length camera direction");
            return;
        };

        let pitch = direction.dot(Vec3::Y).clamp(-1.0, 1.0).asin().to_degrees();
        self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);

        // Straight up or down leaves yaw undefined; keep the previous one
        if let Some(horizontal) = Vec3::new(direction.x, 0.0, direction.z).try_normalize() {
            self.yaw = wrap_yaw(horizontal.z.atan2(horizontal.x).to_degrees());
        }

        self.direction = if self.pitch == pitch {
            direction
        } else {
            direction_from_angles(self.yaw, self.pitch)
        };
        self.prev_cursor = None;
    }

    /// Rotate by the cursor movement since the previous call
    ///
    /// Moving right turns right and moving up looks up. The first call after
    /// construction or a direction change only records the baseline.
    pub fn update_orientation(&mut self, cursor: Vec2) {
        let Some(prev) = self.prev_cursor.replace(cursor) else {
            return;
        };
        let offset = Vec2::new(cursor.x - prev.x, prev.y - cursor.y) * self.sensitivity;
        self.rotate(offset.x, offset.y);
    }

    /// Add to yaw and pitch in degrees and rebuild the facing direction
    pub fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw = wrap_yaw(self.yaw + yaw_delta);
        self.pitch = (self.pitch + pitch_delta).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.direction = direction_from_angles(self.yaw, self.pitch);
    }

    /// Apply one frame of input: movement first, then orientation
    ///
    /// Does nothing while input is disabled.
    pub fn update(&mut self, input: &CameraInput, dt: f32) {
        if !self.input_enabled {
            return;
        }
        self.update_position(input.keys, dt);
        self.update_orientation(input.cursor);
    }

    fn update_position(&mut self, keys: MovementKeys, dt: f32) {
        let step = self.speed * dt;
        let horizontal = Vec3::new(self.direction.x, 0.0, self.direction.z);
        let right = self.direction.cross(Vec3::Y);

        if keys.contains(MovementKeys::FORWARD) {
            self.position += horizontal * step;
        } else if keys.contains(MovementKeys::BACKWARD) {
            self.position -= horizontal * step;
        }

        if keys.contains(MovementKeys::LEFT) {
            self.position -= right * step;
        } else if keys.contains(MovementKeys::RIGHT) {
            self.position += right * step;
        }

        if keys.contains(MovementKeys::UP) {
            self.position += Vec3::Y * step;
        } else if keys.contains(MovementKeys::DOWN) {
            self.position -= Vec3::Y * step;
        }
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Vertical field of view in degrees
    pub fn set_fov(&mut self, degrees: f32) {
        self.fov = degrees;
    }

    pub fn set_viewport_size(&mut self, size: Vec2) {
        self.viewport = size;
    }

    pub fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity;
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn viewport_size(&self) -> Vec2 {
        self.viewport
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    /// Width divided by height, 1 for a degenerate viewport
    pub fn aspect_ratio(&self) -> f32 {
        if self.viewport.y > 0.0 {
            self.viewport.x / self.viewport.y
        } else {
            1.0
        }
    }
}

impl CameraProjection for Camera {
    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.direction, Vec3::Y)
    }

    fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov.to_radians(), self.aspect_ratio(), self.near, self.far)
    }

    fn position(&self) -> Vec3 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn input_camera() -> Camera {
        Camera::default().with_input(true)
    }

    #[test]
    fn test_default_faces_negative_z() {
        let camera = Camera::default();
        assert!((camera.yaw() + 90.0).abs() < EPSILON);
        assert_eq!(camera.pitch(), 0.0);
        assert!(camera.direction().distance(Vec3::NEG_Z) < EPSILON);
    }

    #[test]
    fn test_set_direction_derives_angles() {
        let mut camera = Camera::default();

        camera.set_direction(Vec3::Z);
        assert!((camera.yaw() + 270.0).abs() < EPSILON);

        camera.set_direction(Vec3::new(1.0, 1.0, 0.0));
        assert!((camera.pitch() - 45.0).abs() < EPSILON);
        assert!(camera.yaw().abs() < EPSILON);
        assert!((camera.direction().length() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_set_direction_matches_angles() {
        let mut camera = Camera::default();
        for (yaw, pitch) in [(-1.0, 0.0), (-179.5, 10.0), (-180.0, -30.0), (-359.0, 60.0), (0.0, 0.0)] {
            camera.set_direction(direction_from_angles(yaw, pitch));
            assert!((camera.yaw() - yaw).abs() < EPSILON, "yaw {yaw} became {}", camera.yaw());
            assert!((camera.pitch() - pitch).abs() < EPSILON);
        }
    }

    #[test]
    fn test_set_direction_clamps_vertical() {
        let mut camera = Camera::default();
        camera.set_direction(Vec3::Y * 5.0);
        assert_eq!(camera.pitch(), PITCH_LIMIT);
        assert!((camera.yaw() + 90.0).abs() < EPSILON);
        assert!((camera.direction().length() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_first_update_only_records_baseline() {
        let mut camera = input_camera();
        let before = camera.direction();

        camera.update_orientation(Vec2::new(500.0, 300.0));
        assert_eq!(camera.direction(), before);

        camera.update_orientation(Vec2::new(510.0, 300.0));
        assert!((camera.yaw() - (-90.0 + 10.0 * 0.14)).abs() < EPSILON);
    }

    #[test]
    fn test_pitch_clamped() {
        let mut camera = input_camera();
        camera.update_orientation(Vec2::new(0.0, 0.0));
        camera.update_orientation(Vec2::new(0.0, -10_000.0));
        assert_eq!(camera.pitch(), PITCH_LIMIT);

        camera.update_orientation(Vec2::new(0.0, 20_000.0));
        assert_eq!(camera.pitch(), -PITCH_LIMIT);
    }

    #[test]
    fn test_yaw_stays_wrapped() {
        let mut camera = input_camera();
        let mut cursor = Vec2::ZERO;
        camera.update_orientation(cursor);

        for step in 0..500 {
            cursor.x += if step % 3 == 0 { -733.0 } else { 911.0 };
            cursor.y += 17.0;
            camera.update_orientation(cursor);

            assert!(camera.yaw() > -360.0 && camera.yaw() <= 0.0, "yaw {}", camera.yaw());
            assert!(camera.pitch().abs() <= PITCH_LIMIT);
            assert!((camera.direction().length() - 1.0).abs() < EPSILON);
        }
    }

    #[test]
    fn test_wrap_yaw() {
        assert_eq!(wrap_yaw(-10.0), -10.0);
        assert_eq!(wrap_yaw(10.0), -350.0);
        assert_eq!(wrap_yaw(-360.0), 0.0);
        assert_eq!(wrap_yaw(-725.0), -5.0);
        assert!(wrap_yaw(1e-9) > -360.0);
    }

    #[test]
    fn test_update_ignored_without_input() {
        let mut camera = Camera::default();
        let input = CameraInput {
            cursor: Vec2::new(100.0, 100.0),
            keys: MovementKeys::FORWARD,
        };
        camera.update(&input, 1.0);
        camera.update(&input, 1.0);
        assert_eq!(camera.position(), Vec3::ZERO);
    }

    #[test]
    fn test_movement_along_horizontal_direction() {
        let mut camera = input_camera().with_speed(2.0);
        camera.set_direction(Vec3::new(0.0, 1.0, -1.0));

        let input = CameraInput {
            cursor: Vec2::ZERO,
            keys: MovementKeys::FORWARD | MovementKeys::RIGHT,
        };
        camera.update(&input, 0.5);

        let position = camera.position();
        assert_eq!(position.y, 0.0);
        assert!(position.z < 0.0);
        assert!(position.x > 0.0);
    }

    #[test]
    fn test_forward_wins_over_backward() {
        let mut camera = input_camera();
        let input = CameraInput {
            cursor: Vec2::ZERO,
            keys: MovementKeys::FORWARD | MovementKeys::BACKWARD | MovementKeys::UP,
        };
        camera.update(&input, 1.0);
        assert!(camera.position().z < 0.0);
        assert!((camera.position().y - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_camera_perspective_projection() {
        let camera = Camera::default();
        let proj = camera.projection_matrix();

        // Perspective projection has w=0 in the last row
        assert_eq!(proj.w_axis.w, 0.0);
        assert!(proj.z_axis.z < 0.0);
    }

    #[test]
    fn test_view_matrix() {
        let mut camera = Camera::default();
        camera.set_position(Vec3::new(0.0, 0.0, 5.0));

        let view = camera.view_matrix();

        // View matrix should translate in opposite direction
        assert!((view.w_axis.z + 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_degenerate_viewport() {
        let mut camera = Camera::default();
        camera.set_viewport_size(Vec2::new(800.0, 0.0));
        assert_eq!(camera.aspect_ratio(), 1.0);
    }
}
