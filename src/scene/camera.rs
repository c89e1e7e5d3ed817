use glam::{Mat4, Vec3};

pub const DEFAULT_YAW: f32 = -90.0;
pub const DEFAULT_PITCH: f32 = 0.0;
pub const DEFAULT_SPEED: f32 = 2.5;
pub const DEFAULT_SENSITIVITY: f32 = 0.1;
pub const DEFAULT_ZOOM: f32 = 45.0;

const PITCH_LIMIT: f32 = 89.0;
const MIN_ZOOM: f32 = 1.0;
const MAX_ZOOM: f32 = 45.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

/// Free-fly camera driven by keyboard, cursor and scroll deltas.
///
/// Every update is a pure function of the previous state and its inputs,
/// so replaying the same input sequence yields the same view matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub world_up: Vec3,
    pub yaw: f32,   // degrees, around Y
    pub pitch: f32, // degrees, around the camera's right axis
    pub zoom: f32,  // vertical field of view in degrees
    pub speed: f32,
    pub sensitivity: f32,
    front: Vec3,
    right: Vec3,
    up: Vec3,
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        let mut camera = Self {
            position,
            world_up: Vec3::Y,
            yaw: DEFAULT_YAW,
            pitch: DEFAULT_PITCH,
            zoom: DEFAULT_ZOOM,
            speed: DEFAULT_SPEED,
            sensitivity: DEFAULT_SENSITIVITY,
            front: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
        };
        camera.update_vectors();
        camera
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// wgpu clip space, depth in 0..1.
    pub fn projection_matrix(&self, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::perspective_rh(self.zoom.to_radians(), aspect, near, far)
    }

    pub fn process_keyboard(&mut self, direction: Direction, dt: f32) {
        let velocity = self.speed * dt;
        match direction {
            Direction::Forward => self.position += self.front * velocity,
            Direction::Backward => self.position -= self.front * velocity,
            Direction::Left => self.position -= self.right * velocity,
            Direction::Right => self.position += self.right * velocity,
        }
    }

    /// `dy` is positive when the cursor moves up.
    pub fn process_mouse_movement(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch = (self.pitch + dy * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    pub fn process_mouse_scroll(&mut self, dy: f32) {
        self.zoom = (self.zoom - dy).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    fn update_vectors(&mut self) {
        let (yaw_sin, yaw_cos) = self.yaw.to_radians().sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.to_radians().sin_cos();
        self.front = Vec3::new(yaw_cos * pitch_cos, pitch_sin, yaw_sin * pitch_cos).normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_camera_initialization() {
        let camera = Camera::new(Vec3::new(0.0, 1.0, 5.0));
        assert_eq!(camera.position, Vec3::new(0.0, 1.0, 5.0));
        assert_eq!(camera.yaw, -90.0);
        assert_eq!(camera.pitch, 0.0);
        assert_eq!(camera.zoom, 45.0);
        assert_eq!(camera.speed, 2.5);
        assert_eq!(camera.sensitivity, 0.1);
    }

    #[test]
    fn test_basis_vectors() {
        let mut camera = Camera::new(Vec3::ZERO);

        // Looking along -Z (default)
        assert_relative_eq!(camera.front().z, -1.0, epsilon = 0.001);
        assert_relative_eq!(camera.right().x, 1.0, epsilon = 0.001);
        assert_relative_eq!(camera.up().y, 1.0, epsilon = 0.001);

        // Look right (+X)
        camera.process_mouse_movement(900.0, 0.0);
        assert_relative_eq!(camera.yaw, 0.0, epsilon = 0.001);
        assert_relative_eq!(camera.front().x, 1.0, epsilon = 0.001);
        assert_relative_eq!(camera.right().z, 1.0, epsilon = 0.001);
    }

    #[test]
    fn test_keyboard_moves_along_basis() {
        let dt = 1.0;

        let mut camera = Camera::new(Vec3::ZERO);
        camera.process_keyboard(Direction::Forward, dt);
        assert_relative_eq!(camera.position.z, -2.5, epsilon = 0.001);

        let mut camera = Camera::new(Vec3::ZERO);
        camera.process_keyboard(Direction::Right, dt);
        assert_relative_eq!(camera.position.x, 2.5, epsilon = 0.001);

        let mut camera = Camera::new(Vec3::ZERO);
        camera.process_keyboard(Direction::Left, 0.5);
        camera.process_keyboard(Direction::Backward, 0.5);
        assert_relative_eq!(camera.position.x, -1.25, epsilon = 0.001);
        assert_relative_eq!(camera.position.z, 1.25, epsilon = 0.001);
    }

    #[test]
    fn test_forward_follows_pitch() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.process_mouse_movement(0.0, 300.0); // 30 degrees up
        camera.process_keyboard(Direction::Forward, 1.0);
        assert!(camera.position.y > 0.0);
        assert_relative_eq!(camera.position.length(), 2.5, epsilon = 0.001);
    }

    #[test]
    fn test_mouse_movement() {
        let mut camera = Camera::new(Vec3::ZERO);

        camera.process_mouse_movement(100.0, 0.0);
        assert_relative_eq!(camera.yaw, -80.0, epsilon = 0.001); // 0.1 sensitivity

        camera.process_mouse_movement(0.0, 100.0);
        assert_relative_eq!(camera.pitch, 10.0, epsilon = 0.001);

        camera.process_mouse_movement(0.0, -100.0);
        assert_relative_eq!(camera.pitch, 0.0, epsilon = 0.001);

        // Test pitch clamping with large movements
        camera.process_mouse_movement(0.0, 5000.0);
        assert_relative_eq!(camera.pitch, 89.0, epsilon = 0.001);

        camera.process_mouse_movement(0.0, -5000.0);
        assert_relative_eq!(camera.pitch, -89.0, epsilon = 0.001);
    }

    #[test]
    fn test_scroll_clamps_zoom() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.process_mouse_scroll(-10.0);
        assert_eq!(camera.zoom, 45.0);
        camera.process_mouse_scroll(20.0);
        assert_eq!(camera.zoom, 25.0);
        camera.process_mouse_scroll(100.0);
        assert_eq!(camera.zoom, 1.0);
    }

    #[test]
    fn test_identical_inputs_give_identical_views() {
        fn replay() -> Mat4 {
            let mut camera = Camera::new(Vec3::new(0.0, 1.0, 5.0));
            let steps = [
                (Direction::Forward, 0.016, 3.0, -1.5, 0.0),
                (Direction::Left, 0.017, -12.0, 4.0, 1.0),
                (Direction::Forward, 0.033, 0.5, 0.25, 0.0),
                (Direction::Right, 0.016, 40.0, -20.0, -2.0),
            ];
            for (direction, dt, dx, dy, scroll) in steps {
                camera.process_keyboard(direction, dt);
                camera.process_mouse_movement(dx, dy);
                camera.process_mouse_scroll(scroll);
            }
            camera.projection_matrix(4.0 / 3.0, 0.1, 100.0) * camera.view_matrix()
        }
        assert_eq!(replay(), replay());
    }

    #[test]
    fn test_projection_depth_range() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 5.0));
        let view_proj = camera.projection_matrix(1.0, 0.1, 100.0) * camera.view_matrix();

        let origin = view_proj.project_point3(Vec3::ZERO);
        assert!(origin.z > 0.0 && origin.z < 1.0, "got {}", origin.z);

        let near = view_proj.project_point3(Vec3::new(0.0, 0.0, 4.9));
        assert_relative_eq!(near.z, 0.0, epsilon = 1e-4);

        // A point above the camera
        let above = view_proj.project_point3(Vec3::new(0.0, 2.0, 0.0));
        assert!(above.y > origin.y);
    }
}
