use winit::keyboard::KeyCode;

use crate::scene::camera::{Camera, Direction};

const MOVEMENT_KEYS: [(KeyCode, Direction); 4] = [
    (KeyCode::KeyW, Direction::Forward),
    (KeyCode::KeyS, Direction::Backward),
    (KeyCode::KeyA, Direction::Left),
    (KeyCode::KeyD, Direction::Right),
];

/// Window and input state shared between the event handlers and the frame loop.
#[derive(Debug, Clone)]
pub struct RenderContext {
    width: u32,
    height: u32,
    pub camera: Camera,
    last_frame: Option<f64>,
    delta_time: f32,
    last_cursor: Option<(f64, f64)>,
    held: [bool; MOVEMENT_KEYS.len()],
    close_requested: bool,
}

impl RenderContext {
    pub fn new(width: u32, height: u32, camera: Camera) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            camera,
            last_frame: None,
            delta_time: 0.0,
            last_cursor: None,
            held: [false; MOVEMENT_KEYS.len()],
            close_requested: false,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    /// Minimised windows report a zero size; the previous size is kept.
    pub fn on_resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }

    /// The first position only primes the tracker, so the view doesn't jump
    /// to wherever the cursor entered the window.
    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        if let Some((last_x, last_y)) = self.last_cursor {
            let dx = (x - last_x) as f32;
            // window y grows downwards
            let dy = (last_y - y) as f32;
            self.camera.process_mouse_movement(dx, dy);
        }
        self.last_cursor = Some((x, y));
    }

    /// Raw pointer motion, as reported while the cursor is grabbed. Window
    /// edges don't stop it, so no position tracking is involved.
    pub fn on_mouse_motion(&mut self, dx: f64, dy: f64) {
        // device y grows downwards too
        self.camera.process_mouse_movement(dx as f32, -dy as f32);
    }

    pub fn on_scroll(&mut self, dy: f32) {
        self.camera.process_mouse_scroll(dy);
    }

    pub fn on_key(&mut self, key: KeyCode, pressed: bool) {
        if key == KeyCode::Escape && pressed {
            log::info!("Escape pressed, closing");
            self.close_requested = true;
            return;
        }
        if let Some(slot) = MOVEMENT_KEYS.iter().position(|(k, _)| *k == key) {
            self.held[slot] = pressed;
        }
    }

    /// Advances the clock to `now` (seconds) and moves the camera for every
    /// held key. The first frame has a zero delta.
    pub fn begin_frame(&mut self, now: f64) {
        self.delta_time = match self.last_frame {
            Some(last) => (now - last).max(0.0) as f32,
            None => 0.0,
        };
        self.last_frame = Some(now);

        for (held, (_, direction)) in self.held.iter().zip(MOVEMENT_KEYS) {
            if *held {
                self.camera.process_keyboard(direction, self.delta_time);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec3;

    fn context() -> RenderContext {
        RenderContext::new(1024, 768, Camera::new(Vec3::new(0.0, 1.0, 5.0)))
    }

    #[test]
    fn test_first_cursor_event_only_records() {
        let mut ctx = context();
        let before = ctx.camera.clone();
        ctx.on_cursor_moved(700.0, 100.0);
        assert_eq!(ctx.camera, before);

        ctx.on_cursor_moved(710.0, 90.0);
        assert_relative_eq!(ctx.camera.yaw, -89.0, epsilon = 1e-4);
        assert_relative_eq!(ctx.camera.pitch, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_mouse_motion_turns_without_priming() {
        let mut ctx = context();
        ctx.on_mouse_motion(10.0, -10.0);
        assert_relative_eq!(ctx.camera.yaw, -89.0, epsilon = 1e-4);
        assert_relative_eq!(ctx.camera.pitch, 1.0, epsilon = 1e-4);

        // keeps turning the same way however far the pointer travels
        for _ in 0..100 {
            ctx.on_mouse_motion(10.0, 0.0);
        }
        assert_relative_eq!(ctx.camera.yaw, -89.0 + 100.0, epsilon = 1e-3);
    }

    #[test]
    fn test_escape_requests_close() {
        let mut ctx = context();
        ctx.on_key(KeyCode::Escape, false);
        assert!(!ctx.close_requested());
        ctx.on_key(KeyCode::Escape, true);
        assert!(ctx.close_requested());
    }

    #[test]
    fn test_held_keys_move_by_delta_time() {
        let mut ctx = context();
        ctx.begin_frame(10.0);
        assert_eq!(ctx.delta_time(), 0.0);

        ctx.on_key(KeyCode::KeyW, true);
        ctx.begin_frame(10.5);
        assert_relative_eq!(ctx.delta_time(), 0.5);
        assert_relative_eq!(ctx.camera.position.z, 5.0 - 2.5 * 0.5, epsilon = 1e-5);

        ctx.on_key(KeyCode::KeyW, false);
        ctx.begin_frame(11.0);
        assert_relative_eq!(ctx.camera.position.z, 5.0 - 2.5 * 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_resize_ignores_zero_and_updates_aspect() {
        let mut ctx = context();
        assert!(!ctx.on_resize(0, 600));
        assert_eq!(ctx.size(), (1024, 768));
        assert!(ctx.on_resize(800, 400));
        assert_relative_eq!(ctx.aspect(), 2.0);
    }

    #[test]
    fn test_replayed_input_is_deterministic() {
        fn replay() -> glam::Mat4 {
            let mut ctx = context();
            ctx.begin_frame(0.0);
            ctx.on_cursor_moved(512.0, 384.0);
            ctx.on_key(KeyCode::KeyD, true);
            ctx.on_cursor_moved(530.0, 370.0);
            ctx.begin_frame(0.016);
            ctx.on_scroll(2.0);
            ctx.on_key(KeyCode::KeyW, true);
            ctx.begin_frame(0.035);
            ctx.camera.view_matrix()
        }
        assert_eq!(replay(), replay());
    }
}
