#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! First-person camera with hypothetical and committed movement.
//!
//! The camera never consults the collider. Callers ask where a step would
//! land with [`Camera::hypothetical`], decide whether that is acceptable, and
//! only then [`Camera::commit`] a step. Horizontal movement ignores the pitch
//! of the view direction; eye height is driven solely by the walking bob.

use deep_woods_core::{MoveDirection, Timestamp};
use glam::{Quat, Vec2, Vec3};

/// Tunable parameters of the camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Eye position at construction and after a reset.
    pub start_position: Vec3,
    /// Initial view direction; normalised on construction.
    pub start_direction: Vec3,
    /// Resting eye height the walking bob oscillates around.
    pub base_height: f32,
    /// Peak vertical offset of the walking bob.
    pub bob_amplitude: f32,
    /// Angular frequency factor of the walking bob.
    pub bob_frequency: f32,
    /// Degrees of rotation per pixel of mouse travel.
    pub look_sensitivity: f32,
    /// Absolute mouse `y` is clamped to `±mouse_y_limit` to bound pitch.
    pub mouse_y_limit: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_position: Vec3::new(0.0, 0.35, 0.0),
            start_direction: Vec3::new(0.0, 0.0, -1.0),
            base_height: 0.35,
            bob_amplitude: 0.03,
            bob_frequency: 0.35,
            look_sensitivity: 0.2,
            mouse_y_limit: 250.0,
        }
    }
}

/// Player eye and view direction.
#[derive(Clone, Debug)]
pub struct Camera {
    config: Config,
    eye: Vec3,
    initial_eye: Vec3,
    view_direction: Vec3,
    up: Vec3,
    previous_mouse: Option<Vec2>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Camera {
    /// Creates a camera at the configured start position.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let view_direction = config
            .start_direction
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z);
        Self {
            config,
            eye: config.start_position,
            initial_eye: config.start_position,
            view_direction,
            up: Vec3::Y,
            previous_mouse: None,
        }
    }

    /// Configuration the camera was built with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Current eye position.
    #[must_use]
    pub const fn eye_position(&self) -> Vec3 {
        self.eye
    }

    /// Position restored by [`Camera::reset`].
    #[must_use]
    pub const fn initial_eye_position(&self) -> Vec3 {
        self.initial_eye
    }

    /// Unit view direction.
    #[must_use]
    pub const fn view_direction(&self) -> Vec3 {
        self.view_direction
    }

    /// World up vector.
    #[must_use]
    pub const fn up_vector(&self) -> Vec3 {
        self.up
    }

    /// Unit vector pointing to the right of the view direction.
    #[must_use]
    pub fn right_vector(&self) -> Vec3 {
        self.view_direction.cross(self.up).normalize_or_zero()
    }

    /// Points the camera in a new direction, keeping the mouse history.
    pub fn set_view_direction(&mut self, direction: Vec3) {
        if let Some(direction) = direction.try_normalize() {
            self.view_direction = direction;
        }
    }

    /// Horizontal offset produced by a single step.
    #[must_use]
    pub fn displacement(&self, direction: MoveDirection, speed: f32) -> Vec3 {
        let ahead = Vec3::new(self.view_direction.x, 0.0, self.view_direction.z);
        match direction {
            MoveDirection::Forward => ahead * speed,
            MoveDirection::Backward => -ahead * speed,
            MoveDirection::Left => -self.right_vector() * speed,
            MoveDirection::Right => self.right_vector() * speed,
        }
    }

    /// Eye position a step would reach, without moving the camera.
    #[must_use]
    pub fn hypothetical(&self, direction: MoveDirection, speed: f32) -> Vec3 {
        self.eye + self.displacement(direction, speed)
    }

    /// Moves the camera one step and re-applies the walking bob.
    pub fn commit(&mut self, direction: MoveDirection, speed: f32, now: Timestamp) -> Vec3 {
        self.eye += self.displacement(direction, speed);
        self.walk_cycle(speed, now);
        self.eye
    }

    fn walk_cycle(&mut self, speed: f32, now: Timestamp) {
        let phase = now.as_millis() as f64 * f64::from(speed) * f64::from(self.config.bob_frequency);
        let offset = self.config.bob_amplitude * phase.sin() as f32;
        self.eye.y = self.config.base_height + offset;
    }

    /// Turns the camera towards an absolute mouse position.
    ///
    /// The first call only records the position. Returns whether the view
    /// direction changed.
    pub fn mouse_look(&mut self, mouse_x: f32, mouse_y: f32) -> bool {
        let limit = self.config.mouse_y_limit.abs();
        let current = Vec2::new(mouse_x, mouse_y.clamp(-limit, limit));
        let Some(previous) = self.previous_mouse.replace(current) else {
            return false;
        };

        let delta = (previous - current) * self.config.look_sensitivity;
        if delta == Vec2::ZERO {
            return false;
        }

        let mut view = Quat::from_axis_angle(self.up, delta.x.to_radians()) * self.view_direction;
        if let Some(right) = view.cross(self.up).try_normalize() {
            view = Quat::from_axis_angle(right, delta.y.to_radians()) * view;
        }
        if let Some(view) = view.try_normalize() {
            self.view_direction = view;
        }
        true
    }

    /// Returns the eye to its initial position.
    pub fn reset(&mut self) {
        self.eye = self.initial_eye;
    }

    /// Places the eye at an arbitrary point.
    pub fn teleport(&mut self, position: Vec3) {
        self.eye = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_look_only_seeds_the_mouse() {
        let mut camera = Camera::default();
        let before = camera.view_direction();
        assert!(!camera.mouse_look(400.0, 300.0));
        assert_eq!(camera.view_direction(), before);
    }

    #[test]
    fn hypothetical_does_not_move() {
        let camera = Camera::default();
        let target = camera.hypothetical(MoveDirection::Forward, 1.0);
        assert_eq!(target, Vec3::new(0.0, 0.35, -1.0));
        assert_eq!(camera.eye_position(), Vec3::new(0.0, 0.35, 0.0));
    }

    #[test]
    fn bob_stays_within_amplitude() {
        let mut camera = Camera::default();
        for millis in (0..5_000).step_by(16) {
            let eye = camera.commit(MoveDirection::Left, 0.02, Timestamp::from_millis(millis));
            assert!((eye.y - 0.35).abs() <= 0.03 + 1e-6);
        }
    }
}
