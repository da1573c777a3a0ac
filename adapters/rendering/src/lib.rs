#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Deep Woods adapters.

use anyhow::Result as AnyResult;
use deep_woods_core::{Extents, Intents, Outcome, StructureKind, Timestamp, TreeSpecies};
use glam::Vec3;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the color darkened towards black, keeping `factor` of each channel.
    #[must_use]
    pub fn dim(self, factor: f32) -> Self {
        let factor = factor.clamp(0.0, 1.0);
        Self {
            red: self.red * factor,
            green: self.green * factor,
            blue: self.blue * factor,
            alpha: self.alpha,
        }
    }

    /// Channel-wise product of two colors, used to tint surfaces by a light.
    #[must_use]
    pub fn tint(self, light: Color) -> Self {
        Self {
            red: self.red * light.red,
            green: self.green * light.green,
            blue: self.blue * light.blue,
            alpha: self.alpha,
        }
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// Game intents captured from the keyboard and mouse.
    pub intents: Intents,
    /// Host clock reading for the frame.
    pub now: Timestamp,
}

/// Eye and orientation the scene is viewed from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneCamera {
    /// Eye position in world space.
    pub eye: Vec3,
    /// Unit view direction.
    pub view_direction: Vec3,
    /// Up vector.
    pub up: Vec3,
}

impl SceneCamera {
    /// Point one unit ahead of the eye, as expected by look-at projections.
    #[must_use]
    pub fn target(&self) -> Vec3 {
        self.eye + self.view_direction
    }
}

impl Default for SceneCamera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.35, 0.0),
            view_direction: Vec3::NEG_Z,
            up: Vec3::Y,
        }
    }
}

/// Structure drawn as a rotated box spanning its mesh extents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneStructure {
    /// Structure represented by the box.
    pub kind: StructureKind,
    /// Placement point in world space.
    pub origin: Vec3,
    /// Rotation about the vertical axis, in degrees.
    pub yaw_degrees: f32,
    /// Local-space bounding box.
    pub extents: Extents,
}

impl SceneStructure {
    /// World-space corners of the rotated bounding box, bottom face first.
    #[must_use]
    pub fn corners(&self) -> [Vec3; 8] {
        let min = self.extents.min();
        let max = self.extents.max();
        let rotation = glam::Quat::from_rotation_y(self.yaw_degrees.to_radians());
        let local = [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(max.x, max.y, max.z),
            Vec3::new(min.x, max.y, max.z),
        ];
        local.map(|corner| self.origin + rotation * corner)
    }
}

/// Billboard tree standing on the ground.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneTree {
    /// Texture family of the tree.
    pub species: TreeSpecies,
    /// Ground position of the trunk.
    pub position: Vec3,
}

/// Flashlight beam applied to everything in view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneLight {
    /// Whether the beam is visible.
    pub on: bool,
    /// Intensity in `[0, 1]`.
    pub strength: f32,
    /// Reach of the beam in world units.
    pub range: f32,
    /// Colour of the beam.
    pub color: Color,
}

impl SceneLight {
    /// Fraction of the beam reaching a surface `distance` units from the eye.
    #[must_use]
    pub fn falloff(&self, distance: f32) -> f32 {
        if !self.on || self.range <= 0.0 {
            return 0.0;
        }
        (1.0 - distance / self.range).clamp(0.0, 1.0) * self.strength.clamp(0.0, 1.0)
    }
}

impl Default for SceneLight {
    fn default() -> Self {
        Self {
            on: true,
            strength: 1.0,
            range: 8.0,
            color: Color::new(1.0, 0.95, 0.8, 1.0),
        }
    }
}

/// Status shown on top of the 3D view.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Hud {
    /// Whole seconds of battery charge left.
    pub battery_seconds: u64,
    /// Seconds left before a dead flashlight ends the run.
    pub countdown: Option<u32>,
    /// Batteries still lying in the woods.
    pub batteries_left: usize,
    /// How the run currently stands.
    pub outcome: Outcome,
}

impl Hud {
    /// One-line status text for the overlay.
    #[must_use]
    pub fn status_line(&self) -> String {
        match self.outcome {
            Outcome::Won => "You found the chalice!".to_owned(),
            Outcome::Lost => "The darkness took you.".to_owned(),
            Outcome::InProgress => match self.countdown {
                Some(seconds) => format!(
                    "Battery dead! {seconds}s left | batteries nearby: {}",
                    self.batteries_left
                ),
                None => format!(
                    "Battery {}s | batteries nearby: {}",
                    self.battery_seconds, self.batteries_left
                ),
            },
        }
    }
}

/// Describes the entities that compose a renderable scene.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    /// Viewpoint of the frame.
    pub camera: SceneCamera,
    /// Half extent of the ground plane.
    pub ground_half_extent: f32,
    /// Placed structures.
    pub structures: Vec<SceneStructure>,
    /// Billboard trees.
    pub trees: Vec<SceneTree>,
    /// Batteries still lying on the ground.
    pub batteries: Vec<Vec3>,
    /// Flashlight beam.
    pub light: SceneLight,
    /// Overlay status.
    pub hud: Hud,
    /// Set by the update closure once the backend should stop.
    pub exit_requested: bool,
}

/// Top-level descriptor handed to a rendering backend.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Deep Woods scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until the scene requests an exit.
    ///
    /// The provided `update_scene` closure receives the input captured by the
    /// adapter for the frame and refreshes the scene before it is drawn.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(FrameInput, &mut Scene) + 'static;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dim_keeps_alpha_and_clamps() {
        let color = Color::new(0.8, 0.4, 0.2, 0.5);
        assert_eq!(color.dim(0.5), Color::new(0.4, 0.2, 0.1, 0.5));
        assert_eq!(color.dim(3.0), color);
        assert_eq!(color.dim(-1.0), Color::new(0.0, 0.0, 0.0, 0.5));
    }

    #[test]
    fn corners_follow_the_yaw() {
        let structure = SceneStructure {
            kind: StructureKind::House,
            origin: Vec3::new(2.0, 0.0, 0.0),
            yaw_degrees: 90.0,
            extents: Extents::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0)),
        };
        let corner = structure.corners()[1];
        assert!((corner - Vec3::new(2.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn falloff_fades_with_distance() {
        let light = SceneLight {
            strength: 0.5,
            ..SceneLight::default()
        };
        assert_eq!(light.falloff(0.0), 0.5);
        assert_eq!(light.falloff(8.0), 0.0);
        assert!((light.falloff(4.0) - 0.25).abs() < 1e-6);

        let dark = SceneLight {
            on: false,
            ..light
        };
        assert_eq!(dark.falloff(0.0), 0.0);
    }

    #[test]
    fn status_line_prefers_the_countdown() {
        let hud = Hud {
            battery_seconds: 0,
            countdown: Some(7),
            batteries_left: 3,
            outcome: Outcome::InProgress,
        };
        assert_eq!(hud.status_line(), "Battery dead! 7s left | batteries nearby: 3");
        assert_eq!(
            Hud {
                outcome: Outcome::Won,
                ..hud
            }
            .status_line(),
            "You found the chalice!"
        );
    }

    #[test]
    fn camera_target_is_one_unit_ahead() {
        let camera = SceneCamera::default();
        assert_eq!(camera.target(), Vec3::new(0.0, 0.35, -1.0));
    }
}
