#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed first-person rendering adapter for Deep Woods.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! Structures are drawn as their bounding boxes, trees as thin upright boxes
//! and batteries as small cubes. Every surface is lit by the flashlight only,
//! so objects fade to black beyond the beam's reach.

use std::time::{Duration, Instant};

use anyhow::Result;
use deep_woods_core::{Intents, StructureKind, Timestamp, TreeSpecies};
use deep_woods_rendering::{
    Color, FrameInput, Hud, Presentation, RenderingBackend, Scene, SceneLight, SceneStructure,
};
use glam::Vec3;
use macroquad::{
    camera::{set_camera, set_default_camera, Camera3D},
    input::{is_key_down, is_key_pressed, mouse_position, KeyCode},
    math::{vec2, vec3, Vec3 as MacroquadVec3},
    models::{draw_cube, draw_cube_wires, draw_line_3d, draw_plane},
    text::draw_text,
};
use tracing::info;

/// Surfaces never fall completely dark so the silhouette of the woods stays visible.
const AMBIENT: f32 = 0.06;

const TRUNK_HEIGHT: f32 = 1.6;
const TRUNK_WIDTH: f32 = 0.2;
const BATTERY_SIZE: f32 = 0.12;

/// Pairs of corner indices forming the twelve edges of a box.
const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Keys sampled once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct KeyboardShortcuts {
    /// `W` moves forward.
    forward: bool,
    /// `S` moves backward.
    backward: bool,
    /// `A` strafes left.
    left: bool,
    /// `D` strafes right.
    right: bool,
    /// `R` returns to the clearing.
    reset: bool,
    /// `F` flips the flashlight switch.
    toggle_light: bool,
    /// `C` jumps next to the chalice.
    teleport_cheat: bool,
    /// `Q` or `Escape` leaves the game.
    quit_requested: bool,
    /// `Tab` switches between filled and wireframe drawing.
    toggle_wireframe: bool,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        Self {
            forward: is_key_down(KeyCode::W),
            backward: is_key_down(KeyCode::S),
            left: is_key_down(KeyCode::A),
            right: is_key_down(KeyCode::D),
            reset: is_key_pressed(KeyCode::R),
            toggle_light: is_key_pressed(KeyCode::F),
            teleport_cheat: is_key_pressed(KeyCode::C),
            quit_requested: is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q),
            toggle_wireframe: is_key_pressed(KeyCode::Tab),
        }
    }

    fn intents(self, mouse: Option<(f32, f32)>) -> Intents {
        Intents {
            forward: self.forward,
            backward: self.backward,
            left: self.left,
            right: self.right,
            reset: self.reset,
            toggle_light: self.toggle_light,
            teleport_cheat: self.teleport_cheat,
            quit: self.quit_requested,
            mouse,
        }
    }
}

/// Reports the cursor only on frames where it moved.
#[derive(Clone, Copy, Debug, Default)]
struct MouseTracker {
    last: Option<(f32, f32)>,
}

impl MouseTracker {
    fn observe(&mut self, position: (f32, f32)) -> Option<(f32, f32)> {
        if self.last == Some(position) {
            return None;
        }
        self.last = Some(position);
        Some(position)
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
    window_width: i32,
    window_height: i32,
    field_of_view_degrees: f32,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            show_fps: false,
            window_width: 1280,
            window_height: 720,
            field_of_view_degrees: 45.0,
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs the frame rate once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }

    /// Configures the size of the created window in pixels.
    #[must_use]
    pub fn with_window_size(mut self, width: i32, height: i32) -> Self {
        self.window_width = width.max(1);
        self.window_height = height.max(1);
        self
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
            window_width,
            window_height,
            field_of_view_degrees,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width,
            window_height,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);
            let started = Instant::now();
            let mut mouse = MouseTracker::default();
            let mut wireframe = false;
            let mut fps_counter = FpsCounter::default();

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.toggle_wireframe {
                    wireframe = !wireframe;
                }

                let frame_input = FrameInput {
                    intents: keyboard.intents(mouse.observe(mouse_position())),
                    now: timestamp_since(started),
                };
                update_scene(frame_input, &mut scene);
                if scene.exit_requested {
                    break;
                }

                macroquad::window::clear_background(background);
                draw_world(&scene, field_of_view_degrees, wireframe);
                draw_hud(&scene.hud);

                let frame_time = macroquad::time::get_frame_time();
                if let Some(per_second) =
                    fps_counter.record_frame(Duration::from_secs_f32(frame_time.max(0.0)))
                {
                    if show_fps {
                        info!(fps = per_second, "frame rate");
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

fn timestamp_since(started: Instant) -> Timestamp {
    Timestamp::from_millis(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX))
}

fn draw_world(scene: &Scene, field_of_view_degrees: f32, wireframe: bool) {
    let camera = &scene.camera;
    set_camera(&Camera3D {
        position: to_macroquad_vec(camera.eye),
        target: to_macroquad_vec(camera.target()),
        up: to_macroquad_vec(camera.up),
        fovy: field_of_view_degrees.to_radians(),
        ..Camera3D::default()
    });

    let ground = lit(GROUND, &scene.light, 0.0);
    let half = scene.ground_half_extent.max(0.0);
    draw_plane(vec3(0.0, 0.0, 0.0), vec2(half, half), None, to_macroquad_color(ground));

    for structure in &scene.structures {
        let distance = structure.origin.distance(camera.eye);
        let color = to_macroquad_color(lit(structure_color(structure.kind), &scene.light, distance));
        draw_structure(structure, color, wireframe);
    }

    for tree in &scene.trees {
        let distance = tree.position.distance(camera.eye);
        let color = to_macroquad_color(lit(species_color(tree.species), &scene.light, distance));
        let centre = tree.position + Vec3::new(0.0, TRUNK_HEIGHT * 0.5, 0.0);
        let size = vec3(TRUNK_WIDTH, TRUNK_HEIGHT, TRUNK_WIDTH);
        if wireframe {
            draw_cube_wires(to_macroquad_vec(centre), size, color);
        } else {
            draw_cube(to_macroquad_vec(centre), size, None, color);
        }
    }

    for battery in &scene.batteries {
        let distance = battery.distance(camera.eye);
        let color = to_macroquad_color(lit(BATTERY, &scene.light, distance));
        let centre = *battery + Vec3::new(0.0, BATTERY_SIZE * 0.5, 0.0);
        let size = vec3(BATTERY_SIZE, BATTERY_SIZE, BATTERY_SIZE);
        if wireframe {
            draw_cube_wires(to_macroquad_vec(centre), size, color);
        } else {
            draw_cube(to_macroquad_vec(centre), size, None, color);
        }
    }

    set_default_camera();
}

fn draw_structure(structure: &SceneStructure, color: macroquad::color::Color, wireframe: bool) {
    if !structure.extents.is_loaded() {
        return;
    }

    let corners = structure.corners();
    if !wireframe {
        let (min, max) = bounds(&corners);
        draw_cube(
            to_macroquad_vec((min + max) * 0.5),
            to_macroquad_vec(max - min),
            None,
            color,
        );
    }
    for (start, end) in BOX_EDGES {
        draw_line_3d(
            to_macroquad_vec(corners[start]),
            to_macroquad_vec(corners[end]),
            color,
        );
    }
}

fn bounds(points: &[Vec3]) -> (Vec3, Vec3) {
    points.iter().fold(
        (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
        |(min, max), point| (min.min(*point), max.max(*point)),
    )
}

fn draw_hud(hud: &Hud) {
    let color = match hud.countdown {
        Some(_) => macroquad::color::RED,
        None => macroquad::color::WHITE,
    };
    let _ = draw_text(&hud.status_line(), 16.0, 32.0, 28.0, color);
}

const GROUND: Color = Color::from_rgb_u8(46, 58, 34);
const BATTERY: Color = Color::from_rgb_u8(230, 200, 40);

fn structure_color(kind: StructureKind) -> Color {
    match kind {
        StructureKind::House => Color::from_rgb_u8(140, 100, 70),
        StructureKind::Chapel => Color::from_rgb_u8(190, 185, 170),
        StructureKind::Windmill => Color::from_rgb_u8(160, 130, 90),
        StructureKind::Chalice => Color::from_rgb_u8(240, 200, 60),
    }
}

fn species_color(species: TreeSpecies) -> Color {
    match species.get() % 4 {
        0 => Color::from_rgb_u8(34, 90, 40),
        1 => Color::from_rgb_u8(50, 110, 45),
        2 => Color::from_rgb_u8(70, 95, 35),
        _ => Color::from_rgb_u8(30, 75, 55),
    }
}

/// Shades a surface color by the flashlight at the provided distance.
fn lit(base: Color, light: &SceneLight, distance: f32) -> Color {
    let intensity = AMBIENT + (1.0 - AMBIENT) * light.falloff(distance);
    base.tint(light.color).dim(intensity)
}

fn to_macroquad_vec(vector: Vec3) -> MacroquadVec3 {
    vec3(vector.x, vector.y, vector.z)
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

/// Tracks the average frames-per-second produced by the render loop.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
}

impl FpsCounter {
    /// Records a rendered frame and returns the average once a second has elapsed.
    fn record_frame(&mut self, frame: Duration) -> Option<f32> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);
        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let per_second = self.frames as f32 / self.elapsed.as_secs_f32();
        self.elapsed = Duration::ZERO;
        self.frames = 0;
        Some(per_second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deep_woods_core::Extents;

    #[test]
    fn mouse_is_reported_only_when_it_moves() {
        let mut tracker = MouseTracker::default();
        assert_eq!(tracker.observe((10.0, 20.0)), Some((10.0, 20.0)));
        assert_eq!(tracker.observe((10.0, 20.0)), None);
        assert_eq!(tracker.observe((12.0, 20.0)), Some((12.0, 20.0)));
    }

    #[test]
    fn shortcuts_map_onto_intents() {
        let keyboard = KeyboardShortcuts {
            forward: true,
            right: true,
            toggle_light: true,
            quit_requested: true,
            toggle_wireframe: true,
            ..KeyboardShortcuts::default()
        };
        let intents = keyboard.intents(Some((3.0, 4.0)));
        assert!(intents.forward && intents.right && intents.toggle_light && intents.quit);
        assert!(!intents.backward && !intents.reset && !intents.teleport_cheat);
        assert_eq!(intents.mouse, Some((3.0, 4.0)));
    }

    #[test]
    fn dark_surfaces_keep_the_ambient_floor() {
        let light = SceneLight {
            on: false,
            ..SceneLight::default()
        };
        let base = Color::new(1.0, 1.0, 1.0, 1.0);
        let shaded = lit(base, &light, 0.0);
        assert!((shaded.red - AMBIENT).abs() < 1e-6);
        assert_eq!(shaded.alpha, 1.0);
    }

    #[test]
    fn closer_surfaces_are_brighter() {
        let light = SceneLight::default();
        let base = structure_color(StructureKind::Chapel);
        assert!(lit(base, &light, 1.0).red > lit(base, &light, 6.0).red);
    }

    #[test]
    fn bounds_enclose_rotated_corners() {
        let structure = SceneStructure {
            kind: StructureKind::House,
            origin: Vec3::ZERO,
            yaw_degrees: 45.0,
            extents: Extents::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.0, 1.0)),
        };
        let (min, max) = bounds(&structure.corners());
        let reach = 2.0_f32.sqrt();
        assert!((max.x - reach).abs() < 1e-5);
        assert!((min.z + reach).abs() < 1e-5);
        assert_eq!(max.y, 2.0);
    }

    #[test]
    fn fps_counter_reports_after_a_second() {
        let mut counter = FpsCounter::default();
        for _ in 0..59 {
            assert_eq!(counter.record_frame(Duration::from_millis(16)), None);
        }
        assert!(counter.record_frame(Duration::from_millis(100)).is_some());
    }
}
