//! Frame loop plumbing shared by the windowed and headless hosts.

use std::{
    thread,
    time::{Duration, Instant},
};

use deep_woods_core::{Command, Event, Intents, Outcome, Renderable, Timestamp};
use deep_woods_rendering::{
    Color, Hud, Scene, SceneCamera, SceneLight, SceneStructure, SceneTree,
};
use deep_woods_system_progress::{Config as ProgressConfig, Progress, Surroundings};
use deep_woods_world::{apply, query, World};
use glam::Vec3;

/// Soft target duration of one frame.
pub(crate) const FRAME_TARGET: Duration = Duration::from_millis(16);

/// World plus the controller that drives it, pumped once per frame.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    progress: Progress,
    events: Vec<Event>,
    commands: Vec<Command>,
}

impl Session {
    pub(crate) fn new(world: World, config: ProgressConfig) -> Self {
        let progress = Progress::new(query::boundary(&world), config);
        Self {
            world,
            progress,
            events: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.progress.quit()
    }

    pub(crate) fn won(&self) -> bool {
        self.progress.win()
    }

    /// Resolves one frame of input against the world.
    pub(crate) fn step(&mut self, intents: &Intents, now: Timestamp) {
        self.commands.clear();
        let world = &self.world;
        self.progress.handle(
            &self.events,
            intents,
            now,
            Surroundings {
                camera: query::camera(world),
                objects: query::objects(world),
                trees: query::trees(world),
                batteries: query::batteries(world),
                goal: query::goal(world),
            },
            &mut self.commands,
        );

        self.events.clear();
        for command in self.commands.drain(..) {
            apply(&mut self.world, command, &mut self.events);
        }
    }
}

/// Refreshes the scene from the current world state.
pub(crate) fn populate_scene(world: &World, scene: &mut Scene) {
    let camera = query::camera(world);
    scene.camera = SceneCamera {
        eye: camera.eye_position(),
        view_direction: camera.view_direction(),
        up: camera.up_vector(),
    };
    scene.ground_half_extent = query::boundary(world).max().abs();

    scene.structures.clear();
    scene
        .structures
        .extend(query::objects(world).iter().map(|object| SceneStructure {
            kind: object.kind(),
            origin: object.object_coord(),
            yaw_degrees: object.rotation_degrees(),
            extents: object.extents(),
        }));

    scene.trees.clear();
    scene
        .trees
        .extend(query::trees(world).iter().map(|tree| SceneTree {
            species: tree.species,
            position: tree.coord.at_height(0.0),
        }));

    scene.batteries.clear();
    scene.batteries.extend(
        query::batteries(world)
            .iter()
            .map(|battery| battery.coord.at_height(0.0)),
    );

    let flashlight = query::flashlight(world);
    let headlight = query::headlight(world);
    let [red, green, blue] = flashlight.config().headlight_color;
    scene.light = SceneLight {
        on: headlight.on,
        strength: headlight.strength,
        range: headlight.range,
        color: Color::new(red, green, blue, 1.0),
    };

    let now = query::now(world);
    scene.hud = Hud {
        battery_seconds: flashlight.battery_remaining(now).as_secs(),
        countdown: flashlight
            .exhausted_at()
            .map(|_| flashlight.countdown_seconds()),
        batteries_left: query::batteries(world).len(),
        outcome: query::outcome(world),
    };
}

/// Supplies frame timestamps and keeps frames near the soft target.
///
/// In fast mode the clock is synthetic and advances by exactly one target per
/// frame without sleeping.
#[derive(Debug)]
pub(crate) struct FramePacer {
    target: Duration,
    fast: bool,
    started: Instant,
    frame_started: Instant,
    frames: u64,
}

impl FramePacer {
    pub(crate) fn new(target: Duration, fast: bool) -> Self {
        let now = Instant::now();
        Self {
            target,
            fast,
            started: now,
            frame_started: now,
            frames: 0,
        }
    }

    /// Marks the start of a frame and returns its timestamp.
    pub(crate) fn begin_frame(&mut self) -> Timestamp {
        self.frame_started = Instant::now();
        self.frames = self.frames.saturating_add(1);
        if self.fast {
            let millis = u64::try_from(self.target.as_millis()).unwrap_or(u64::MAX);
            return Timestamp::from_millis(self.frames.saturating_mul(millis));
        }
        let elapsed = self.frame_started.duration_since(self.started);
        Timestamp::from_millis(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
    }

    /// Sleeps away whatever is left of the frame's target duration.
    pub(crate) fn end_frame(&self) {
        if self.fast {
            return;
        }
        let spent = self.frame_started.elapsed();
        if let Some(remaining) = self.target.checked_sub(spent) {
            thread::sleep(remaining);
        }
    }

    pub(crate) fn frames(&self) -> u64 {
        self.frames
    }
}

/// Steers the camera towards the goal for unattended runs.
///
/// Turning is expressed as synthetic mouse travel so the autopilot goes
/// through exactly the same look path as a player. When a step makes no
/// progress it strafes for a while to slip past whatever is in the way.
#[derive(Debug)]
pub(crate) struct Autopilot {
    mouse_x: f32,
    max_turn_pixels: f32,
    last_distance: Option<f32>,
    stalled_frames: u32,
    sidestep_frames: u32,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            mouse_x: 0.0,
            max_turn_pixels: 25.0,
            last_distance: None,
            stalled_frames: 0,
            sidestep_frames: 0,
        }
    }
}

impl Autopilot {
    const STALL_LIMIT: u32 = 20;
    const SIDESTEP_DURATION: u32 = 40;

    pub(crate) fn intents(&mut self, world: &World) -> Intents {
        let Some(goal) = query::goal(world) else {
            return Intents::default();
        };
        let camera = query::camera(world);
        let eye = camera.eye_position();
        let to_goal = goal.object_coord() - eye;
        let distance = Vec3::new(to_goal.x, 0.0, to_goal.z).length();

        let sensitivity = camera.config().look_sensitivity;
        let turn_degrees = heading_error_degrees(camera.view_direction(), to_goal);
        let pixels = if sensitivity > 0.0 {
            (turn_degrees / sensitivity).clamp(-self.max_turn_pixels, self.max_turn_pixels)
        } else {
            0.0
        };
        self.mouse_x -= pixels;

        match self.last_distance {
            Some(last) if distance >= last - 1e-4 => {
                self.stalled_frames = self.stalled_frames.saturating_add(1)
            }
            _ => self.stalled_frames = 0,
        }
        self.last_distance = Some(distance);
        if self.stalled_frames >= Self::STALL_LIMIT {
            self.stalled_frames = 0;
            self.sidestep_frames = Self::SIDESTEP_DURATION;
        }

        let sidestep = self.sidestep_frames > 0;
        self.sidestep_frames = self.sidestep_frames.saturating_sub(1);

        Intents {
            forward: !sidestep,
            right: sidestep,
            mouse: Some((self.mouse_x, 0.0)),
            ..Intents::default()
        }
    }
}

/// Signed yaw, in degrees, that turns `view` towards `target` on the ground plane.
///
/// Positive values turn counter-clockwise when seen from above, matching the
/// sense of a positive mouse delta.
pub(crate) fn heading_error_degrees(view: Vec3, target: Vec3) -> f32 {
    let across = target.x * view.z - target.z * view.x;
    let along = target.x * view.x + target.z * view.z;
    if across == 0.0 && along == 0.0 {
        return 0.0;
    }
    across.atan2(along).to_degrees()
}

/// Human readable summary of how a session ended.
pub(crate) fn describe_outcome(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Won => "the chalice was found",
        Outcome::Lost => "the flashlight died in the dark",
        Outcome::InProgress => "the woods were left unexplored",
    }
}
