#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Deep Woods.
//!
//! The world exclusively owns the camera, the flashlight, the placed scenery,
//! the remaining batteries and the run outcome. Adapters and systems never
//! mutate it directly; they submit [`Command`] values through [`apply`] and
//! observe the resulting [`Event`] values, reading everything else through the
//! [`query`] module.

use deep_woods_core::{
    Battery, BatteryId, Command, Event, Extents, ObjectId, Outcome, PlacedObject, StructureKind,
    Timestamp, Tree, WorldBoundary, WELCOME_BANNER,
};
use deep_woods_system_navigation::{Camera, Config as CameraConfig};
use deep_woods_system_placement::{
    Config as PlacementConfig, Placement, PlacementError, STRUCTURE_COUNT,
};
use deep_woods_system_power::{Config as PowerConfig, Flashlight};
use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

/// Bounding box and orientation of one structure's mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StructureProfile {
    /// Local-space bounding box of the untransformed mesh.
    pub extents: Extents,
    /// Rotation about the vertical axis applied at placement, in degrees.
    pub yaw_degrees: f32,
}

impl StructureProfile {
    /// Default profile used for the provided structure.
    #[must_use]
    pub fn default_for(kind: StructureKind) -> Self {
        let (min, max) = match kind {
            StructureKind::House => (Vec3::new(-1.5, 0.0, -1.2), Vec3::new(1.5, 2.6, 1.2)),
            StructureKind::Chapel => (Vec3::new(-1.1, 0.0, -2.0), Vec3::new(1.1, 3.4, 2.0)),
            StructureKind::Windmill => (Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 4.8, 1.0)),
            StructureKind::Chalice => (Vec3::new(-0.15, 0.0, -0.15), Vec3::new(0.15, 0.4, 0.15)),
        };
        Self {
            extents: Extents::new(min, max),
            yaw_degrees: 0.0,
        }
    }
}

/// Parameters used to build a fresh world.
#[derive(Clone, Debug)]
pub struct Config {
    /// Structure, tree and battery placement, including the boundary.
    pub placement: PlacementConfig,
    /// Player camera.
    pub camera: CameraConfig,
    /// Flashlight battery.
    pub power: PowerConfig,
    /// Mesh profile of every structure, in [`StructureKind::ALL`] order.
    pub structures: [StructureProfile; STRUCTURE_COUNT],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            placement: PlacementConfig::default(),
            camera: CameraConfig::default(),
            power: PowerConfig::default(),
            structures: StructureKind::ALL.map(StructureProfile::default_for),
        }
    }
}

impl Config {
    /// Profile configured for the provided structure.
    #[must_use]
    pub fn structure(&self, kind: StructureKind) -> &StructureProfile {
        &self.structures[structure_index(kind)]
    }

    /// Mutable profile configured for the provided structure.
    pub fn structure_mut(&mut self, kind: StructureKind) -> &mut StructureProfile {
        &mut self.structures[structure_index(kind)]
    }
}

fn structure_index(kind: StructureKind) -> usize {
    match kind {
        StructureKind::House => 0,
        StructureKind::Chapel => 1,
        StructureKind::Windmill => 2,
        StructureKind::Chalice => 3,
    }
}

/// Represents the authoritative Deep Woods world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    seed: u64,
    boundary: WorldBoundary,
    camera: Camera,
    flashlight: Flashlight,
    objects: Vec<PlacedObject>,
    goal: ObjectId,
    trees: Vec<Tree>,
    batteries: Vec<Battery>,
    outcome: Outcome,
    now: Timestamp,
    rng: ChaCha8Rng,
}

impl World {
    /// Places the scenery for `seed` and switches the flashlight on at `now`.
    pub fn generate(config: Config, seed: u64, now: Timestamp) -> Result<Self, PlacementError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let placement = Placement::new(config.placement.clone());
        let layout = placement.layout(&mut rng)?;

        let mut objects = Vec::with_capacity(STRUCTURE_COUNT);
        let mut goal = ObjectId::new(0);
        for (index, kind) in StructureKind::ALL.into_iter().enumerate() {
            let id = ObjectId::new(index as u32);
            let profile = config.structure(kind);
            if kind.is_goal() {
                goal = id;
            }
            objects.push(PlacedObject::new(
                id,
                kind,
                layout.structure(kind).at_height(0.0),
                profile.yaw_degrees,
                profile.extents,
            ));
        }

        let batteries = layout
            .batteries
            .iter()
            .enumerate()
            .map(|(index, coord)| Battery {
                id: BatteryId::new(index as u32),
                coord: *coord,
            })
            .collect::<Vec<_>>();

        info!(
            seed,
            trees = layout.trees.len(),
            batteries = batteries.len(),
            "generated world"
        );

        Ok(Self {
            banner: WELCOME_BANNER,
            seed,
            boundary: config.placement.boundary,
            camera: Camera::new(config.camera),
            flashlight: Flashlight::new(config.power, now),
            objects,
            goal,
            trees: layout.trees,
            batteries,
            outcome: Outcome::InProgress,
            now,
            rng,
        })
    }

    fn battery_index(&self, battery: BatteryId) -> Option<usize> {
        self.batteries.iter().position(|entry| entry.id == battery)
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { now } => {
            world.now = world.now.max(now);
            out_events.push(Event::TimeAdvanced { now: world.now });

            let first = out_events.len();
            world
                .flashlight
                .tick(world.now, &mut world.rng, out_events);
            for event in &out_events[first..] {
                match event {
                    Event::LightSwitchedOn { cause } => debug!(?cause, "flashlight on"),
                    Event::LightSwitchedOff { cause } => debug!(?cause, "flashlight off"),
                    Event::CountdownChanged { seconds } => {
                        debug!(seconds, "flashlight dead, grace countdown")
                    }
                    _ => {}
                }
            }

            if world.flashlight.is_game_over() && world.outcome == Outcome::InProgress {
                world.outcome = Outcome::Lost;
                info!("the darkness took over, game over");
            }
        }
        Command::MoveCamera {
            direction,
            speed,
            now,
        } => {
            let from = world.camera.eye_position();
            let to = world.camera.commit(direction, speed, now);
            out_events.push(Event::CameraMoved {
                direction,
                from,
                to,
            });
        }
        Command::LookCamera { mouse_x, mouse_y } => {
            if world.camera.mouse_look(mouse_x, mouse_y) {
                out_events.push(Event::CameraTurned {
                    view_direction: world.camera.view_direction(),
                });
            }
        }
        Command::ResetCamera => {
            world.camera.reset();
            out_events.push(Event::CameraRelocated {
                position: world.camera.eye_position(),
            });
        }
        Command::TeleportCamera { position } => {
            world.camera.teleport(position);
            debug!(x = position.x, z = position.z, "camera teleported");
            out_events.push(Event::CameraRelocated { position });
        }
        Command::ToggleLight { now } => {
            world.flashlight.toggle(world.now.max(now), out_events);
        }
        Command::CollectBattery { battery, now } => {
            let Some(index) = world.battery_index(battery) else {
                return;
            };
            if !world.flashlight.collect_battery(world.now.max(now)) {
                return;
            }

            let _ = world.batteries.swap_remove(index);
            let remaining = world.batteries.len();
            info!(battery = battery.get(), remaining, "battery collected");
            out_events.push(Event::BatteryCollected { battery, remaining });
        }
        Command::ReachGoal => {
            if world.outcome == Outcome::InProgress {
                world.outcome = Outcome::Won;
                info!("the chalice was found");
                out_events.push(Event::GoalReached);
            }
        }
        Command::RequestQuit => {
            out_events.push(Event::QuitRequested);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use deep_woods_core::{
        Battery, ObjectId, Outcome, PlacedObject, Timestamp, Tree, WorldBoundary,
    };
    use deep_woods_system_navigation::Camera;
    use deep_woods_system_power::{Flashlight, Headlight};

    use super::World;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Seed the scenery was generated from.
    #[must_use]
    pub fn seed(world: &World) -> u64 {
        world.seed
    }

    /// Playable area of the ground plane.
    #[must_use]
    pub fn boundary(world: &World) -> WorldBoundary {
        world.boundary
    }

    /// Provides read-only access to the player camera.
    #[must_use]
    pub fn camera(world: &World) -> &Camera {
        &world.camera
    }

    /// Provides read-only access to the flashlight.
    #[must_use]
    pub fn flashlight(world: &World) -> &Flashlight {
        &world.flashlight
    }

    /// Headlight parameters derived from the flashlight.
    #[must_use]
    pub fn headlight(world: &World) -> Headlight {
        world.flashlight.headlight()
    }

    /// Placed structures in allocation order.
    #[must_use]
    pub fn objects(world: &World) -> &[PlacedObject] {
        &world.objects
    }

    /// Looks up a placed structure by identifier.
    #[must_use]
    pub fn object(world: &World, id: ObjectId) -> Option<&PlacedObject> {
        world.objects.iter().find(|object| object.id() == id)
    }

    /// The structure the player is searching for.
    #[must_use]
    pub fn goal(world: &World) -> Option<&PlacedObject> {
        object(world, world.goal)
    }

    /// Billboard trees.
    #[must_use]
    pub fn trees(world: &World) -> &[Tree] {
        &world.trees
    }

    /// Batteries still lying in the world.
    #[must_use]
    pub fn batteries(world: &World) -> &[Battery] {
        &world.batteries
    }

    /// How the run currently stands.
    #[must_use]
    pub fn outcome(world: &World) -> Outcome {
        world.outcome
    }

    /// Latest host clock reading delivered through a tick.
    #[must_use]
    pub fn now(world: &World) -> Timestamp {
        world.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deep_woods_core::MoveDirection;

    fn world() -> World {
        World::generate(Config::default(), 7, Timestamp::from_millis(0)).expect("default layout")
    }

    #[test]
    fn generate_binds_every_structure() {
        let world = world();
        let kinds: Vec<_> = query::objects(&world)
            .iter()
            .map(PlacedObject::kind)
            .collect();
        assert_eq!(kinds, StructureKind::ALL.to_vec());
        assert_eq!(
            query::goal(&world).map(PlacedObject::kind),
            Some(StructureKind::Chalice)
        );
        assert_eq!(query::welcome_banner(&world), WELCOME_BANNER);
    }

    #[test]
    fn move_reports_both_positions() {
        let mut world = world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MoveCamera {
                direction: MoveDirection::Forward,
                speed: 1.0,
                now: Timestamp::from_millis(0),
            },
            &mut events,
        );

        let [Event::CameraMoved { from, to, .. }] = events.as_slice() else {
            panic!("unexpected events {events:?}");
        };
        assert!((from.z - to.z - 1.0).abs() < 1e-5);
        assert_eq!(query::camera(&world).eye_position(), *to);
    }

    #[test]
    fn goal_is_reported_once() {
        let mut world = world();
        let mut events = Vec::new();
        apply(&mut world, Command::ReachGoal, &mut events);
        apply(&mut world, Command::ReachGoal, &mut events);
        assert_eq!(events, vec![Event::GoalReached]);
        assert_eq!(query::outcome(&world), Outcome::Won);
    }

    #[test]
    fn structure_profile_is_addressable_by_kind() {
        let mut config = Config::default();
        config.structure_mut(StructureKind::Windmill).yaw_degrees = 45.0;
        assert_eq!(config.structure(StructureKind::Windmill).yaw_degrees, 45.0);
        assert_eq!(config.structure(StructureKind::House).yaw_degrees, 0.0);
    }
}
