#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Deep Woods engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. The progress system turns host
//! [`Intents`] into [`Command`] values, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values that systems
//! and adapters react to. Nothing in this crate reads a clock or a random
//! source; time arrives as [`Timestamp`] values supplied by the host.

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Deep In Woods";

/// Monotonic host clock reading measured in milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp from a millisecond counter value.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Millisecond counter value of the timestamp.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Returns the timestamp shifted forward by the provided duration.
    #[must_use]
    pub fn saturating_add(self, duration: Duration) -> Self {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }

    /// Time elapsed from `earlier` to `self`, or zero when `earlier` is later.
    #[must_use]
    pub fn saturating_since(self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

/// Point on the ground plane expressed as world-space `x` and `z`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundCoord {
    x: f32,
    z: f32,
}

impl GroundCoord {
    /// Creates a new ground-plane coordinate.
    #[must_use]
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// World-space `x` component.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// World-space `z` component.
    #[must_use]
    pub const fn z(&self) -> f32 {
        self.z
    }

    /// Euclidean distance between two ground coordinates.
    #[must_use]
    pub fn distance(self, other: GroundCoord) -> f32 {
        (self.x - other.x).hypot(self.z - other.z)
    }

    /// Distance from the world origin.
    #[must_use]
    pub fn length(self) -> f32 {
        self.x.hypot(self.z)
    }

    /// Lifts the coordinate into world space at the provided height.
    #[must_use]
    pub const fn at_height(self, y: f32) -> Vec3 {
        Vec3::new(self.x, y, self.z)
    }

    /// Projects a world-space point onto the ground plane.
    #[must_use]
    pub const fn from_world(point: Vec3) -> Self {
        Self {
            x: point.x,
            z: point.z,
        }
    }
}

/// Square playable area on the ground plane, `[min, max]` on both axes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "BoundaryBounds")]
pub struct WorldBoundary {
    min: f32,
    max: f32,
}

/// Raw bounds as written in settings, ordered on the way in.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BoundaryBounds {
    min: f32,
    max: f32,
}

impl From<BoundaryBounds> for WorldBoundary {
    fn from(bounds: BoundaryBounds) -> Self {
        Self::new(bounds.min, bounds.max)
    }
}

impl WorldBoundary {
    /// Creates a boundary spanning `[min, max]` along `x` and `z`.
    ///
    /// Reversed bounds are swapped so that `min <= max` always holds.
    #[must_use]
    pub fn new(min: f32, max: f32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Boundary centred on the origin with the provided half extent.
    #[must_use]
    pub fn symmetric(half_extent: f32) -> Self {
        Self::new(-half_extent.abs(), half_extent.abs())
    }

    /// Lowest allowed coordinate on either axis.
    #[must_use]
    pub const fn min(&self) -> f32 {
        self.min
    }

    /// Highest allowed coordinate on either axis.
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// Boundary shrunk by `inset` on every side, never inverting.
    #[must_use]
    pub fn inset(&self, inset: f32) -> Self {
        let centre = (self.min + self.max) * 0.5;
        let min = (self.min + inset).min(centre);
        let max = (self.max - inset).max(centre);
        Self { min, max }
    }
}

/// Local-space axis-aligned bounding box of an untransformed mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extents {
    min: Vec3,
    max: Vec3,
}

impl Extents {
    /// Creates extents from two corners, ordering them componentwise.
    #[must_use]
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Sentinel extents used before a mesh has been loaded.
    ///
    /// The sentinel box is inverted (`+∞` minimum, `-∞` maximum) so that no
    /// point can ever fall inside it.
    #[must_use]
    pub const fn unloaded() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    /// Minimum corner of the box.
    #[must_use]
    pub const fn min(&self) -> Vec3 {
        self.min
    }

    /// Maximum corner of the box.
    #[must_use]
    pub const fn max(&self) -> Vec3 {
        self.max
    }

    /// Whether both corners are finite.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Size of the box along every axis, zero while unloaded.
    #[must_use]
    pub fn size(&self) -> Vec3 {
        if self.is_loaded() {
            self.max - self.min
        } else {
            Vec3::ZERO
        }
    }
}

/// Accessors the core consumes from an externally owned renderable mesh.
///
/// The core never reads mesh data; it only needs the placement transform and
/// the untransformed bounding box.
pub trait Renderable {
    /// Minimum corner of the untransformed bounding box.
    fn min_coord(&self) -> Vec3;
    /// Maximum corner of the untransformed bounding box.
    fn max_coord(&self) -> Vec3;
    /// World placement point of the object.
    fn object_coord(&self) -> Vec3;
    /// Moves the object to a new placement point.
    fn set_object_coord(&mut self, coord: Vec3);
    /// Rotation about the vertical axis, in degrees.
    fn rotation_degrees(&self) -> f32;
}

/// The four structures scattered through the woods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    /// Abandoned house.
    House,
    /// Small chapel.
    Chapel,
    /// Windmill.
    Windmill,
    /// The chalice the player is searching for.
    Chalice,
}

impl StructureKind {
    /// Every structure in placement order.
    pub const ALL: [StructureKind; 4] = [
        StructureKind::House,
        StructureKind::Chapel,
        StructureKind::Windmill,
        StructureKind::Chalice,
    ];

    /// Whether reaching this structure wins the game.
    #[must_use]
    pub const fn is_goal(self) -> bool {
        matches!(self, StructureKind::Chalice)
    }
}

/// Unique identifier of a placed object within the world arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

impl ObjectId {
    /// Creates a new object identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Static scenery placed once at world generation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedObject {
    id: ObjectId,
    kind: StructureKind,
    origin: Vec3,
    yaw_degrees: f32,
    extents: Extents,
}

impl PlacedObject {
    /// Creates a placed object with the given transform and bounding box.
    #[must_use]
    pub const fn new(
        id: ObjectId,
        kind: StructureKind,
        origin: Vec3,
        yaw_degrees: f32,
        extents: Extents,
    ) -> Self {
        Self {
            id,
            kind,
            origin,
            yaw_degrees,
            extents,
        }
    }

    /// Identifier allocated by the world.
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    /// Structure represented by the object.
    #[must_use]
    pub const fn kind(&self) -> StructureKind {
        self.kind
    }

    /// Local-space bounding box of the object's mesh.
    #[must_use]
    pub const fn extents(&self) -> Extents {
        self.extents
    }

    /// Replaces the bounding box once the mesh has been loaded.
    pub fn set_extents(&mut self, extents: Extents) {
        self.extents = extents;
    }
}

impl Renderable for PlacedObject {
    fn min_coord(&self) -> Vec3 {
        self.extents.min()
    }

    fn max_coord(&self) -> Vec3 {
        self.extents.max()
    }

    fn object_coord(&self) -> Vec3 {
        self.origin
    }

    fn set_object_coord(&mut self, coord: Vec3) {
        self.origin = coord;
    }

    fn rotation_degrees(&self) -> f32 {
        self.yaw_degrees
    }
}

/// Billboard tree species; each species is drawn with its own texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TreeSpecies(u8);

impl TreeSpecies {
    /// Creates a species identifier.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the species.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Billboard tree standing on the ground plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tree {
    /// Texture family used to draw the tree.
    pub species: TreeSpecies,
    /// Ground position of the trunk.
    pub coord: GroundCoord,
}

/// Unique identifier assigned to a battery pickup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatteryId(u32);

impl BatteryId {
    /// Creates a new battery identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Collectible battery lying on the ground.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Battery {
    /// Identifier allocated by the world.
    pub id: BatteryId,
    /// Ground position of the pickup.
    pub coord: GroundCoord,
}

/// Horizontal movement directions available to the camera.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    /// Along the view direction.
    Forward,
    /// Against the view direction.
    Backward,
    /// Against the right vector.
    Left,
    /// Along the right vector.
    Right,
}

impl MoveDirection {
    /// Every direction in the order the host input is evaluated.
    pub const ALL: [MoveDirection; 4] = [
        MoveDirection::Forward,
        MoveDirection::Backward,
        MoveDirection::Left,
        MoveDirection::Right,
    ];

    /// Direction that undoes a step in `self`.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Per-frame host input, already reduced to game intents.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Intents {
    /// Move forward is held.
    pub forward: bool,
    /// Move backward is held.
    pub backward: bool,
    /// Strafe left is held.
    pub left: bool,
    /// Strafe right is held.
    pub right: bool,
    /// Reset the camera to its initial position.
    pub reset: bool,
    /// Flip the flashlight switch.
    pub toggle_light: bool,
    /// Jump next to the chalice.
    pub teleport_cheat: bool,
    /// Leave the game.
    pub quit: bool,
    /// Accumulated absolute mouse position, when the mouse moved this frame.
    pub mouse: Option<(f32, f32)>,
}

impl Intents {
    /// Whether movement in the provided direction is requested.
    #[must_use]
    pub const fn wants(&self, direction: MoveDirection) -> bool {
        match direction {
            MoveDirection::Forward => self.forward,
            MoveDirection::Backward => self.backward,
            MoveDirection::Left => self.left,
            MoveDirection::Right => self.right,
        }
    }
}

/// Reasons the flashlight switched off.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OffCause {
    /// The player flipped the switch.
    Player,
    /// The low battery made the light cut out.
    Flicker,
    /// The battery ran dry.
    Exhausted,
}

/// Reasons the flashlight switched on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OnCause {
    /// The player flipped the switch.
    Player,
    /// The light came back after a flicker.
    Recovered,
    /// A battery pickup restored enough charge.
    Recharged,
}

/// How the current run ended, if it has.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The player is still exploring.
    #[default]
    InProgress,
    /// The chalice was found.
    Won,
    /// The flashlight stayed dead past the grace window.
    Lost,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the flashlight state machine to the provided host time.
    Tick {
        /// Host clock reading for the frame.
        now: Timestamp,
    },
    /// Commits a horizontal camera step.
    MoveCamera {
        /// Direction of travel.
        direction: MoveDirection,
        /// Distance of the step in world units.
        speed: f32,
        /// Host clock reading used for the walking bob.
        now: Timestamp,
    },
    /// Feeds the absolute mouse position to the camera.
    LookCamera {
        /// Horizontal mouse position in pixels.
        mouse_x: f32,
        /// Vertical mouse position in pixels.
        mouse_y: f32,
    },
    /// Returns the camera to its initial position.
    ResetCamera,
    /// Places the camera at an arbitrary point.
    TeleportCamera {
        /// Destination eye position.
        position: Vec3,
    },
    /// Flips the flashlight switch.
    ToggleLight {
        /// Host clock reading for the frame.
        now: Timestamp,
    },
    /// Picks up a battery lying in the world.
    CollectBattery {
        /// Identifier of the battery to remove.
        battery: BatteryId,
        /// Host clock reading for the frame.
        now: Timestamp,
    },
    /// Marks the chalice as found.
    ReachGoal,
    /// Requests that the host loop terminates.
    RequestQuit,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the host clock advanced.
    TimeAdvanced {
        /// Host clock reading for the frame.
        now: Timestamp,
    },
    /// Confirms that the camera moved horizontally.
    CameraMoved {
        /// Direction of the committed step.
        direction: MoveDirection,
        /// Eye position before the step.
        from: Vec3,
        /// Eye position after the step.
        to: Vec3,
    },
    /// Confirms that the camera view direction changed.
    CameraTurned {
        /// New unit view direction.
        view_direction: Vec3,
    },
    /// Confirms that the camera jumped to a new position.
    CameraRelocated {
        /// Eye position after the jump.
        position: Vec3,
    },
    /// Announces that the flashlight turned on.
    LightSwitchedOn {
        /// Why the light turned on.
        cause: OnCause,
    },
    /// Announces that the flashlight turned off.
    LightSwitchedOff {
        /// Why the light turned off.
        cause: OffCause,
    },
    /// Reports that the player tried to switch on a dead flashlight.
    LightToggleRejected,
    /// Reports the whole seconds left before the dead flashlight ends the run.
    CountdownChanged {
        /// Seconds left in the grace window.
        seconds: u32,
    },
    /// Confirms that a battery was picked up.
    BatteryCollected {
        /// Identifier of the collected battery.
        battery: BatteryId,
        /// Number of batteries still lying in the world.
        remaining: usize,
    },
    /// Announces that the chalice was found.
    GoalReached,
    /// Announces that the flashlight stayed dead for too long.
    GameOver,
    /// Announces that the host loop should terminate.
    QuitRequested,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_since_saturates_for_future_reference() {
        let early = Timestamp::from_millis(1_000);
        let late = Timestamp::from_millis(2_500);
        assert_eq!(late.saturating_since(early), Duration::from_millis(1_500));
        assert_eq!(early.saturating_since(late), Duration::ZERO);
    }

    #[test]
    fn boundary_orders_reversed_bounds() {
        let boundary = WorldBoundary::new(20.0, -20.0);
        assert_eq!(boundary.min(), -20.0);
        assert_eq!(boundary.max(), 20.0);
    }

    #[test]
    fn boundary_inset_never_inverts() {
        let boundary = WorldBoundary::symmetric(2.0);
        let shrunk = boundary.inset(5.0);
        assert!(shrunk.min() <= shrunk.max());
        assert_eq!(shrunk.min(), 0.0);
        assert_eq!(boundary.inset(0.5).max(), 1.5);
    }

    #[test]
    fn unloaded_extents_report_not_loaded() {
        assert!(!Extents::unloaded().is_loaded());
        assert_eq!(Extents::unloaded().size(), Vec3::ZERO);
    }

    #[test]
    fn extents_order_corners() {
        let extents = Extents::new(Vec3::new(1.0, -1.0, 2.0), Vec3::new(-1.0, 1.0, -2.0));
        assert_eq!(extents.min(), Vec3::new(-1.0, -1.0, -2.0));
        assert_eq!(extents.max(), Vec3::new(1.0, 1.0, 2.0));
        assert_eq!(extents.size(), Vec3::new(2.0, 2.0, 4.0));
    }

    #[test]
    fn placed_object_accepts_new_placement() {
        let mut object = PlacedObject::new(
            ObjectId::new(3),
            StructureKind::Chapel,
            Vec3::ZERO,
            45.0,
            Extents::unloaded(),
        );
        object.set_object_coord(Vec3::new(5.0, 0.0, -5.0));
        assert_eq!(object.object_coord(), Vec3::new(5.0, 0.0, -5.0));
        assert_eq!(object.rotation_degrees(), 45.0);
    }

    #[test]
    fn only_the_chalice_is_the_goal() {
        let goals: Vec<_> = StructureKind::ALL
            .into_iter()
            .filter(|kind| kind.is_goal())
            .collect();
        assert_eq!(goals, vec![StructureKind::Chalice]);
    }

    #[test]
    fn opposite_direction_is_an_involution() {
        for direction in MoveDirection::ALL {
            assert_ne!(direction.opposite(), direction);
            assert_eq!(direction.opposite().opposite(), direction);
        }
    }

    #[test]
    fn structure_kind_deserializes_from_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            kind: StructureKind,
        }

        let parsed: Wrapper = toml::from_str("kind = \"windmill\"").expect("parse");
        assert_eq!(parsed.kind, StructureKind::Windmill);
    }

    #[test]
    fn boundary_deserializes_from_toml() {
        let parsed: WorldBoundary = toml::from_str("min = -25.0\nmax = 25.0").expect("parse");
        assert_eq!(parsed, WorldBoundary::symmetric(25.0));
    }

    #[test]
    fn reversed_boundary_is_ordered_when_deserialized() {
        let parsed: WorldBoundary = toml::from_str("min = 25.0\nmax = -25.0").expect("parse");
        assert_eq!(parsed.min(), -25.0);
        assert_eq!(parsed.max(), 25.0);
    }
}
