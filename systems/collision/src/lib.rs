#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Ground-plane collision queries between the camera and placed scenery.
//!
//! Collision is 2.5D: only the `x`/`z` footprint of an object matters and the
//! vertical axis is ignored. Objects are tested in their own local space by
//! undoing the placement translation and yaw, which keeps the test an
//! axis-aligned box comparison regardless of how the object was rotated.

use deep_woods_core::{
    Battery, GroundCoord, ObjectId, PlacedObject, Renderable, Tree, WorldBoundary,
};
use glam::{Quat, Vec3};

/// Half width of the square footprint blocking movement around a tree trunk.
pub const TREE_HALF_WIDTH: f32 = 0.1;

/// Half width of the square footprint of a battery pickup.
pub const BATTERY_HALF_WIDTH: f32 = 0.1;

/// Expresses a world-space point in the object's untransformed mesh space.
#[must_use]
pub fn to_object_space<O>(point: Vec3, object: &O) -> Vec3
where
    O: Renderable + ?Sized,
{
    let offset = point - object.object_coord();
    Quat::from_rotation_y(-object.rotation_degrees().to_radians()) * offset
}

/// Whether `point` lies inside the object's footprint grown by `margin`.
///
/// Objects whose extents are not finite yet never collide.
#[must_use]
pub fn is_inside_object<O>(point: Vec3, object: &O, margin: f32) -> bool
where
    O: Renderable + ?Sized,
{
    let min = object.min_coord();
    let max = object.max_coord();
    if !(min.is_finite() && max.is_finite()) {
        return false;
    }

    let local = to_object_space(point, object);
    local.x >= min.x - margin
        && local.x <= max.x + margin
        && local.z >= min.z - margin
        && local.z <= max.z + margin
}

/// Whether `point` lies inside the square footprint of a tree grown by `margin`.
#[must_use]
pub fn is_inside_tree(point: Vec3, tree: &Tree, margin: f32) -> bool {
    within_square(point, tree.coord, TREE_HALF_WIDTH + margin)
}

/// Whether `point` lies inside any object or tree footprint.
#[must_use]
pub fn is_inside_any_object<O>(point: Vec3, objects: &[O], trees: &[Tree], margin: f32) -> bool
where
    O: Renderable,
{
    objects
        .iter()
        .any(|object| is_inside_object(point, object, margin))
        || trees.iter().any(|tree| is_inside_tree(point, tree, margin))
}

/// Whether both ground coordinates of `point` lie inside the boundary.
#[must_use]
pub fn is_within_boundary(point: Vec3, boundary: &WorldBoundary) -> bool {
    let inside = |value: f32| value >= boundary.min() && value <= boundary.max();
    inside(point.x) && inside(point.z)
}

fn within_square(point: Vec3, centre: GroundCoord, half_width: f32) -> bool {
    (point.x - centre.x()).abs() <= half_width && (point.z - centre.z()).abs() <= half_width
}

/// Margins applied by the [`Collider`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Margin keeping the camera away from structures and trees.
    pub object_margin: f32,
    /// Margin around the goal that counts as arriving there.
    pub goal_margin: f32,
    /// Margin around a battery within which it is picked up.
    pub pickup_margin: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            object_margin: 0.1,
            goal_margin: 0.2,
            pickup_margin: 0.3,
        }
    }
}

/// Reason a candidate position was rejected.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Collision {
    /// The point left the playable square.
    OutOfBounds,
    /// The point entered a structure footprint.
    Object(ObjectId),
    /// The point entered the trunk of the tree at the provided index.
    Tree(usize),
}

/// Collision queries bound to a boundary and a set of margins.
#[derive(Clone, Copy, Debug)]
pub struct Collider {
    boundary: WorldBoundary,
    config: Config,
}

impl Collider {
    /// Creates a collider for the provided playable square.
    #[must_use]
    pub const fn new(boundary: WorldBoundary, config: Config) -> Self {
        Self { boundary, config }
    }

    /// Margins used by the collider.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Playable square enforced by the collider.
    #[must_use]
    pub const fn boundary(&self) -> &WorldBoundary {
        &self.boundary
    }

    /// Reports the first obstacle hit by `point`, boundary first.
    #[must_use]
    pub fn check(&self, point: Vec3, objects: &[PlacedObject], trees: &[Tree]) -> Option<Collision> {
        if !is_within_boundary(point, &self.boundary) {
            return Some(Collision::OutOfBounds);
        }

        let margin = self.config.object_margin;
        if let Some(object) = objects
            .iter()
            .find(|object| is_inside_object(point, *object, margin))
        {
            return Some(Collision::Object(object.id()));
        }

        trees
            .iter()
            .position(|tree| is_inside_tree(point, tree, margin))
            .map(Collision::Tree)
    }

    /// Whether moving to `point` must be rejected.
    #[must_use]
    pub fn blocks(&self, point: Vec3, objects: &[PlacedObject], trees: &[Tree]) -> bool {
        self.check(point, objects, trees).is_some()
    }

    /// Whether `point` is close enough to the goal object to count as found.
    #[must_use]
    pub fn reached_goal<O>(&self, point: Vec3, goal: &O) -> bool
    where
        O: Renderable + ?Sized,
    {
        is_inside_object(point, goal, self.config.goal_margin)
    }

    /// Whether `point` is close enough to pick the battery up.
    #[must_use]
    pub fn touches_battery(&self, point: Vec3, battery: &Battery) -> bool {
        within_square(
            point,
            battery.coord,
            BATTERY_HALF_WIDTH + self.config.pickup_margin,
        )
    }
}
