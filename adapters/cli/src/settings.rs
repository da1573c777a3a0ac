//! TOML settings overriding the built-in tuning.
//!
//! Every section and field is optional; anything left out keeps the default
//! the corresponding system ships with.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use deep_woods_core::{Extents, StructureKind, WorldBoundary};
use deep_woods_system_collision::Config as CollisionConfig;
use deep_woods_system_navigation::Config as CameraConfig;
use deep_woods_system_placement::Config as PlacementConfig;
use deep_woods_system_power::Config as PowerConfig;
use deep_woods_system_progress::Config as ProgressConfig;
use deep_woods_world::{Config as WorldConfig, StructureProfile};
use glam::Vec3;
use serde::Deserialize;

/// Parsed settings file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    pub(crate) world: WorldSection,
    pub(crate) placement: PlacementSection,
    pub(crate) camera: CameraSection,
    pub(crate) power: PowerSection,
    pub(crate) movement: MovementSection,
    pub(crate) structures: StructuresSection,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WorldSection {
    pub(crate) seed: Option<u64>,
    pub(crate) boundary: WorldBoundary,
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            seed: None,
            boundary: PlacementConfig::default().boundary,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PlacementSection {
    grid_extent: f32,
    grid_step: f32,
    spawn_clearance: f32,
    boundary_inset: f32,
    origin_exclusion: f32,
    tree_species: u8,
    trees_per_species: usize,
    tree_separation: f32,
    battery_count: usize,
    battery_separation: f32,
}

impl Default for PlacementSection {
    fn default() -> Self {
        let defaults = PlacementConfig::default();
        Self {
            grid_extent: defaults.grid_extent,
            grid_step: defaults.grid_step,
            spawn_clearance: defaults.spawn_clearance,
            boundary_inset: defaults.boundary_inset,
            origin_exclusion: defaults.origin_exclusion,
            tree_species: defaults.tree_species,
            trees_per_species: defaults.trees_per_species,
            tree_separation: defaults.tree_separation,
            battery_count: defaults.battery_count,
            battery_separation: defaults.battery_separation,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CameraSection {
    start_position: [f32; 3],
    start_direction: [f32; 3],
    base_height: f32,
    bob_amplitude: f32,
    bob_frequency: f32,
    look_sensitivity: f32,
    mouse_y_limit: f32,
}

impl Default for CameraSection {
    fn default() -> Self {
        let defaults = CameraConfig::default();
        Self {
            start_position: defaults.start_position.to_array(),
            start_direction: defaults.start_direction.to_array(),
            base_height: defaults.base_height,
            bob_amplitude: defaults.bob_amplitude,
            bob_frequency: defaults.bob_frequency,
            look_sensitivity: defaults.look_sensitivity,
            mouse_y_limit: defaults.mouse_y_limit,
        }
    }
}

/// Durations are written in seconds, recovery delays in milliseconds.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PowerSection {
    initial_charge: f64,
    low_threshold: f64,
    grace_period: f64,
    flicker_probability: f64,
    recovery_delay_min_ms: u64,
    recovery_delay_max_ms: u64,
    refill: f64,
    depleted_baseline: f64,
    headlight_range: f32,
    headlight_color: [f32; 3],
}

impl Default for PowerSection {
    fn default() -> Self {
        let defaults = PowerConfig::default();
        Self {
            initial_charge: defaults.initial_charge.as_secs_f64(),
            low_threshold: defaults.low_threshold.as_secs_f64(),
            grace_period: defaults.grace_period.as_secs_f64(),
            flicker_probability: defaults.flicker_probability,
            recovery_delay_min_ms: millis(defaults.recovery_delay_min),
            recovery_delay_max_ms: millis(defaults.recovery_delay_max),
            refill: defaults.refill.as_secs_f64(),
            depleted_baseline: defaults.depleted_baseline.as_secs_f64(),
            headlight_range: defaults.headlight_range,
            headlight_color: defaults.headlight_color,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MovementSection {
    speed: f32,
    object_margin: f32,
    goal_margin: f32,
    pickup_margin: f32,
    teleport_offset: [f32; 3],
}

impl Default for MovementSection {
    fn default() -> Self {
        let defaults = ProgressConfig::default();
        Self {
            speed: defaults.speed,
            object_margin: defaults.collision.object_margin,
            goal_margin: defaults.collision.goal_margin,
            pickup_margin: defaults.collision.pickup_margin,
            teleport_offset: defaults.teleport_offset.to_array(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct StructuresSection {
    house: StructureSection,
    chapel: StructureSection,
    windmill: StructureSection,
    chalice: StructureSection,
}

impl Default for StructuresSection {
    fn default() -> Self {
        Self {
            house: StructureSection::from(StructureProfile::default_for(StructureKind::House)),
            chapel: StructureSection::from(StructureProfile::default_for(StructureKind::Chapel)),
            windmill: StructureSection::from(StructureProfile::default_for(
                StructureKind::Windmill,
            )),
            chalice: StructureSection::from(StructureProfile::default_for(StructureKind::Chalice)),
        }
    }
}

impl StructuresSection {
    fn profile(&self, kind: StructureKind) -> StructureProfile {
        let section = match kind {
            StructureKind::House => &self.house,
            StructureKind::Chapel => &self.chapel,
            StructureKind::Windmill => &self.windmill,
            StructureKind::Chalice => &self.chalice,
        };
        StructureProfile {
            extents: Extents::new(Vec3::from(section.min), Vec3::from(section.max)),
            yaw_degrees: section.yaw_degrees,
        }
    }
}

/// Bounding box corners of the mesh in its own space, plus its placement yaw.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct StructureSection {
    min: [f32; 3],
    max: [f32; 3],
    #[serde(default)]
    yaw_degrees: f32,
}

impl From<StructureProfile> for StructureSection {
    fn from(profile: StructureProfile) -> Self {
        Self {
            min: profile.extents.min().to_array(),
            max: profile.extents.max().to_array(),
            yaw_degrees: profile.yaw_degrees,
        }
    }
}

impl Settings {
    /// Reads and parses a settings file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse settings file {}", path.display()))
    }

    /// Parses settings from TOML text.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid settings toml")
    }

    /// Builds the world configuration described by the settings.
    pub(crate) fn world_config(&self) -> Result<WorldConfig> {
        let placement = &self.placement;
        let camera = &self.camera;
        let power = &self.power;

        Ok(WorldConfig {
            placement: PlacementConfig {
                boundary: self.world.boundary,
                grid_extent: placement.grid_extent,
                grid_step: placement.grid_step,
                spawn_clearance: placement.spawn_clearance,
                boundary_inset: placement.boundary_inset,
                origin_exclusion: placement.origin_exclusion,
                tree_species: placement.tree_species,
                trees_per_species: placement.trees_per_species,
                tree_separation: placement.tree_separation,
                battery_count: placement.battery_count,
                battery_separation: placement.battery_separation,
            },
            camera: CameraConfig {
                start_position: Vec3::from(camera.start_position),
                start_direction: Vec3::from(camera.start_direction),
                base_height: camera.base_height,
                bob_amplitude: camera.bob_amplitude,
                bob_frequency: camera.bob_frequency,
                look_sensitivity: camera.look_sensitivity,
                mouse_y_limit: camera.mouse_y_limit,
            },
            power: PowerConfig {
                initial_charge: seconds("power.initial_charge", power.initial_charge)?,
                low_threshold: seconds("power.low_threshold", power.low_threshold)?,
                grace_period: seconds("power.grace_period", power.grace_period)?,
                flicker_probability: power.flicker_probability,
                recovery_delay_min: Duration::from_millis(power.recovery_delay_min_ms),
                recovery_delay_max: Duration::from_millis(power.recovery_delay_max_ms),
                refill: seconds("power.refill", power.refill)?,
                depleted_baseline: seconds("power.depleted_baseline", power.depleted_baseline)?,
                headlight_range: power.headlight_range,
                headlight_color: power.headlight_color,
            },
            structures: StructureKind::ALL.map(|kind| self.structures.profile(kind)),
        })
    }

    /// Builds the progress controller configuration described by the settings.
    pub(crate) fn progress_config(&self) -> ProgressConfig {
        let movement = &self.movement;
        ProgressConfig {
            speed: movement.speed,
            collision: CollisionConfig {
                object_margin: movement.object_margin,
                goal_margin: movement.goal_margin,
                pickup_margin: movement.pickup_margin,
            },
            teleport_offset: Vec3::from(movement.teleport_offset),
        }
    }
}

fn seconds(field: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .with_context(|| format!("{field} must be a finite, non-negative number of seconds"))
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
