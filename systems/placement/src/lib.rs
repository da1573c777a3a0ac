#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural placement of structures, billboard trees and batteries.
//!
//! Structures snap to a coarse grid so they never overlap each other, while
//! trees and batteries are scattered uniformly and rejected when they land too
//! close to a structure or to the spawn point. The generator only consumes the
//! random source it is handed, so seeded sources reproduce a layout exactly.

use deep_woods_core::{GroundCoord, StructureKind, Tree, TreeSpecies, WorldBoundary};
use rand::{seq::SliceRandom, Rng};
use thiserror::Error;
use tracing::debug;

/// Number of structure slots reserved on the grid.
pub const STRUCTURE_COUNT: usize = StructureKind::ALL.len();

/// Tunable parameters of the placement generator.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Playable square that every sampled coordinate stays inside.
    pub boundary: WorldBoundary,
    /// Half width of the structure candidate grid, centred on the origin.
    pub grid_extent: f32,
    /// Spacing between neighbouring structure candidates.
    pub grid_step: f32,
    /// Radius around the origin kept free of structures so the spawn is clear.
    pub spawn_clearance: f32,
    /// Distance kept between scattered samples and the hard boundary.
    pub boundary_inset: f32,
    /// Radius around the origin kept free of trees and batteries.
    pub origin_exclusion: f32,
    /// Number of distinct billboard species.
    pub tree_species: u8,
    /// Trees attempted for every species.
    pub trees_per_species: usize,
    /// Minimum distance between a tree and any structure.
    pub tree_separation: f32,
    /// Batteries attempted across the map.
    pub battery_count: usize,
    /// Minimum distance between a battery and any structure.
    pub battery_separation: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            boundary: WorldBoundary::symmetric(20.0),
            grid_extent: 15.0,
            grid_step: 5.0,
            spawn_clearance: 5.0,
            boundary_inset: 1.0,
            origin_exclusion: 1.5,
            tree_species: 4,
            trees_per_species: 100,
            tree_separation: 3.0,
            battery_count: 10,
            battery_separation: 2.0,
        }
    }
}

/// Fatal configuration errors raised while reserving structure slots.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PlacementError {
    /// The grid spacing cannot produce a finite candidate set.
    #[error("grid step must be positive and finite (received {step})")]
    InvalidGridStep {
        /// Offending grid spacing.
        step: f32,
    },
    /// The candidate grid is too sparse for the structures that must be placed.
    #[error("structure grid offers {available} candidates but {required} are required")]
    InsufficientCandidates {
        /// Candidates left after the spawn clearance was applied.
        available: usize,
        /// Structures that need a slot.
        required: usize,
    },
}

/// Complete set of coordinates produced for a new world.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    /// One slot per structure, in [`StructureKind::ALL`] order.
    pub structures: [GroundCoord; STRUCTURE_COUNT],
    /// Billboard trees of every species.
    pub trees: Vec<Tree>,
    /// Battery pickup positions.
    pub batteries: Vec<GroundCoord>,
}

impl Layout {
    /// Slot reserved for the provided structure.
    #[must_use]
    pub fn structure(&self, kind: StructureKind) -> GroundCoord {
        let index = StructureKind::ALL
            .iter()
            .position(|candidate| *candidate == kind)
            .unwrap_or(0);
        self.structures[index]
    }
}

/// Placement generator bound to a configuration.
#[derive(Clone, Debug, Default)]
pub struct Placement {
    config: Config,
}

impl Placement {
    /// Creates a generator using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Configuration used by the generator.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Produces every coordinate a fresh world needs.
    pub fn layout<R>(&self, rng: &mut R) -> Result<Layout, PlacementError>
    where
        R: Rng + ?Sized,
    {
        let structures = self.structure_slots(rng)?;

        let mut trees = Vec::new();
        for species in 0..self.config.tree_species {
            let slots = self.tree_slots(
                &structures,
                self.config.trees_per_species,
                self.config.tree_separation,
                rng,
            );
            trees.extend(slots.into_iter().map(|coord| Tree {
                species: TreeSpecies::new(species),
                coord,
            }));
        }

        let batteries = self.battery_slots(&structures, rng);

        debug!(
            trees = trees.len(),
            batteries = batteries.len(),
            "scattered decorations"
        );

        Ok(Layout {
            structures,
            trees,
            batteries,
        })
    }

    /// Enumerates the structure grid, skipping candidates near the spawn point.
    pub fn structure_candidates(&self) -> Result<Vec<GroundCoord>, PlacementError> {
        let step = self.config.grid_step;
        if !(step.is_finite() && step > 0.0) {
            return Err(PlacementError::InvalidGridStep { step });
        }

        let extent = self.config.grid_extent.abs();
        let steps = ((2.0 * extent) / step + 1e-4).floor() as u32;
        let clearance = self.config.spawn_clearance;

        let mut candidates = Vec::new();
        for column in 0..=steps {
            for row in 0..=steps {
                let coord = GroundCoord::new(
                    -extent + column as f32 * step,
                    -extent + row as f32 * step,
                );
                if coord.length() > clearance {
                    candidates.push(coord);
                }
            }
        }
        Ok(candidates)
    }

    /// Reserves one distinct grid slot per structure.
    pub fn structure_slots<R>(
        &self,
        rng: &mut R,
    ) -> Result<[GroundCoord; STRUCTURE_COUNT], PlacementError>
    where
        R: Rng + ?Sized,
    {
        let mut candidates = self.structure_candidates()?;
        if candidates.len() < STRUCTURE_COUNT {
            return Err(PlacementError::InsufficientCandidates {
                available: candidates.len(),
                required: STRUCTURE_COUNT,
            });
        }

        candidates.shuffle(rng);
        let mut slots = [GroundCoord::new(0.0, 0.0); STRUCTURE_COUNT];
        slots.copy_from_slice(&candidates[..STRUCTURE_COUNT]);

        for (kind, slot) in StructureKind::ALL.iter().zip(slots.iter()) {
            debug!(?kind, x = slot.x(), z = slot.z(), "reserved structure slot");
        }
        Ok(slots)
    }

    /// Scatters the configured number of battery pickups.
    pub fn battery_slots<R>(&self, reserved: &[GroundCoord], rng: &mut R) -> Vec<GroundCoord>
    where
        R: Rng + ?Sized,
    {
        self.tree_slots(
            reserved,
            self.config.battery_count,
            self.config.battery_separation,
            rng,
        )
    }

    /// Scatters up to `count` points away from the reserved coordinates.
    ///
    /// Exactly `count + 1` samples are drawn; rejected samples are dropped, so
    /// the result may hold fewer than `count` points.
    pub fn tree_slots<R>(
        &self,
        reserved: &[GroundCoord],
        count: usize,
        min_separation: f32,
        rng: &mut R,
    ) -> Vec<GroundCoord>
    where
        R: Rng + ?Sized,
    {
        let area = self.config.boundary.inset(self.config.boundary_inset);
        let mut accepted = Vec::with_capacity(count);

        for _ in 0..=count {
            let sample = GroundCoord::new(
                rng.gen_range(area.min()..=area.max()),
                rng.gen_range(area.min()..=area.max()),
            );

            if sample.length() <= self.config.origin_exclusion {
                continue;
            }

            let clear = reserved
                .iter()
                .all(|slot| slot.distance(sample) > min_separation);
            if clear && accepted.len() < count {
                accepted.push(sample);
            }
        }

        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_excludes_spawn_disk() {
        let placement = Placement::default();
        let candidates = placement.structure_candidates().expect("valid grid");
        assert_eq!(candidates.len(), 49 - 5);
        assert!(candidates.iter().all(|coord| coord.length() > 5.0));
    }

    #[test]
    fn zero_step_is_rejected() {
        let placement = Placement::new(Config {
            grid_step: 0.0,
            ..Config::default()
        });
        assert_eq!(
            placement.structure_candidates(),
            Err(PlacementError::InvalidGridStep { step: 0.0 })
        );
    }
}
