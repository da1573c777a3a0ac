#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-frame orchestration of player intents into world commands.
//!
//! Movement is resolved against a private probe of the camera so that several
//! held directions in the same frame see the position produced by the earlier
//! ones. Steps that would enter an obstacle or leave the boundary are replaced
//! by a step in the opposite direction. The frame always closes with a
//! [`Command::Tick`].

use deep_woods_core::{
    Battery, BatteryId, Command, Event, Intents, MoveDirection, PlacedObject, Renderable,
    Timestamp, Tree, WorldBoundary,
};
use deep_woods_system_collision::{Collider, Config as CollisionConfig};
use deep_woods_system_navigation::Camera;
use glam::Vec3;

/// Tunable parameters of the progress controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Distance covered by one step per frame.
    pub speed: f32,
    /// Margins used for blocking, goal arrival and pickups.
    pub collision: CollisionConfig,
    /// Offset from the goal origin the teleport cheat lands on.
    pub teleport_offset: Vec3,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            speed: 0.02,
            collision: CollisionConfig::default(),
            teleport_offset: Vec3::new(0.0, 0.0, 1.0),
        }
    }
}

/// Read-only snapshot of the world the controller resolves a frame against.
#[derive(Clone, Copy, Debug)]
pub struct Surroundings<'a> {
    /// Player camera as currently committed.
    pub camera: &'a Camera,
    /// Placed structures, the goal included.
    pub objects: &'a [PlacedObject],
    /// Billboard trees.
    pub trees: &'a [Tree],
    /// Batteries still lying in the world.
    pub batteries: &'a [Battery],
    /// Structure that wins the game when reached.
    pub goal: Option<&'a PlacedObject>,
}

/// Game progress controller.
#[derive(Debug)]
pub struct Progress {
    config: Config,
    collider: Collider,
    won: bool,
    quit: bool,
}

impl Progress {
    /// Creates a controller guarding the provided boundary.
    #[must_use]
    pub fn new(boundary: WorldBoundary, config: Config) -> Self {
        Self {
            config,
            collider: Collider::new(boundary, config.collision),
            won: false,
            quit: false,
        }
    }

    /// Configuration the controller was built with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Whether the goal was reached.
    #[must_use]
    pub const fn win(&self) -> bool {
        self.won
    }

    /// Whether the host loop should stop.
    #[must_use]
    pub const fn quit(&self) -> bool {
        self.quit
    }

    /// Consumes world events and the frame's intents to emit world commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        intents: &Intents,
        now: Timestamp,
        surroundings: Surroundings<'_>,
        out: &mut Vec<Command>,
    ) {
        self.observe(events);
        if self.quit {
            return;
        }

        if intents.quit {
            out.push(Command::RequestQuit);
        }

        let mut probe = surroundings.camera.clone();

        if intents.teleport_cheat {
            if let Some(goal) = surroundings.goal {
                let mut position = goal.object_coord() + self.config.teleport_offset;
                position.y = probe.eye_position().y;
                probe.teleport(position);
                out.push(Command::TeleportCamera { position });
            }
        }

        if intents.reset {
            probe.reset();
            out.push(Command::ResetCamera);
        }

        if let Some((mouse_x, mouse_y)) = intents.mouse {
            let _ = probe.mouse_look(mouse_x, mouse_y);
            out.push(Command::LookCamera { mouse_x, mouse_y });
        }

        if intents.toggle_light {
            out.push(Command::ToggleLight { now });
        }

        let mut goal_claimed = false;
        let mut collected: Vec<BatteryId> = Vec::new();
        for direction in MoveDirection::ALL {
            if !intents.wants(direction) {
                continue;
            }

            let target = probe.hypothetical(direction, self.config.speed);
            if self
                .collider
                .blocks(target, surroundings.objects, surroundings.trees)
            {
                let direction = direction.opposite();
                let _ = probe.commit(direction, self.config.speed, now);
                out.push(Command::MoveCamera {
                    direction,
                    speed: self.config.speed,
                    now,
                });
                continue;
            }

            let eye = probe.commit(direction, self.config.speed, now);
            out.push(Command::MoveCamera {
                direction,
                speed: self.config.speed,
                now,
            });

            if !goal_claimed {
                if let Some(goal) = surroundings.goal {
                    if self.collider.reached_goal(eye, goal) {
                        goal_claimed = true;
                        out.push(Command::ReachGoal);
                    }
                }
            }

            for battery in surroundings.batteries {
                if collected.contains(&battery.id) || !self.collider.touches_battery(eye, battery)
                {
                    continue;
                }
                collected.push(battery.id);
                out.push(Command::CollectBattery {
                    battery: battery.id,
                    now,
                });
            }
        }

        out.push(Command::Tick { now });
    }

    fn observe(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::GoalReached => {
                    self.won = true;
                    self.quit = true;
                }
                Event::GameOver | Event::QuitRequested => self.quit = true,
                _ => {}
            }
        }
    }
}
