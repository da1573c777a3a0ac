#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Flashlight battery state machine.
//!
//! The battery charge has exactly one authoritative representation at any
//! instant: while the light is on it is the deadline at which the battery runs
//! dry, while it is off it is the remaining charge. Every transition converts
//! one into the other before switching, so the two can never disagree.
//!
//! Once the battery is exhausted a grace window starts. Collecting a battery
//! within the window revives the light; otherwise the run ends in
//! [`LightState::GameOver`]. Time is only ever read from the `now` argument and
//! randomness only from the supplied source.

use std::time::Duration;

use deep_woods_core::{Event, OffCause, OnCause, Timestamp};
use rand::Rng;

/// Tunable parameters of the flashlight.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Charge of a fresh flashlight.
    pub initial_charge: Duration,
    /// Charge below which the light dims and becomes unreliable.
    pub low_threshold: Duration,
    /// Time the player may spend with a dead battery before losing.
    pub grace_period: Duration,
    /// Chance per tick that a low battery makes the light cut out.
    pub flicker_probability: f64,
    /// Shortest delay before a flickered light comes back.
    pub recovery_delay_min: Duration,
    /// Longest delay before a flickered light comes back.
    pub recovery_delay_max: Duration,
    /// Charge added by a battery pickup.
    pub refill: Duration,
    /// Charge restored by a pickup when the battery was completely dead.
    pub depleted_baseline: Duration,
    /// Reach of the headlight beam at full strength, in world units.
    pub headlight_range: f32,
    /// Colour of the headlight beam at full strength.
    pub headlight_color: [f32; 3],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_charge: Duration::from_secs(70),
            low_threshold: Duration::from_secs(15),
            grace_period: Duration::from_secs(10),
            flicker_probability: 0.02,
            recovery_delay_min: Duration::from_millis(150),
            recovery_delay_max: Duration::from_millis(900),
            refill: Duration::from_secs(30),
            depleted_baseline: Duration::from_secs(30),
            headlight_range: 8.0,
            headlight_color: [1.0, 0.95, 0.8],
        }
    }
}

/// Authoritative state of the flashlight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightState {
    /// The light is burning and the battery dies at `deadline`.
    On {
        /// Instant the remaining charge runs out.
        deadline: Timestamp,
    },
    /// The light is dark and `remaining` charge is stored.
    Off {
        /// Charge left in the battery.
        remaining: Duration,
        /// Why the light went dark.
        cause: OffCause,
    },
    /// The battery stayed dead past the grace window.
    GameOver,
}

/// Headlight parameters handed to the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Headlight {
    /// Whether the beam is visible.
    pub on: bool,
    /// Intensity of the beam in `[0, 1]`.
    pub strength: f32,
    /// Reach of the beam in world units.
    pub range: f32,
    /// Beam colour scaled by strength.
    pub color: [f32; 3],
}

/// Flashlight battery and switch.
#[derive(Clone, Debug)]
pub struct Flashlight {
    config: Config,
    state: LightState,
    strength: f32,
    recover_at: Option<Timestamp>,
    exhausted_at: Option<Timestamp>,
    countdown: u32,
}

impl Flashlight {
    /// Creates a flashlight that switches on at `now` with a fresh battery.
    #[must_use]
    pub fn new(config: Config, now: Timestamp) -> Self {
        let deadline = now.saturating_add(config.initial_charge);
        let countdown = whole_seconds(config.grace_period);
        Self {
            config,
            state: LightState::On { deadline },
            strength: 1.0,
            recover_at: None,
            exhausted_at: None,
            countdown,
        }
    }

    /// Configuration the flashlight was built with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Current authoritative state.
    #[must_use]
    pub const fn state(&self) -> LightState {
        self.state
    }

    /// Whether the light is burning.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        matches!(self.state, LightState::On { .. })
    }

    /// Whether the run was lost to darkness.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        matches!(self.state, LightState::GameOver)
    }

    /// Beam intensity in `[0, 1]`.
    #[must_use]
    pub const fn strength(&self) -> f32 {
        self.strength
    }

    /// Whole seconds left in the grace window.
    #[must_use]
    pub const fn countdown_seconds(&self) -> u32 {
        self.countdown
    }

    /// Instant the battery ran dry, while it stays dry.
    #[must_use]
    pub const fn exhausted_at(&self) -> Option<Timestamp> {
        self.exhausted_at
    }

    /// Charge left in the battery at `now`.
    #[must_use]
    pub fn battery_remaining(&self, now: Timestamp) -> Duration {
        match self.state {
            LightState::On { deadline } => deadline.saturating_since(now),
            LightState::Off { remaining, .. } => remaining,
            LightState::GameOver => Duration::ZERO,
        }
    }

    /// Headlight parameters for the renderer.
    #[must_use]
    pub fn headlight(&self) -> Headlight {
        let strength = if self.is_on() { self.strength } else { 0.0 };
        let [red, green, blue] = self.config.headlight_color;
        Headlight {
            on: self.is_on(),
            strength,
            range: self.config.headlight_range * strength,
            color: [red * strength, green * strength, blue * strength],
        }
    }

    /// Advances the state machine to `now`.
    ///
    /// An `Off` the player chose is never forced back `On`, neither by
    /// recovery from a flicker nor by a recharge above the low threshold.
    pub fn tick<R>(&mut self, now: Timestamp, rng: &mut R, out: &mut Vec<Event>)
    where
        R: Rng + ?Sized,
    {
        match self.state {
            LightState::GameOver => {}
            LightState::On { deadline } => {
                if now > deadline {
                    self.state = LightState::Off {
                        remaining: Duration::ZERO,
                        cause: OffCause::Exhausted,
                    };
                    self.strength = 0.0;
                    self.recover_at = None;
                    self.exhausted_at = Some(deadline);
                    out.push(Event::LightSwitchedOff {
                        cause: OffCause::Exhausted,
                    });
                    self.advance_countdown(now, out);
                    return;
                }

                let remaining = deadline.saturating_since(now);
                if remaining >= self.config.low_threshold {
                    self.strength = 1.0;
                    return;
                }
                // The deadline itself is the last lit instant; exhaustion follows.
                if remaining.is_zero() {
                    self.strength = 0.0;
                    return;
                }

                self.strength = self.low_strength(remaining);
                if rng.gen_bool(self.flicker_probability()) {
                    self.switch_off(remaining, OffCause::Flicker, out);
                }
            }
            LightState::Off { remaining, cause } => {
                if remaining.is_zero() {
                    self.strength = 0.0;
                    self.advance_countdown(now, out);
                    return;
                }

                if remaining >= self.config.low_threshold {
                    self.strength = 1.0;
                    if cause != OffCause::Player {
                        self.switch_on(now, remaining, OnCause::Recharged, out);
                    }
                    return;
                }

                self.strength = self.low_strength(remaining);
                if cause == OffCause::Player {
                    return;
                }

                let recover_at = match self.recover_at {
                    Some(recover_at) => recover_at,
                    None => {
                        let delay = self.recovery_delay(rng);
                        let recover_at = now.saturating_add(delay);
                        self.recover_at = Some(recover_at);
                        recover_at
                    }
                };
                if now >= recover_at {
                    self.switch_on(now, remaining, OnCause::Recovered, out);
                }
            }
        }
    }

    /// Flips the switch as the player.
    pub fn toggle(&mut self, now: Timestamp, out: &mut Vec<Event>) {
        match self.state {
            LightState::GameOver => {}
            LightState::On { deadline } => {
                let remaining = deadline.saturating_since(now);
                if remaining.is_zero() && self.exhausted_at.is_none() {
                    self.exhausted_at = Some(deadline);
                }
                self.switch_off(remaining, OffCause::Player, out);
            }
            LightState::Off { remaining, .. } => {
                if remaining.is_zero() {
                    out.push(Event::LightToggleRejected);
                } else {
                    self.switch_on(now, remaining, OnCause::Player, out);
                }
            }
        }
    }

    /// Adds the charge of a collected battery.
    ///
    /// Returns `false` once the run is over and the pickup has no effect.
    pub fn collect_battery(&mut self, now: Timestamp) -> bool {
        match self.state {
            LightState::GameOver => return false,
            LightState::On { deadline } => {
                let deadline = if now >= deadline {
                    now.saturating_add(self.config.depleted_baseline)
                } else {
                    deadline.saturating_add(self.config.refill)
                };
                self.state = LightState::On { deadline };
            }
            LightState::Off { remaining, cause } => {
                let remaining = if remaining.is_zero() {
                    self.config.depleted_baseline
                } else {
                    remaining.saturating_add(self.config.refill)
                };
                self.state = LightState::Off { remaining, cause };
            }
        }

        self.exhausted_at = None;
        self.countdown = whole_seconds(self.config.grace_period);
        true
    }

    fn switch_off(&mut self, remaining: Duration, cause: OffCause, out: &mut Vec<Event>) {
        self.state = LightState::Off { remaining, cause };
        self.recover_at = None;
        out.push(Event::LightSwitchedOff { cause });
    }

    fn switch_on(
        &mut self,
        now: Timestamp,
        remaining: Duration,
        cause: OnCause,
        out: &mut Vec<Event>,
    ) {
        self.state = LightState::On {
            deadline: now.saturating_add(remaining),
        };
        self.recover_at = None;
        self.exhausted_at = None;
        self.countdown = whole_seconds(self.config.grace_period);
        out.push(Event::LightSwitchedOn { cause });
    }

    fn advance_countdown(&mut self, now: Timestamp, out: &mut Vec<Event>) {
        let Some(exhausted_at) = self.exhausted_at else {
            return;
        };

        let expires_at = exhausted_at.saturating_add(self.config.grace_period);
        if now > expires_at {
            self.state = LightState::GameOver;
            self.strength = 0.0;
            self.countdown = 0;
            out.push(Event::GameOver);
            return;
        }

        let left = expires_at.saturating_since(now);
        let seconds = u32::try_from(left.as_millis().div_ceil(1_000)).unwrap_or(u32::MAX);
        if seconds != self.countdown {
            self.countdown = seconds;
            out.push(Event::CountdownChanged { seconds });
        }
    }

    fn low_strength(&self, remaining: Duration) -> f32 {
        let threshold = self.config.low_threshold.as_secs_f32();
        if threshold <= 0.0 {
            return 1.0;
        }
        (remaining.as_secs_f32() / threshold).clamp(0.0, 1.0)
    }

    fn flicker_probability(&self) -> f64 {
        let probability = self.config.flicker_probability;
        if probability.is_finite() {
            probability.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    fn recovery_delay<R>(&self, rng: &mut R) -> Duration
    where
        R: Rng + ?Sized,
    {
        let min = self.config.recovery_delay_min;
        let max = self.config.recovery_delay_max.max(min);
        rng.gen_range(min..=max)
    }
}

fn whole_seconds(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis().div_ceil(1_000)).unwrap_or(u32::MAX)
}
