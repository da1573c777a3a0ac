use std::time::Duration;

use deep_woods_core::{Event, OffCause, OnCause, Timestamp};
use deep_woods_system_power::{Config, Flashlight, LightState};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn calm() -> Config {
    Config {
        flicker_probability: 0.0,
        ..Config::default()
    }
}

fn at(millis: u64) -> Timestamp {
    Timestamp::from_millis(millis)
}

#[test]
fn battery_runs_dry_after_its_charge() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut flashlight = Flashlight::new(calm(), at(0));
    let mut events = Vec::new();

    flashlight.tick(at(70_000), &mut rng, &mut events);
    assert!(flashlight.is_on());

    flashlight.tick(at(71_000), &mut rng, &mut events);
    assert!(!flashlight.is_on());
    assert_eq!(flashlight.battery_remaining(at(71_000)), Duration::ZERO);
    assert_eq!(flashlight.exhausted_at(), Some(at(70_000)));
    assert!(events.contains(&Event::LightSwitchedOff {
        cause: OffCause::Exhausted
    }));
}

#[test]
fn grace_window_ends_the_run() {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let mut flashlight = Flashlight::new(calm(), at(0));
    let mut events = Vec::new();

    flashlight.tick(at(70_001), &mut rng, &mut events);
    flashlight.tick(at(79_999), &mut rng, &mut events);
    assert!(!flashlight.is_game_over());
    assert_eq!(flashlight.countdown_seconds(), 1);

    flashlight.tick(at(80_001), &mut rng, &mut events);
    assert!(flashlight.is_game_over());
    assert_eq!(events.last(), Some(&Event::GameOver));

    events.clear();
    flashlight.tick(at(90_000), &mut rng, &mut events);
    assert!(events.is_empty());
}

#[test]
fn countdown_reports_each_whole_second_once() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut flashlight = Flashlight::new(calm(), at(0));
    let mut events = Vec::new();

    for millis in (70_016..76_000).step_by(16) {
        flashlight.tick(at(millis), &mut rng, &mut events);
    }

    let seconds: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            Event::CountdownChanged { seconds } => Some(*seconds),
            _ => None,
        })
        .collect();
    assert_eq!(seconds, vec![9, 8, 7, 6, 5]);
}

#[test]
fn toggle_snapshots_the_remaining_charge() {
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let mut flashlight = Flashlight::new(calm(), at(0));
    let mut events = Vec::new();

    flashlight.toggle(at(20_000), &mut events);
    assert_eq!(
        flashlight.state(),
        LightState::Off {
            remaining: Duration::from_secs(50),
            cause: OffCause::Player
        }
    );

    flashlight.tick(at(500_000), &mut rng, &mut events);
    assert_eq!(flashlight.battery_remaining(at(500_000)), Duration::from_secs(50));

    flashlight.toggle(at(600_000), &mut events);
    assert_eq!(
        flashlight.state(),
        LightState::On {
            deadline: at(650_000)
        }
    );
    assert_eq!(
        events,
        vec![
            Event::LightSwitchedOff {
                cause: OffCause::Player
            },
            Event::LightSwitchedOn {
                cause: OnCause::Player
            },
        ]
    );
}

#[test]
fn dead_flashlight_rejects_the_switch() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut flashlight = Flashlight::new(calm(), at(0));
    let mut events = Vec::new();

    flashlight.tick(at(71_000), &mut rng, &mut events);
    events.clear();
    flashlight.toggle(at(71_016), &mut events);

    assert!(!flashlight.is_on());
    assert_eq!(events, vec![Event::LightToggleRejected]);
}

#[test]
fn pickup_extends_a_burning_light() {
    let mut flashlight = Flashlight::new(calm(), at(0));
    assert!(flashlight.collect_battery(at(10_000)));
    assert_eq!(
        flashlight.state(),
        LightState::On {
            deadline: at(100_000)
        }
    );
}

#[test]
fn pickup_revives_a_dead_battery_to_the_baseline() {
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    let mut flashlight = Flashlight::new(calm(), at(0));
    let mut events = Vec::new();

    flashlight.tick(at(75_000), &mut rng, &mut events);
    assert!(flashlight.collect_battery(at(75_500)));
    assert_eq!(flashlight.exhausted_at(), None);
    assert_eq!(flashlight.countdown_seconds(), 10);
    assert_eq!(
        flashlight.battery_remaining(at(75_500)),
        Duration::from_secs(30)
    );

    events.clear();
    flashlight.tick(at(75_516), &mut rng, &mut events);
    assert!(flashlight.is_on());
    assert_eq!(
        events,
        vec![Event::LightSwitchedOn {
            cause: OnCause::Recharged
        }]
    );
}

#[test]
fn pickup_after_game_over_is_ignored() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut flashlight = Flashlight::new(calm(), at(0));
    let mut events = Vec::new();

    flashlight.tick(at(71_000), &mut rng, &mut events);
    flashlight.tick(at(90_000), &mut rng, &mut events);
    assert!(!flashlight.collect_battery(at(90_016)));
    assert!(flashlight.is_game_over());
}

#[test]
fn low_battery_dims_the_beam() {
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let mut flashlight = Flashlight::new(calm(), at(0));
    let mut events = Vec::new();

    flashlight.tick(at(10_000), &mut rng, &mut events);
    assert_eq!(flashlight.strength(), 1.0);

    flashlight.tick(at(62_500), &mut rng, &mut events);
    assert!((flashlight.strength() - 0.5).abs() < 1e-4);
    assert!((flashlight.headlight().range - 4.0).abs() < 1e-3);
    assert!(events.is_empty());
}

#[test]
fn certain_flicker_cuts_the_light_and_it_recovers() {
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let config = Config {
        flicker_probability: 1.0,
        ..Config::default()
    };
    let mut flashlight = Flashlight::new(config, at(0));
    let mut events = Vec::new();

    flashlight.tick(at(60_000), &mut rng, &mut events);
    assert_eq!(
        events,
        vec![Event::LightSwitchedOff {
            cause: OffCause::Flicker
        }]
    );
    let stored = flashlight.battery_remaining(at(60_000));
    assert_eq!(stored, Duration::from_secs(10));

    events.clear();
    flashlight.tick(at(60_016), &mut rng, &mut events);
    assert!(!flashlight.is_on());
    flashlight.tick(at(61_000), &mut rng, &mut events);
    assert!(flashlight.is_on());
    assert_eq!(
        events,
        vec![Event::LightSwitchedOn {
            cause: OnCause::Recovered
        }]
    );
    assert_eq!(flashlight.battery_remaining(at(61_000)), stored);
}

#[test]
fn invalid_flicker_probability_never_flickers() {
    let mut rng = ChaCha8Rng::seed_from_u64(10);
    let config = Config {
        flicker_probability: f64::NAN,
        ..Config::default()
    };
    let mut flashlight = Flashlight::new(config, at(0));
    let mut events = Vec::new();

    for millis in (56_000..69_000).step_by(16) {
        flashlight.tick(at(millis), &mut rng, &mut events);
    }
    assert!(flashlight.is_on());
    assert!(events.is_empty());
}

#[test]
fn player_switch_off_is_never_overridden() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut flashlight = Flashlight::new(calm(), at(0));
    let mut events = Vec::new();

    flashlight.toggle(at(60_000), &mut events);
    for millis in (60_016..70_000).step_by(16) {
        flashlight.tick(at(millis), &mut rng, &mut events);
    }
    assert!(!flashlight.is_on());

    assert!(flashlight.collect_battery(at(70_000)));
    flashlight.tick(at(70_016), &mut rng, &mut events);
    assert!(!flashlight.is_on());
    assert_eq!(
        flashlight.battery_remaining(at(70_016)),
        Duration::from_secs(40)
    );
}

#[test]
fn flicker_at_the_deadline_still_leads_to_game_over() {
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    let mut flashlight = Flashlight::new(
        Config {
            flicker_probability: 1.0,
            ..Config::default()
        },
        at(0),
    );
    let mut events = Vec::new();

    flashlight.tick(at(70_000), &mut rng, &mut events);
    assert!(flashlight.is_on());
    assert_eq!(flashlight.strength(), 0.0);
    assert!(events.is_empty());

    flashlight.tick(at(70_016), &mut rng, &mut events);
    assert_eq!(flashlight.exhausted_at(), Some(at(70_000)));
    assert!(events.contains(&Event::LightSwitchedOff {
        cause: OffCause::Exhausted
    }));

    flashlight.tick(at(80_001), &mut rng, &mut events);
    assert!(flashlight.is_game_over());
    assert_eq!(events.last(), Some(&Event::GameOver));
}
