use std::time::Duration;

use pixel_sync::cooldown::{MAX_WAIT, TICK_INTERVAL};

use super::*;

fn gate(seconds: u64) -> (CooldownGate<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    (CooldownGate::new(Duration::from_secs(seconds), clock.clone()), clock)
}

#[test]
fn test_consume_once_until_expiry() {
    let (mut gate, clock) = gate(30);
    assert!(gate.is_idle());
    assert!(gate.try_consume());
    assert!(!gate.try_consume());

    clock.advance(Duration::from_secs(29));
    assert!(!gate.try_consume());

    clock.advance(Duration::from_secs(1));
    assert!(gate.try_consume());
    assert!(matches!(gate.state(), CooldownState::Waiting { .. }));
}

#[test]
fn test_expiry_is_start_plus_cooldown() {
    let (mut gate, clock) = gate(30);
    let start = clock.now();
    assert!(gate.try_consume());
    assert_eq!(gate.state(), CooldownState::Waiting { expiry: start + Duration::from_secs(30) });
    assert_eq!(gate.remaining(), Some(Duration::from_secs(30)));
}

#[test]
fn test_force_waiting_overrides() {
    let (mut gate, clock) = gate(30);
    assert!(gate.try_consume());

    // shorter server cooldown replaces the running one
    gate.force_waiting(5);
    clock.advance(Duration::from_secs(5));
    assert!(gate.is_idle());

    // and works from idle as well
    gate.force_waiting(10);
    assert!(!gate.try_consume());
    assert_eq!(gate.remaining(), Some(Duration::from_secs(10)));
}

#[test]
fn test_force_waiting_zero_is_eligible() {
    let (mut gate, _clock) = gate(30);
    gate.force_waiting(0);
    assert!(gate.try_consume());
}

#[test]
fn test_tick_counts_down() {
    let (mut gate, clock) = gate(2);
    assert_eq!(gate.tick(), CountdownTick::Inactive);

    assert!(gate.try_consume());
    assert_eq!(gate.tick(), CountdownTick::Counting { seconds_left: 2, spinner: '/' });

    clock.advance(Duration::from_millis(100));
    assert_eq!(gate.tick(), CountdownTick::Counting { seconds_left: 2, spinner: '-' });

    clock.advance(Duration::from_millis(1000));
    assert_eq!(gate.tick(), CountdownTick::Counting { seconds_left: 1, spinner: '\\' });

    clock.advance(Duration::from_millis(900));
    assert_eq!(gate.tick(), CountdownTick::Expired);
    assert_eq!(gate.tick(), CountdownTick::Inactive);
    assert!(gate.is_idle());
}

#[test]
fn test_spinner_wraps_and_restarts() {
    let (mut gate, clock) = gate(60);
    assert!(gate.try_consume());
    let spinners: Vec<char> = (0..6)
        .map(|_| {
            clock.advance(TICK_INTERVAL);
            match gate.tick() {
                CountdownTick::Counting { spinner, .. } => spinner,
                other => panic!("Expected Counting, got {other:?}"),
            }
        })
        .collect();
    assert_eq!(spinners, vec!['/', '-', '\\', '|', '/', '-']);

    gate.force_waiting(10);
    assert_eq!(gate.tick(), CountdownTick::Counting { seconds_left: 10, spinner: '/' });
}

#[test]
fn test_huge_cooldowns_saturate() {
    let (mut gate, clock) = gate(30);
    gate.force_waiting(u64::MAX);
    assert!(!gate.is_idle());
    assert_eq!(gate.remaining(), Some(MAX_WAIT));

    clock.advance(Duration::from_secs(3600));
    assert!(!gate.try_consume());
    assert!(matches!(gate.tick(), CountdownTick::Counting { .. }));

    let clock = ManualClock::new();
    let mut gate = CooldownGate::new(Duration::from_secs(u64::MAX), clock);
    assert!(gate.try_consume());
    assert!(!gate.try_consume());
}
