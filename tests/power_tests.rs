//! Integration tests for the power mode state machine

mod common;

use common::{RecordingSubscriber, Rig};
use neoclock_alarm::drivers::ScreenId;
use neoclock_alarm::{Error, PowerMode};
use std::cell::RefCell;

#[test]
fn stays_normal_on_mains() {
    let rig = Rig::new();
    let subscriber = RefCell::new(RecordingSubscriber::default());
    let mut power = rig.power();
    power.subscribe(&subscriber).unwrap();

    for _ in 0..5 {
        assert_eq!(power.detect_power_state(), PowerMode::Normal);
        rig.clock.advance_secs(60);
    }
    assert!(subscriber.borrow().modes.is_empty());
    assert!(rig.screen.borrow().updates.is_empty());
}

#[test]
fn battery_enters_low_power_and_notifies_each_subscriber_once() {
    let rig = Rig::new();
    let first = RefCell::new(RecordingSubscriber::default());
    let second = RefCell::new(RecordingSubscriber::default());
    let mut power = rig.power();
    power.subscribe(&first).unwrap();
    power.subscribe(&second).unwrap();

    rig.on_battery.set_high();
    assert_eq!(power.detect_power_state(), PowerMode::LowPower);
    // polling again inside the grace window changes nothing
    assert_eq!(power.detect_power_state(), PowerMode::LowPower);

    assert_eq!(first.borrow().modes, vec![PowerMode::LowPower]);
    assert_eq!(second.borrow().modes, vec![PowerMode::LowPower]);
    // plain repaint, no clear outside suspend
    assert_eq!(rig.screen.borrow().updates, vec![false]);
}

#[test]
fn low_power_suspends_after_grace_delay() {
    let rig = Rig::new();
    let subscriber = RefCell::new(RecordingSubscriber::default());
    let mut power = rig.power();
    power.subscribe(&subscriber).unwrap();

    rig.on_battery.set_high();
    power.detect_power_state();

    rig.clock.advance_ms(29_999);
    assert_eq!(power.detect_power_state(), PowerMode::LowPower);

    rig.clock.advance_ms(1);
    assert_eq!(power.detect_power_state(), PowerMode::Suspend);

    assert_eq!(subscriber.borrow().modes, vec![PowerMode::LowPower, PowerMode::Suspend]);
    let screen = rig.screen.borrow();
    assert_eq!(screen.current, Some(ScreenId::Suspend));
    assert_eq!(screen.updates.last(), Some(&true));
}

#[test]
fn reset_suspend_delay_defers_suspend() {
    let rig = Rig::new();
    let mut power = rig.power();

    rig.on_battery.set_high();
    power.detect_power_state();

    rig.clock.advance_secs(20);
    power.reset_suspend_delay();
    rig.clock.advance_secs(20);
    assert_eq!(power.detect_power_state(), PowerMode::LowPower);

    rig.clock.advance_secs(10);
    assert_eq!(power.detect_power_state(), PowerMode::Suspend);
}

#[test]
fn suspend_sleeps_instead_of_transitioning() {
    let rig = Rig::new();
    let subscriber = RefCell::new(RecordingSubscriber::default());
    let mut power = rig.power();
    power.subscribe(&subscriber).unwrap();
    power.enable_watchdog();

    rig.on_battery.set_high();
    power.detect_power_state();
    rig.clock.advance_secs(30);
    power.detect_power_state();

    assert_eq!(power.detect_power_state(), PowerMode::Suspend);
    assert_eq!(power.detect_power_state(), PowerMode::Suspend);

    assert_eq!(rig.sleeps.get(), 2);
    // re-armed after each wakeup
    assert!(rig.watchdog_running.get());
    assert_eq!(subscriber.borrow().modes.len(), 2);
}

#[test]
fn mains_returns_to_normal_from_any_mode() {
    let rig = Rig::new();
    let subscriber = RefCell::new(RecordingSubscriber::default());
    let mut power = rig.power();
    power.subscribe(&subscriber).unwrap();

    rig.on_battery.set_high();
    power.detect_power_state();
    rig.clock.advance_secs(30);
    power.detect_power_state();
    assert_eq!(power.power_mode(), PowerMode::Suspend);

    rig.on_battery.set_low();
    assert_eq!(power.detect_power_state(), PowerMode::Normal);

    assert_eq!(
        subscriber.borrow().modes,
        vec![PowerMode::LowPower, PowerMode::Suspend, PowerMode::Normal]
    );
    let screen = rig.screen.borrow();
    assert_eq!(screen.exits, 1);
    // leaving suspend clears the minimal layout
    assert_eq!(screen.updates.last(), Some(&true));
}

#[test]
fn requests_on_mains_are_clamped_to_normal() {
    let rig = Rig::new();
    let subscriber = RefCell::new(RecordingSubscriber::default());
    let mut power = rig.power();
    power.subscribe(&subscriber).unwrap();

    assert_eq!(power.set_power_mode(PowerMode::Suspend), PowerMode::Normal);
    assert_eq!(power.set_power_mode(PowerMode::LowPower), PowerMode::Normal);
    assert!(subscriber.borrow().modes.is_empty());
    assert!(rig.screen.borrow().activations.is_empty());
}

#[test]
fn set_power_mode_is_idempotent() {
    let rig = Rig::new();
    let subscriber = RefCell::new(RecordingSubscriber::default());
    let mut power = rig.power();
    power.subscribe(&subscriber).unwrap();

    rig.on_battery.set_high();
    power.set_power_mode(PowerMode::Suspend);
    power.set_power_mode(PowerMode::Suspend);
    assert_eq!(subscriber.borrow().modes, vec![PowerMode::Suspend]);
}

#[test]
fn audio_stack_follows_power_mode() {
    let rig = Rig::new();
    rig.audio.borrow_mut().begin(PowerMode::Normal);
    let mut power = rig.power();

    {
        let audio = rig.audio.borrow();
        assert!(audio.codec().powered);
        assert!(audio.amplifier().powered);
        assert_eq!(audio.amplifier().fixed_gain, Some(-3));
        assert_eq!(audio.amplifier().max_gain, Some(30));
    }

    rig.on_battery.set_high();
    power.set_power_mode(PowerMode::Suspend);
    {
        let audio = rig.audio.borrow();
        assert!(!audio.codec().powered);
        assert!(!audio.amplifier().powered);
    }

    rig.on_battery.set_low();
    power.detect_power_state();
    assert!(rig.audio.borrow().codec().powered);
}

#[test]
fn begin_settles_on_supply_state() {
    let rig = Rig::new();
    let mut power = rig.power();
    rig.on_battery.set_high();
    assert_eq!(power.begin(), PowerMode::LowPower);
    assert!(power.is_on_battery_power());
}

#[test]
fn watchdog_fed_only_when_enabled() {
    let rig = Rig::new();
    let mut power = rig.power();

    power.feed_watchdog();
    assert_eq!(rig.watchdog_feeds.get(), 0);

    power.enable_watchdog();
    power.feed_watchdog();
    power.feed_watchdog();
    assert_eq!(rig.watchdog_feeds.get(), 2);

    power.disable_watchdog();
    power.feed_watchdog();
    assert_eq!(rig.watchdog_feeds.get(), 2);
    assert!(!rig.watchdog_running.get());
}

#[test]
fn subscriber_list_is_bounded() {
    let rig = Rig::new();
    let subscribers: Vec<RefCell<RecordingSubscriber>> =
        (0..8).map(|_| RefCell::new(RecordingSubscriber::default())).collect();
    let mut power = rig.power();

    // the audio stack already holds one slot
    for s in &subscribers[..7] {
        power.subscribe(s).unwrap();
    }
    assert_eq!(power.subscribe(&subscribers[7]), Err(Error::SubscriberListFull));
}
