//! Shared test infrastructure for neoclock-alarm integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use core::convert::Infallible;
use embassy_time::{Duration, Instant};
use embedded_hal::digital::{ErrorType, InputPin};
use neoclock_alarm::color::ColorId;
use neoclock_alarm::drivers::{Amplifier, AudioCodec, Display, Lamp, Screen, ScreenId, Storage};
use neoclock_alarm::{
    Alarm, AudioOutput, ClockSettings, Clock, Collaborators, DateTime, NightLampSettings, Power, PowerAware,
    PowerControl, PowerHal, PowerMode, ProfileSlots, SdCard,
};
use smart_leds::RGB8;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Monday 2024-06-03 06:59:30 UTC
pub const MONDAY_0659_30: u32 = 1_717_397_970;

// ============================================================================
// Mock Time Source
// ============================================================================

/// Clock driven by the test: a millisecond counter on top of a fixed epoch
pub struct MockClock {
    base_epoch: u32,
    millis: Cell<u64>,
}

impl MockClock {
    pub fn at(epoch: u32) -> Self {
        Self {
            base_epoch: epoch,
            millis: Cell::new(0),
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.millis.set(self.millis.get() + duration.as_millis());
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        Instant::from_millis(self.millis.get())
    }

    fn epoch(&self) -> u32 {
        self.base_epoch + u32::try_from(self.millis.get() / 1000).unwrap()
    }

    fn local_time(&self) -> DateTime {
        DateTime::from_unix(self.epoch())
    }
}

// ============================================================================
// Mock Pins
// ============================================================================

/// Input pin whose level is shared with the test
#[derive(Clone)]
pub struct MockPin(Rc<Cell<bool>>);

impl MockPin {
    pub fn new(high: bool) -> Self {
        Self(Rc::new(Cell::new(high)))
    }

    pub fn set_high(&self) {
        self.0.set(true);
    }

    pub fn set_low(&self) {
        self.0.set(false);
    }

    pub fn level(&self) -> bool {
        self.0.get()
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.get())
    }
}

// ============================================================================
// Mock Audio
// ============================================================================

/// Codec that records what it receives
#[derive(Default)]
pub struct MockCodec {
    pub powered: bool,
    pub begins: u32,
    pub ends: u32,
    pub attenuation: Option<(u8, u8)>,
    pub volume_writes: u32,
    pub blocks: Vec<Vec<u8>>,
    pub resets: u32,
    pub cancels: u32,
    pub busy: bool,
}

impl MockCodec {
    pub fn bytes_played(&self) -> usize {
        self.blocks.iter().map(Vec::len).sum()
    }
}

impl AudioCodec for MockCodec {
    fn begin(&mut self) {
        self.powered = true;
        self.begins += 1;
    }

    fn end(&mut self) {
        self.powered = false;
        self.ends += 1;
    }

    fn ready_for_data(&mut self) -> bool {
        !self.busy
    }

    fn play_data(&mut self, data: &[u8]) {
        self.blocks.push(data.to_vec());
    }

    fn set_volume(&mut self, left: u8, right: u8) {
        self.attenuation = Some((left, right));
        self.volume_writes += 1;
    }

    fn reset_playback(&mut self) {
        self.resets += 1;
    }

    fn cancel_playback(&mut self) {
        self.cancels += 1;
    }
}

/// Amplifier that records its state
#[derive(Default)]
pub struct MockAmp {
    pub powered: bool,
    pub outputs_enabled: bool,
    pub fixed_gain: Option<i8>,
    pub max_gain: Option<u8>,
}

impl Amplifier for MockAmp {
    fn begin(&mut self) {
        self.powered = true;
    }

    fn end(&mut self) {
        self.powered = false;
        self.outputs_enabled = false;
    }

    fn enable_outputs(&mut self) {
        self.outputs_enabled = true;
    }

    fn disable_outputs(&mut self) {
        self.outputs_enabled = false;
    }

    fn set_fixed_gain(&mut self, db: i8) {
        self.fixed_gain = Some(db);
    }

    fn set_max_gain(&mut self, db: u8) {
        self.max_gain = Some(db);
    }
}

// ============================================================================
// Mock Storage
// ============================================================================

/// Directory entry of the mock card
#[derive(Clone)]
pub struct MockEntry {
    pub name: &'static str,
    pub data: Vec<u8>,
    pub is_dir: bool,
}

impl MockEntry {
    pub fn file(name: &'static str, data: Vec<u8>) -> Self {
        Self { name, data, is_dir: false }
    }

    pub fn dir(name: &'static str) -> Self {
        Self {
            name,
            data: Vec::new(),
            is_dir: true,
        }
    }
}

/// Flat FAT root directory held in memory
pub struct MockStorage {
    entries: Vec<MockEntry>,
    mounted: bool,
    next_entry: usize,
    open: Option<usize>,
    position: usize,
}

impl MockStorage {
    pub fn new(entries: Vec<MockEntry>) -> Self {
        Self {
            entries,
            mounted: false,
            next_entry: 0,
            open: None,
            position: 0,
        }
    }
}

impl Storage for MockStorage {
    fn begin(&mut self) -> bool {
        self.mounted = true;
        true
    }

    fn open(&mut self, name: &str) -> bool {
        self.open = self.entries.iter().position(|e| e.name.eq_ignore_ascii_case(name));
        self.position = 0;
        self.open.is_some()
    }

    fn open_next(&mut self) -> bool {
        if self.next_entry < self.entries.len() {
            self.open = Some(self.next_entry);
            self.next_entry += 1;
            self.position = 0;
            true
        } else {
            self.open = None;
            false
        }
    }

    fn file_name(&self) -> Option<heapless::String<12>> {
        self.open
            .and_then(|i| heapless::String::try_from(self.entries[i].name).ok())
    }

    fn is_file(&self) -> bool {
        self.open.is_some_and(|i| !self.entries[i].is_dir)
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let Some(i) = self.open else { return 0 };
        let data = &self.entries[i].data;
        let n = buf.len().min(data.len() - self.position);
        buf[..n].copy_from_slice(&data[self.position..self.position + n]);
        self.position += n;
        n
    }

    fn rewind(&mut self) {
        self.position = 0;
    }

    fn close(&mut self) {
        self.open = None;
    }

    fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn rewind_dir(&mut self) {
        self.next_entry = 0;
    }

    fn is_root_open(&self) -> bool {
        self.mounted
    }

    fn exists(&mut self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name.eq_ignore_ascii_case(name))
    }
}

// ============================================================================
// Mock Display, Lamp and Screen
// ============================================================================

/// Clock display recording the last commands
#[derive(Default)]
pub struct MockDisplay {
    pub color: Option<ColorId>,
    pub rgb: Option<RGB8>,
    pub brightness: Option<u8>,
    pub brightness_history: Vec<u8>,
    pub updates: u32,
    pub clock_updates: Vec<bool>,
}

impl Display for MockDisplay {
    fn set_color_from_table(&mut self, color: ColorId) {
        self.color = Some(color);
        self.rgb = None;
    }

    fn set_color_rgb(&mut self, color: RGB8) {
        self.rgb = Some(color);
    }

    fn set_brightness(&mut self, brightness: u8) {
        self.brightness = Some(brightness);
        self.brightness_history.push(brightness);
    }

    fn update(&mut self) {
        self.updates += 1;
    }

    fn request_clock_update(&mut self, full: bool) {
        self.clock_updates.push(full);
    }
}

/// Night lamp recording activations
#[derive(Default)]
pub struct MockLamp {
    pub active: bool,
    pub activations: u32,
    pub deactivations: u32,
    pub settings: Option<NightLampSettings>,
}

impl Lamp for MockLamp {
    fn activate(&mut self, settings: &NightLampSettings, _test_mode: bool) {
        self.active = true;
        self.activations += 1;
        self.settings = Some(*settings);
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.deactivations += 1;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Screen manager recording requests
#[derive(Default)]
pub struct MockScreen {
    pub current: Option<ScreenId>,
    pub activations: Vec<ScreenId>,
    pub exits: u32,
    pub updates: Vec<bool>,
    pub timeout: Option<u32>,
    pub timeout_resets: u32,
}

impl Screen for MockScreen {
    fn activate(&mut self, screen: ScreenId) {
        self.current = Some(screen);
        self.activations.push(screen);
    }

    fn exit_screen(&mut self) {
        self.current = None;
        self.exits += 1;
    }

    fn request_update(&mut self, clear: bool) {
        self.updates.push(clear);
    }

    fn set_timeout(&mut self, timeout_ms: u32) {
        self.timeout = Some(timeout_ms);
    }

    fn reset_timeout(&mut self) {
        self.timeout_resets += 1;
    }
}

// ============================================================================
// Mock Power
// ============================================================================

/// Board power functions, on-battery pin shared with the test
pub struct MockPowerHal {
    pub on_battery: MockPin,
    pub sleeps: Rc<Cell<u32>>,
    pub watchdog_running: Rc<Cell<bool>>,
    pub watchdog_feeds: Rc<Cell<u32>>,
}

impl PowerHal for MockPowerHal {
    fn is_on_battery(&mut self) -> bool {
        self.on_battery.level()
    }

    fn enter_sleep(&mut self) {
        assert!(!self.watchdog_running.get(), "watchdog must be off while sleeping");
        self.sleeps.set(self.sleeps.get() + 1);
    }

    fn watchdog_start(&mut self) {
        self.watchdog_running.set(true);
    }

    fn watchdog_stop(&mut self) {
        self.watchdog_running.set(false);
    }

    fn watchdog_feed(&mut self) {
        self.watchdog_feeds.set(self.watchdog_feeds.get() + 1);
    }
}

/// Subscriber that records every notification
#[derive(Default)]
pub struct RecordingSubscriber {
    pub modes: Vec<PowerMode>,
}

impl PowerAware for RecordingSubscriber {
    fn on_power_state_change(&mut self, mode: PowerMode) {
        self.modes.push(mode);
    }
}

// ============================================================================
// Test Rig
// ============================================================================

pub type TestAudio = AudioOutput<MockCodec, MockAmp>;
pub type TestPower<'a> = Power<'a, MockPowerHal>;
pub type TestAlarm<'a> = Alarm<'a, MockCodec, MockAmp, MockStorage, MockPin, MockPin>;

/// Everything the alarm engine and the power state machine talk to
pub struct Rig {
    pub clock: MockClock,
    pub screen: RefCell<MockScreen>,
    pub display: RefCell<MockDisplay>,
    pub lamp: RefCell<MockLamp>,
    pub store: RefCell<ProfileSlots>,
    pub audio: RefCell<TestAudio>,
    pub on_battery: MockPin,
    /// Card-detect, low while a card is inserted
    pub card_detect: MockPin,
    /// Alarm switch, high while on
    pub alarm_switch: MockPin,
    pub sleeps: Rc<Cell<u32>>,
    pub watchdog_running: Rc<Cell<bool>>,
    pub watchdog_feeds: Rc<Cell<u32>>,
    pub card: Vec<MockEntry>,
}

impl Rig {
    /// Monday 06:59:30, on mains, alarm switch on, no SD card
    pub fn new() -> Self {
        Self::with_card(Vec::new())
    }

    pub fn with_card(card: Vec<MockEntry>) -> Self {
        Self {
            clock: MockClock::at(MONDAY_0659_30),
            screen: RefCell::new(MockScreen::default()),
            display: RefCell::new(MockDisplay::default()),
            lamp: RefCell::new(MockLamp::default()),
            store: RefCell::new(ProfileSlots::default()),
            audio: RefCell::new(AudioOutput::new(MockCodec::default(), MockAmp::default())),
            on_battery: MockPin::new(false),
            card_detect: MockPin::new(true),
            alarm_switch: MockPin::new(true),
            sleeps: Rc::new(Cell::new(0)),
            watchdog_running: Rc::new(Cell::new(false)),
            watchdog_feeds: Rc::new(Cell::new(0)),
            card,
        }
    }

    /// Power state machine with the audio stack subscribed
    pub fn power(&self) -> TestPower<'_> {
        let hal = MockPowerHal {
            on_battery: self.on_battery.clone(),
            sleeps: self.sleeps.clone(),
            watchdog_running: self.watchdog_running.clone(),
            watchdog_feeds: self.watchdog_feeds.clone(),
        };
        let mut power = Power::new(hal, &self.clock, &self.screen);
        power.subscribe(&self.audio).unwrap();
        power
    }

    /// Alarm engine wired to this rig
    pub fn alarm<'a>(&'a self, power: &'a RefCell<dyn PowerControl + 'a>) -> TestAlarm<'a> {
        let io = Collaborators {
            power,
            display: &self.display,
            lamp: &self.lamp,
            screen: &self.screen,
            clock: &self.clock,
            store: &self.store,
        };
        let settings = ClockSettings {
            alarm_on: [false, false],
            clock_color: ColorId::Green,
            clock_brightness: 40,
            ..ClockSettings::default()
        };
        let sd = SdCard::new(MockStorage::new(self.card.clone()), self.card_detect.clone());
        Alarm::new(&self.audio, sd, self.alarm_switch.clone(), io, settings)
    }

    pub fn insert_card(&self) {
        self.card_detect.set_low();
    }

    pub fn remove_card(&self) {
        self.card_detect.set_high();
    }

    pub fn codec_blocks(&self) -> usize {
        self.audio.borrow().codec().blocks.len()
    }
}

/// Local time helper for schedule assertions
pub fn monday(hour: u8, minute: u8) -> DateTime {
    DateTime {
        hour,
        minute,
        second: 0,
        ..DateTime::from_unix(MONDAY_0659_30)
    }
}
