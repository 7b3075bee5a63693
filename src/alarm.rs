//! # Alarm
//! The alarm playback engine.
//!
//! [`Alarm`] owns the active alarm profile and sequences its sub-effects:
//! sound (from the SD card, or the built-in clip when the card cannot serve
//! it), the visual effect on the clock display, the alarm lamp and the alarm
//! screen. It also decides, once per minute, whether a profile is due.
//!
//! All work happens in [`Alarm::process_events`], called once per scheduler
//! tick. Nothing in here blocks: each step either finishes or returns early
//! and tries again next tick.
//!
//! The state is derived from the [`PlayMode`] flags each tick:
//! - off: nothing to do
//! - switch off and not a preview: stop
//! - snoozing: wait for the snooze window to pass, then resume
//! - delayed start: wait for the delay, then start
//! - playing: ramp the volume, feed the codec, step the visual effect

use crate::audio::{AudioOutput, FallbackCursor};
use crate::config::{
    AUDIO_BLOCK_SIZE, AUDIO_BLOCKS_PER_RUN, ClockSettings, GRADUAL_RAMP_MS, LampMode, MAX_NUM_PROFILES,
    SNOOZE_SCREEN_TIMEOUT,
};
use crate::drivers::{Amplifier, AudioCodec, Display, Lamp, Screen, ScreenId, Storage};
use crate::error::{Error, Result};
use crate::play_mode::PlayMode;
use crate::power::{PowerControl, PowerMode};
use crate::profile::{AlarmProfile, AlarmTime, ProfileStore, VisualMode};
use crate::rtc::{Clock, DateTime};
use crate::schedule;
use crate::scheduler::Task;
use crate::sdcard::{CardEvent, SdCard};
use crate::visual::VisualEffect;
use crate::{debug, info, warn};
use core::cell::RefCell;
use embassy_time::{Duration, Instant};
use embedded_hal::digital::InputPin;

/// Shared modules the alarm engine commands but does not own
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Power state machine
    pub power: &'a RefCell<dyn PowerControl + 'a>,
    /// Clock display
    pub display: &'a RefCell<dyn Display + 'a>,
    /// Night lamp
    pub lamp: &'a RefCell<dyn Lamp + 'a>,
    /// Status screen
    pub screen: &'a RefCell<dyn Screen + 'a>,
    /// Time source
    pub clock: &'a dyn Clock,
    /// Persisted profile slots
    pub store: &'a RefCell<dyn ProfileStore + 'a>,
}

/// The alarm playback engine
pub struct Alarm<'a, C, A, S, CD, SW>
where
    C: AudioCodec,
    A: Amplifier,
    S: Storage,
    CD: InputPin,
    SW: InputPin,
{
    /// Codec and amplifier, also registered with the power state machine
    audio: &'a RefCell<AudioOutput<C, A>>,
    /// SD card holding the alarm sounds
    sd: SdCard<S, CD>,
    /// Alarm on/off slide switch, high when on
    alarm_switch: SW,
    /// Shared modules
    io: Collaborators<'a>,
    /// Active profile
    profile: AlarmProfile,
    /// Clock settings
    settings: ClockSettings,
    /// Running sub-effects
    play_mode: PlayMode,
    /// Start delay of a pending `play_delayed`, zero when none
    play_delay: Duration,
    /// When the pending start delay began
    delay_start: Instant,
    /// When playback (re)started, origin of the volume ramp
    alarm_start: Instant,
    /// RTC epoch when the snooze began
    snooze_start: u32,
    /// Alarm visual effect
    visual: VisualEffect,
    /// Read cursor of the built-in clip
    fallback: FallbackCursor,
    /// Last read alarm switch state
    alarm_switch_on: bool,
    /// Minute of the last alarm check
    last_minute: Option<u8>,
    /// Set by `begin`
    initialized: bool,
}

impl<'a, C, A, S, CD, SW> Alarm<'a, C, A, S, CD, SW>
where
    C: AudioCodec,
    A: Amplifier,
    S: Storage,
    CD: InputPin,
    SW: InputPin,
{
    /// Create an idle engine with a default profile
    pub fn new(
        audio: &'a RefCell<AudioOutput<C, A>>,
        sd: SdCard<S, CD>,
        alarm_switch: SW,
        io: Collaborators<'a>,
        settings: ClockSettings,
    ) -> Self {
        let now = io.clock.now();
        Self {
            audio,
            sd,
            alarm_switch,
            io,
            profile: AlarmProfile::default(),
            settings,
            play_mode: PlayMode::OFF,
            play_delay: Duration::from_millis(0),
            delay_start: now,
            alarm_start: now,
            snooze_start: 0,
            visual: VisualEffect::default(),
            fallback: FallbackCursor::default(),
            alarm_switch_on: false,
            last_minute: None,
            initialized: false,
        }
    }

    /// Power up the audio stack for the current power mode
    pub fn begin(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        let mode = self.io.power.borrow().power_mode();
        self.audio.borrow_mut().begin(mode);
        self.detect_alarm_switch_state();
        info!("alarm engine started");
    }

    /// Stop any alarm and power the audio stack down
    pub fn end(&mut self) {
        if !self.initialized {
            return;
        }
        self.stop();
        self.initialized = false;
        self.audio.borrow_mut().end();
    }

    // ------------------------------------------------------------------
    // Profiles
    // ------------------------------------------------------------------

    /// Active profile
    pub const fn profile(&self) -> &AlarmProfile {
        &self.profile
    }

    /// Active profile, for editing. Must not be changed while an alarm plays.
    pub const fn profile_mut(&mut self) -> &mut AlarmProfile {
        &mut self.profile
    }

    /// Clock settings
    pub const fn settings(&self) -> &ClockSettings {
        &self.settings
    }

    /// Clock settings, for editing
    pub const fn settings_mut(&mut self) -> &mut ClockSettings {
        &mut self.settings
    }

    /// Load a stored profile into the active profile
    pub fn load_profile(&mut self, id: usize) -> Result<()> {
        let Some(profile) = self.io.store.borrow().load(id) else {
            warn!("invalid alarm profile id {}", id);
            return Err(Error::InvalidProfile(id));
        };
        self.profile = profile.sanitized();
        Ok(())
    }

    /// Store the active profile into a slot
    pub fn save_profile(&mut self, id: usize) -> Result<()> {
        if self.io.store.borrow_mut().save(id, &self.profile) {
            Ok(())
        } else {
            warn!("invalid alarm profile id {}", id);
            Err(Error::InvalidProfile(id))
        }
    }

    /// Time and weekday mask of a stored profile
    pub fn read_profile_alarm_time(&self, id: usize) -> Option<(AlarmTime, u8)> {
        if id >= MAX_NUM_PROFILES {
            return None;
        }
        self.io.store.borrow().alarm_time(id)
    }

    // ------------------------------------------------------------------
    // SD card and file selection
    // ------------------------------------------------------------------

    /// Poll the SD card-detect pin.
    ///
    /// Pulling the card during an alarm does not silence it: a preview stops,
    /// a real alarm snoozes and comes back with the built-in clip.
    pub fn detect_sd_card(&mut self) -> Option<CardEvent> {
        let mode = self.io.power.borrow().power_mode();
        let event = self.sd.detect(mode, self.io.clock.now());

        if event == Some(CardEvent::Removed) && !self.play_mode.is_off() {
            if self.play_mode.is_test() {
                self.stop();
            } else {
                warn!("SD card removed during alarm, snoozing");
                self.snooze();
            }
        }
        event
    }

    /// Whether a card is mounted
    pub const fn is_sd_card_present(&self) -> bool {
        self.sd.is_present()
    }

    /// Select the next audio file on the card into the active profile.
    /// On failure the filename is cleared, which selects the built-in clip.
    pub fn open_next_file(&mut self) -> Result<()> {
        if !self.play_mode.is_off() {
            self.stop();
        }

        match self.sd.open_next_file(self.profile.filename.as_str()) {
            Ok(name) => {
                self.profile.filename = name;
                Ok(())
            }
            Err(e) => {
                self.profile.filename.clear();
                Err(e)
            }
        }
    }

    /// Open a named file into the active profile
    pub fn open_file(&mut self, name: &str) -> Result<()> {
        let opened = self.sd.open_file(name)?;
        self.profile.filename = opened;
        Ok(())
    }

    /// Whether a file exists on the card
    pub fn file_exists(&mut self, name: &str) -> bool {
        self.sd.file_exists(name)
    }

    // ------------------------------------------------------------------
    // Playback control
    // ------------------------------------------------------------------

    /// Set the codec volume in percent
    pub fn set_volume(&mut self, volume: u8) {
        self.audio.borrow_mut().set_volume(volume);
    }

    /// Current volume in percent
    pub fn volume(&self) -> u8 {
        self.audio.borrow().volume()
    }

    /// Start playback at once.
    ///
    /// A running alarm is stopped first. Unless `mode` is a preview, nothing
    /// starts while the alarm switch is off.
    pub fn play(&mut self, mode: PlayMode) {
        if !self.play_mode.is_off() {
            self.stop();
        }

        self.detect_alarm_switch_state();
        if !self.alarm_switch_on && !mode.is_test() {
            debug!("alarm switch off, not playing");
            return;
        }

        self.play_mode = mode;
        self.play_delay = Duration::from_millis(0);
        self.snooze_start = 0;
        self.alarm_start = self.io.clock.now();
        info!("alarm started, mode {:?}", mode);

        if mode.contains(PlayMode::SCREEN) {
            self.io.screen.borrow_mut().activate(ScreenId::Alarm);
        }
        if mode.contains(PlayMode::AUDIO) {
            self.audio_start();
        }
        if mode.intersects(PlayMode::VISUAL | PlayMode::LAMP) {
            self.visual_start();
        }
    }

    /// Start playback once `delay` has passed. A zero delay starts at once.
    pub fn play_delayed(&mut self, mode: PlayMode, delay: Duration) {
        if delay.as_ticks() == 0 {
            self.play(mode);
            return;
        }
        if !self.play_mode.is_off() {
            self.stop();
        }

        self.play_mode = mode;
        self.play_delay = delay;
        self.delay_start = self.io.clock.now();
        self.snooze_start = 0;
    }

    /// Stop everything. Safe to call when already stopped.
    pub fn stop(&mut self) {
        if self.play_mode.is_off() {
            return;
        }

        let mode = self.play_mode;
        if mode.contains(PlayMode::AUDIO) {
            self.audio_stop();
        }
        if mode.intersects(PlayMode::VISUAL | PlayMode::LAMP) {
            self.visual_stop();
        }
        if mode.contains(PlayMode::SCREEN) {
            self.io.screen.borrow_mut().exit_screen();
        }

        self.play_mode = PlayMode::OFF;
        self.play_delay = Duration::from_millis(0);
        self.snooze_start = 0;
        info!("alarm stopped");
    }

    /// Pause sound and visuals for the profile's snooze delay.
    /// With snooze disabled (delay 0) this stops the alarm.
    pub fn snooze(&mut self) {
        if self.play_mode.is_off() || self.play_mode.is_snoozing() {
            return;
        }
        if self.profile.snooze_delay == 0 {
            self.stop();
            return;
        }

        self.play_mode |= PlayMode::SNOOZE;
        self.play_delay = Duration::from_millis(0);
        self.snooze_start = self.io.clock.epoch();
        self.audio_stop();
        self.visual_stop();

        let mut screen = self.io.screen.borrow_mut();
        screen.request_update(true);
        screen.reset_timeout();
        screen.set_timeout(u32::try_from(SNOOZE_SCREEN_TIMEOUT.as_millis()).unwrap_or(u32::MAX));
        info!("alarm snoozed for {} min", self.profile.snooze_delay);
    }

    /// Restart sound and visuals after a snooze
    pub fn resume(&mut self) {
        if self.play_mode.is_off() || !self.play_mode.is_snoozing() {
            return;
        }

        self.play_mode = self.play_mode.without(PlayMode::SNOOZE);
        self.snooze_start = 0;
        self.alarm_start = self.io.clock.now();
        info!("alarm resumed");

        self.audio_start();
        self.visual_start();

        if self.play_mode.contains(PlayMode::SCREEN) {
            self.io.screen.borrow_mut().request_update(true);
        }
    }

    /// Whether a snooze is in progress
    pub const fn is_snoozing(&self) -> bool {
        self.play_mode.is_snoozing()
    }

    /// Whether an alarm plays and is not snoozing
    pub const fn is_playing(&self) -> bool {
        !self.play_mode.is_off() && !self.play_mode.is_snoozing()
    }

    /// Running sub-effects
    pub const fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    /// Seconds until a snoozed alarm resumes, 0 when not snoozing
    pub fn snooze_time_remaining(&self) -> u16 {
        if !self.play_mode.is_snoozing() || self.profile.snooze_delay == 0 {
            return 0;
        }
        let total = u32::from(self.profile.snooze_delay) * 60;
        let elapsed = self.io.clock.epoch().saturating_sub(self.snooze_start);
        u16::try_from(total.saturating_sub(elapsed)).unwrap_or(u16::MAX)
    }

    // ------------------------------------------------------------------
    // Alarm switch and scheduling
    // ------------------------------------------------------------------

    /// Last read alarm switch state
    pub const fn is_alarm_switch_on(&self) -> bool {
        self.alarm_switch_on
    }

    /// Read the alarm switch
    pub fn detect_alarm_switch_state(&mut self) -> bool {
        self.alarm_switch_on = self.alarm_switch.is_high().unwrap_or(false);
        self.alarm_switch_on
    }

    /// Alarm switch on and at least one profile slot enabled
    pub fn is_alarm_enabled(&self) -> bool {
        self.alarm_switch_on && self.settings.any_alarm_on()
    }

    /// Start the due profile if one fires at `now`.
    /// Returns whether a real alarm is playing afterwards.
    pub fn check_for_alarms(&mut self, now: &DateTime) -> bool {
        if !self.is_alarm_enabled() {
            return false;
        }
        if !self.play_mode.is_off() && !self.play_mode.is_test() {
            return true;
        }

        let Some(id) = self.next_alarm_id(now, true) else {
            return false;
        };
        if self.next_alarm_offset(id, now, true) != Some(0) {
            return false;
        }
        if self.load_profile(id).is_err() {
            return false;
        }

        info!("alarm profile {} due", id);
        self.play(PlayMode::NORMAL);
        true
    }

    /// Profile slot that fires next. Equal offsets favour slot 0.
    pub fn next_alarm_id(&self, now: &DateTime, match_now: bool) -> Option<usize> {
        if !self.is_alarm_enabled() {
            return None;
        }

        if self.settings.alarm_on[1] {
            if !self.settings.alarm_on[0] {
                return Some(1);
            }
            // a slot that never fires sorts after every slot that does
            let key = |offset: Option<u16>| offset.map_or(u32::MAX, u32::from);
            if key(self.next_alarm_offset(1, now, match_now)) < key(self.next_alarm_offset(0, now, match_now)) {
                return Some(1);
            }
        }
        Some(0)
    }

    /// Minutes until a stored profile slot fires
    pub fn next_alarm_offset(&self, id: usize, now: &DateTime, match_now: bool) -> Option<u16> {
        let (time, dow) = self.read_profile_alarm_time(id)?;
        schedule::next_alarm_offset(time, dow, now, match_now)
    }

    // ------------------------------------------------------------------
    // Per-tick processing
    // ------------------------------------------------------------------

    /// Run one tick of the engine
    pub fn process_events(&mut self) {
        if self.detect_sd_card().is_some() {
            self.io.screen.borrow_mut().request_update(false);
        }

        let was_on = self.alarm_switch_on;
        if self.detect_alarm_switch_state() != was_on {
            let suspended = {
                let mut power = self.io.power.borrow_mut();
                power.reset_suspend_delay();
                power.power_mode() == PowerMode::Suspend
            };
            self.io.display.borrow_mut().request_clock_update(true);
            if suspended {
                self.io.screen.borrow_mut().request_update(false);
            }
            info!("alarm switch {}", if self.alarm_switch_on { "on" } else { "off" });
        }

        let local = self.io.clock.local_time();
        if self.last_minute != Some(local.minute) {
            self.last_minute = Some(local.minute);
            self.check_for_alarms(&local);
        }

        if self.play_mode.is_off() {
            return;
        }

        if !self.alarm_switch_on && !self.play_mode.is_test() {
            self.stop();
            return;
        }

        if self.play_mode.is_snoozing() {
            let elapsed = self.io.clock.epoch().saturating_sub(self.snooze_start);
            if elapsed > u32::from(self.profile.snooze_delay) * 60 {
                self.resume();
            }
            return;
        }

        if self.play_delay.as_ticks() > 0 {
            if self.io.clock.now().saturating_duration_since(self.delay_start) < self.play_delay {
                return;
            }
            let mode = self.play_mode;
            self.play_mode = PlayMode::OFF;
            self.play_delay = Duration::from_millis(0);
            self.play(mode);
            if self.play_mode.is_off() {
                return;
            }
        }

        if self.profile.gradual && !self.play_mode.is_test() {
            self.update_gradual_volume();
        }

        if self.play_mode.contains(PlayMode::AUDIO) {
            self.io.power.borrow_mut().reset_suspend_delay();
            self.feed_buffer();
        }

        if self.play_mode.contains(PlayMode::VISUAL) {
            let now = self.io.clock.now();
            let mut display = self.io.display.borrow_mut();
            self.visual.step(
                now,
                self.profile.visual_mode,
                self.profile.effect_speed,
                &self.settings,
                &mut *display,
            );
        }
    }

    // ------------------------------------------------------------------
    // Audio sub-effect
    // ------------------------------------------------------------------

    /// Linear ramp from 0 to the profile volume over the ramp window
    fn update_gradual_volume(&mut self) {
        let target = self.profile.volume.min(100);
        let volume = if target == 0 {
            0
        } else {
            let step_ms = GRADUAL_RAMP_MS / u64::from(target);
            let elapsed = self
                .io
                .clock
                .now()
                .saturating_duration_since(self.alarm_start)
                .as_millis();
            u8::try_from((elapsed / step_ms).min(u64::from(target))).unwrap_or(target)
        };

        let mut audio = self.audio.borrow_mut();
        if volume != audio.volume() {
            audio.set_volume(volume);
        }
    }

    /// Open the sound source and unmute
    fn audio_start(&mut self) {
        if !self.play_mode.contains(PlayMode::AUDIO) {
            return;
        }

        // no alarm sound while the CPU sleeps
        {
            let mut power = self.io.power.borrow_mut();
            if power.power_mode() == PowerMode::Suspend {
                power.set_power_mode(PowerMode::LowPower);
            }
        }

        let volume = if self.profile.gradual && !self.play_mode.is_test() {
            0
        } else {
            self.profile.volume
        };

        match self.sd.open_file(self.profile.filename.as_str()) {
            Ok(name) => {
                self.profile.filename = name;
                self.sd.rewind();
            }
            Err(e) => {
                warn!("{:?}, playing built-in alarm sound", e);
                self.fallback.reset();
            }
        }

        let mut audio = self.audio.borrow_mut();
        audio.set_volume(volume);
        audio.start_playback();
    }

    /// Mute, and cancel the stream if sound was part of the alarm
    fn audio_stop(&mut self) {
        let cancel = self.play_mode.contains(PlayMode::AUDIO);
        self.audio.borrow_mut().stop_playback(cancel);
    }

    /// Push up to a few blocks to the codec while it has room
    fn feed_buffer(&mut self) {
        if self.play_mode.is_snoozing() {
            return;
        }

        let audio_cell = self.audio;
        let mut audio = audio_cell.borrow_mut();
        let mut buffer = [0u8; AUDIO_BLOCK_SIZE];

        for _ in 0..AUDIO_BLOCKS_PER_RUN {
            if !audio.ready_for_data() {
                break;
            }

            if self.sd.is_file_open() {
                let read = self.sd.read(&mut buffer);
                if read == 0 {
                    // loop the file
                    self.sd.rewind();
                    continue;
                }
                audio.play_data(&buffer[..read]);
            } else {
                audio.play_data(self.fallback.next_block());
            }
        }
    }

    // ------------------------------------------------------------------
    // Visual sub-effect
    // ------------------------------------------------------------------

    /// Switch the alarm lamp on and arm the visual effect
    fn visual_start(&mut self) {
        if self.play_mode.contains(PlayMode::LAMP) && self.profile.lamp.mode != LampMode::Off {
            // no auto-off during an alarm
            self.profile.lamp.delay_off = 0;
            let mut lamp = self.io.lamp.borrow_mut();
            if lamp.is_active() {
                lamp.deactivate();
            }
            lamp.activate(&self.profile.lamp, false);
        }

        if !self.play_mode.contains(PlayMode::VISUAL) || self.profile.visual_mode == VisualMode::None {
            return;
        }

        self.visual
            .start(self.profile.visual_mode, self.profile.effect_speed, &self.settings);
    }

    /// Switch the lamp off and restore the clock display
    fn visual_stop(&mut self) {
        self.visual.stop();
        self.io.lamp.borrow_mut().deactivate();

        let mut display = self.io.display.borrow_mut();
        display.set_color_from_table(self.settings.clock_color);
        display.set_brightness(self.settings.clock_brightness);
        display.update();
    }
}

impl<C, A, S, CD, SW> Task for Alarm<'_, C, A, S, CD, SW>
where
    C: AudioCodec,
    A: Amplifier,
    S: Storage,
    CD: InputPin,
    SW: InputPin,
{
    fn run_task(&mut self) {
        self.process_events();
    }
}
