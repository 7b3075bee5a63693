//! # Alarm profile
//! The settings of one alarm slot and the store the slots live in.
//!
//! The engine works on a single active copy of a profile; the persisted slots
//! are reached through [`ProfileStore`] so the backing medium stays outside
//! the crate.

use crate::color::ColorId;
use crate::config::{
    ALARM_VOLUME_RANGE, EFFECT_SPEED_RANGE, MAX_LENGTH_ALARM_FILENAME, MAX_LENGTH_ALARM_MESSAGE,
    MAX_NUM_PROFILES, NightLampSettings, SNOOZE_DELAY_RANGE, defaults,
};
use crate::config::LampMode;
use heapless::String;
use serde::{Deserialize, Serialize};

/// Visual effect shown on the clock display during an alarm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VisualMode {
    /// No visual effect
    #[default]
    None,
    /// Display blinks on and off
    Flashing,
    /// Brightness breathes up and down
    Fading,
    /// Color cycles through the wheel
    Rainbow,
    /// Color alternates between white and the clock color
    WhiteFlash,
    /// Display blinks red
    RedFlash,
}

impl VisualMode {
    /// Decode a stored mode byte, unknown values map to `None`
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Flashing,
            2 => Self::Fading,
            3 => Self::Rainbow,
            4 => Self::WhiteFlash,
            5 => Self::RedFlash,
            _ => Self::None,
        }
    }
}

/// Time of day an alarm fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmTime {
    /// 0-23
    pub hour: u8,
    /// 0-59
    pub minute: u8,
}

impl AlarmTime {
    /// Create a new alarm time
    #[must_use]
    pub const fn new(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }
}

/// One alarm profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmProfile {
    /// Sound file on the SD card, empty plays the built-in clip
    pub filename: String<MAX_LENGTH_ALARM_FILENAME>,
    /// Custom alarm screen text, empty shows a greeting
    pub message: String<MAX_LENGTH_ALARM_MESSAGE>,
    /// Snooze length in minutes, 0 disables snooze
    pub snooze_delay: u8,
    /// Volume in percent
    pub volume: u8,
    /// Ramp the volume up over 45 seconds
    pub gradual: bool,
    /// Visual effect on the clock display
    pub visual_mode: VisualMode,
    /// Visual effect speed, 1-10
    pub effect_speed: u8,
    /// Time of day
    pub time: AlarmTime,
    /// Weekday mask, bit 0 = Sunday
    pub dow: u8,
    /// Alarm lamp
    pub lamp: NightLampSettings,
}

impl Default for AlarmProfile {
    fn default() -> Self {
        Self {
            filename: String::new(),
            message: String::new(),
            snooze_delay: defaults::DEFAULT_SNOOZE_DELAY,
            volume: defaults::DEFAULT_VOLUME,
            gradual: defaults::DEFAULT_GRADUAL,
            visual_mode: VisualMode::from_u8(defaults::DEFAULT_VISUAL_MODE),
            effect_speed: defaults::DEFAULT_EFFECT_SPEED,
            time: AlarmTime::new(defaults::DEFAULT_ALARM_HOUR, defaults::DEFAULT_ALARM_MINUTE),
            dow: defaults::DEFAULT_DOW,
            lamp: NightLampSettings {
                color: ColorId::White,
                brightness: 50,
                delay_off: 0,
                speed: defaults::DEFAULT_EFFECT_SPEED,
                mode: LampMode::Off,
            },
        }
    }
}

impl AlarmProfile {
    /// Text for the alarm screen: the custom message, or a greeting derived
    /// from the alarm hour.
    #[must_use]
    pub fn greeting(&self) -> &str {
        if !self.message.is_empty() {
            return self.message.as_str();
        }
        match self.time.hour {
            0..12 => "Good morning",
            12..18 => "Good afternoon",
            _ => "Good evening",
        }
    }

    /// Copy with every field clamped into its valid range.
    /// Used on profiles restored from external storage.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let mut p = self.clone();
        p.snooze_delay = p.snooze_delay.clamp(SNOOZE_DELAY_RANGE.0, SNOOZE_DELAY_RANGE.1);
        p.volume = p.volume.clamp(ALARM_VOLUME_RANGE.0, ALARM_VOLUME_RANGE.1);
        p.effect_speed = p.effect_speed.clamp(EFFECT_SPEED_RANGE.0, EFFECT_SPEED_RANGE.1);
        p.lamp.speed = p.lamp.speed.clamp(EFFECT_SPEED_RANGE.0, EFFECT_SPEED_RANGE.1);
        p.lamp.brightness = p.lamp.brightness.min(100);
        p.time.hour = p.time.hour.min(23);
        p.time.minute = p.time.minute.min(59);
        p.dow &= 0x7F;
        p
    }
}

/// Persisted alarm profile slots
pub trait ProfileStore {
    /// Read a whole profile, `None` for an invalid slot
    fn load(&self, id: usize) -> Option<AlarmProfile>;
    /// Write a whole profile, `false` for an invalid slot
    fn save(&mut self, id: usize, profile: &AlarmProfile) -> bool;
    /// Read only the time and weekday mask of a slot
    fn alarm_time(&self, id: usize) -> Option<(AlarmTime, u8)> {
        self.load(id).map(|p| (p.time, p.dow))
    }
}

/// Profile slots held in RAM
#[derive(Debug, Clone, Default)]
pub struct ProfileSlots {
    /// The slots
    slots: [AlarmProfile; MAX_NUM_PROFILES],
}

impl ProfileSlots {
    /// Create slots from existing profiles
    #[must_use]
    pub fn new(slots: [AlarmProfile; MAX_NUM_PROFILES]) -> Self {
        Self { slots }
    }
}

impl ProfileStore for ProfileSlots {
    fn load(&self, id: usize) -> Option<AlarmProfile> {
        self.slots.get(id).cloned()
    }

    fn save(&mut self, id: usize, profile: &AlarmProfile) -> bool {
        self.slots.get_mut(id).is_some_and(|slot| {
            slot.clone_from(profile);
            true
        })
    }

    fn alarm_time(&self, id: usize) -> Option<(AlarmTime, u8)> {
        self.slots.get(id).map(|p| (p.time, p.dow))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_follows_alarm_hour() {
        let mut p = AlarmProfile::default();
        p.time = AlarmTime::new(6, 30);
        assert_eq!(p.greeting(), "Good morning");
        p.time = AlarmTime::new(12, 0);
        assert_eq!(p.greeting(), "Good afternoon");
        p.time = AlarmTime::new(18, 0);
        assert_eq!(p.greeting(), "Good evening");
        p.message.push_str("Rise and shine").unwrap();
        assert_eq!(p.greeting(), "Rise and shine");
    }

    #[test]
    fn sanitized_clamps_out_of_range_values() {
        let mut p = AlarmProfile::default();
        p.volume = 5;
        p.snooze_delay = 99;
        p.effect_speed = 0;
        p.time = AlarmTime::new(30, 75);
        p.dow = 0xFF;
        let s = p.sanitized();
        assert_eq!(s.volume, 20);
        assert_eq!(s.snooze_delay, 30);
        assert_eq!(s.effect_speed, 1);
        assert_eq!(s.time, AlarmTime::new(23, 59));
        assert_eq!(s.dow, 0x7F);
    }

    #[test]
    fn slots_reject_invalid_ids() {
        let mut slots = ProfileSlots::default();
        assert!(slots.load(2).is_none());
        assert!(!slots.save(2, &AlarmProfile::default()));

        let mut p = AlarmProfile::default();
        p.time = AlarmTime::new(5, 45);
        assert!(slots.save(1, &p));
        assert_eq!(slots.alarm_time(1), Some((AlarmTime::new(5, 45), p.dow)));
    }

    #[test]
    fn profile_survives_json() {
        let mut p = AlarmProfile::default();
        p.filename.push_str("WAKEUP.MP3").unwrap();
        p.visual_mode = VisualMode::Rainbow;
        let json = serde_json::to_string(&p).unwrap();
        let back: AlarmProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
