//! # Config
//! Compile-time constants and the clock settings the alarm engine reads.
//!
//! Factory defaults come from `config/alarm_defaults.json`, turned into
//! constants by the build script.

use crate::color::ColorId;
use embassy_time::Duration;
use serde::{Deserialize, Serialize};

/// Factory defaults generated by `build.rs`
#[allow(clippy::missing_docs_in_private_items, missing_docs)]
pub mod defaults {
    include!(concat!(env!("OUT_DIR"), "/alarm_defaults.rs"));
}

/// Number of persisted alarm profile slots
pub const MAX_NUM_PROFILES: usize = 2;

/// Maximum length of an alarm sound filename (8.3 short name)
pub const MAX_LENGTH_ALARM_FILENAME: usize = 12;

/// Maximum length of a custom alarm message
pub const MAX_LENGTH_ALARM_MESSAGE: usize = 16;

/// Time on battery after which low power mode drops into suspend
pub const SUSPEND_DELAY: Duration = Duration::from_millis(30_000);

/// Debounce window for the SD card-detect pin
pub const SD_DEBOUNCE: Duration = Duration::from_millis(1_000);

/// Total length of the gradual volume ramp, in milliseconds
pub const GRADUAL_RAMP_MS: u64 = 45_000;

/// Delay before a previewed file starts playing after selection
pub const SELECT_FILE_PLAY_DELAY: Duration = Duration::from_millis(750);

/// Bytes pushed to the codec per block
pub const AUDIO_BLOCK_SIZE: usize = 32;

/// Upper bound of blocks pushed per scheduler tick
pub const AUDIO_BLOCKS_PER_RUN: usize = 4;

/// Screen timeout while snoozing
pub const SNOOZE_SCREEN_TIMEOUT: Duration = Duration::from_millis(1_000);

/// Amplifier fixed gain in dB
pub const AMP_FIXED_GAIN_DB: i8 = -3;

/// Amplifier maximum gain in dB
pub const AMP_MAX_GAIN_DB: u8 = 30;

/// Capacity of the power mode subscriber list
pub const MAX_POWER_SUBSCRIBERS: usize = 8;

/// Snooze delay range, in minutes
pub const SNOOZE_DELAY_RANGE: (u8, u8) = (0, 30);

/// Alarm volume range, in percent
pub const ALARM_VOLUME_RANGE: (u8, u8) = (20, 100);

/// Visual effect speed range
pub const EFFECT_SPEED_RANGE: (u8, u8) = (1, 10);

/// Night lamp modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LampMode {
    /// Lamp disabled
    Off,
    /// Steady light
    #[default]
    On,
    /// Blinking
    Flashing,
    /// Breathing
    Fading,
    /// Color cycle
    Rainbow,
    /// Dimmed, ambient light controlled
    NightLight,
}

impl LampMode {
    /// Decode a stored mode byte, unknown values map to `Off`
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::On,
            2 => Self::Flashing,
            3 => Self::Fading,
            4 => Self::Rainbow,
            5 => Self::NightLight,
            _ => Self::Off,
        }
    }
}

/// Night lamp configuration, shared in shape between the night lamp and the alarm lamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NightLampSettings {
    /// Color table entry
    pub color: ColorId,
    /// Brightness in percent
    pub brightness: u8,
    /// Auto-off delay in minutes, 0 disables it
    pub delay_off: u8,
    /// Effect speed, 1-10
    pub speed: u8,
    /// Lamp mode
    pub mode: LampMode,
}

impl Default for NightLampSettings {
    fn default() -> Self {
        Self {
            color: ColorId::from_index(defaults::DEFAULT_LAMP_COLOR).unwrap_or(ColorId::White),
            brightness: defaults::DEFAULT_LAMP_BRIGHTNESS,
            delay_off: defaults::DEFAULT_LAMP_DELAY_OFF,
            speed: defaults::DEFAULT_LAMP_SPEED,
            mode: LampMode::from_u8(defaults::DEFAULT_LAMP_MODE),
        }
    }
}

/// Clock settings the alarm engine depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockSettings {
    /// Enable flag per alarm profile slot
    pub alarm_on: [bool; MAX_NUM_PROFILES],
    /// Clock face color, restored after a visual alarm
    pub clock_color: ColorId,
    /// Clock face brightness in percent, baseline of the visual effects
    pub clock_brightness: u8,
    /// Night lamp settings
    pub lamp: NightLampSettings,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            alarm_on: [false; MAX_NUM_PROFILES],
            clock_color: ColorId::from_index(defaults::DEFAULT_CLOCK_COLOR).unwrap_or_default(),
            clock_brightness: defaults::DEFAULT_CLOCK_BRIGHTNESS,
            lamp: NightLampSettings::default(),
        }
    }
}

impl ClockSettings {
    /// Whether any alarm profile slot is enabled
    #[must_use]
    pub fn any_alarm_on(&self) -> bool {
        self.alarm_on.iter().any(|on| *on)
    }
}
