//! Generates `alarm_defaults.rs` from `config/alarm_defaults.json`.
//!
//! The JSON file is optional. When it is missing the built-in factory
//! defaults are used, so a fresh checkout builds without any setup.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::print_stdout)]

use serde::Deserialize;
use std::{
    env, fs,
    fs::File,
    io,
    io::Write,
    path::Path,
};

/// Factory defaults for a fresh alarm profile slot
#[derive(Deserialize)]
#[serde(default)]
struct ProfileDefaults {
    /// snooze delay in minutes
    snooze_delay: u8,
    /// alarm volume in percent
    volume: u8,
    /// ramp the volume up over the first 45 seconds
    gradual: bool,
    /// visual mode discriminant
    visual_mode: u8,
    /// visual effect speed, 1-10
    effect_speed: u8,
    /// alarm hour
    hour: u8,
    /// alarm minute
    minute: u8,
    /// weekday mask, bit 0 = Sunday
    dow: u8,
}

impl Default for ProfileDefaults {
    fn default() -> Self {
        Self {
            snooze_delay: 10,
            volume: 70,
            gradual: false,
            visual_mode: 0,
            effect_speed: 5,
            hour: 7,
            minute: 0,
            dow: 0x7F,
        }
    }
}

/// Factory defaults for the clock face
#[derive(Deserialize)]
#[serde(default)]
struct ClockDefaults {
    /// color table index
    color: u8,
    /// brightness in percent
    brightness: u8,
}

impl Default for ClockDefaults {
    fn default() -> Self {
        Self {
            color: 1,
            brightness: 40,
        }
    }
}

/// Factory defaults for the night lamp
#[derive(Deserialize)]
#[serde(default)]
struct LampDefaults {
    /// color table index
    color: u8,
    /// brightness in percent
    brightness: u8,
    /// auto-off delay in minutes
    delay_off: u8,
    /// effect speed, 1-10
    speed: u8,
    /// lamp mode discriminant
    mode: u8,
}

impl Default for LampDefaults {
    fn default() -> Self {
        Self {
            color: 12,
            brightness: 50,
            delay_off: 0,
            speed: 5,
            mode: 1,
        }
    }
}

/// Root of `alarm_defaults.json`
#[derive(Deserialize, Default)]
#[serde(default)]
struct Defaults {
    /// profile slot defaults
    profile: ProfileDefaults,
    /// clock face defaults
    clock: ClockDefaults,
    /// night lamp defaults
    lamp: LampDefaults,
}

fn main() {
    println!("cargo:rerun-if-changed=config/alarm_defaults.json");
    println!("cargo:rerun-if-changed=assets/alarm_fallback.mp3");
    alarm_defaults().unwrap();
}

/// Generate `alarm_defaults.rs` from `alarm_defaults.json`
fn alarm_defaults() -> io::Result<()> {
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR environment variable not set");
    let dest_path = Path::new(&out_dir).join("alarm_defaults.rs");
    let mut f = File::create(dest_path).expect("Could not create alarm_defaults.rs file");

    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR environment variable not set");
    let config_path = Path::new(&manifest_dir).join("config/alarm_defaults.json");
    let defaults: Defaults = if config_path.exists() {
        let contents = fs::read_to_string(config_path).expect("Could not read alarm_defaults.json file");
        serde_json::from_str(&contents).expect("Could not parse alarm_defaults.json file")
    } else {
        println!("alarm_defaults.json not found, using built-in defaults");
        Defaults::default()
    };

    let p = &defaults.profile;
    writeln!(f, "pub const DEFAULT_SNOOZE_DELAY: u8 = {};", p.snooze_delay)?;
    writeln!(f, "pub const DEFAULT_VOLUME: u8 = {};", p.volume)?;
    writeln!(f, "pub const DEFAULT_GRADUAL: bool = {};", p.gradual)?;
    writeln!(f, "pub const DEFAULT_VISUAL_MODE: u8 = {};", p.visual_mode)?;
    writeln!(f, "pub const DEFAULT_EFFECT_SPEED: u8 = {};", p.effect_speed)?;
    writeln!(f, "pub const DEFAULT_ALARM_HOUR: u8 = {};", p.hour)?;
    writeln!(f, "pub const DEFAULT_ALARM_MINUTE: u8 = {};", p.minute)?;
    writeln!(f, "pub const DEFAULT_DOW: u8 = {};", p.dow)?;

    let c = &defaults.clock;
    writeln!(f, "pub const DEFAULT_CLOCK_COLOR: u8 = {};", c.color)?;
    writeln!(f, "pub const DEFAULT_CLOCK_BRIGHTNESS: u8 = {};", c.brightness)?;

    let l = &defaults.lamp;
    writeln!(f, "pub const DEFAULT_LAMP_COLOR: u8 = {};", l.color)?;
    writeln!(f, "pub const DEFAULT_LAMP_BRIGHTNESS: u8 = {};", l.brightness)?;
    writeln!(f, "pub const DEFAULT_LAMP_DELAY_OFF: u8 = {};", l.delay_off)?;
    writeln!(f, "pub const DEFAULT_LAMP_SPEED: u8 = {};", l.speed)?;
    writeln!(f, "pub const DEFAULT_LAMP_MODE: u8 = {};", l.mode)?;
    Ok(())
}
