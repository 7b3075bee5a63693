//! # neoclock-alarm
//! Alarm playback engine and power mode state machine of the NeoClock alarm clock.
//!
//! The crate is `no_std` and talks to the hardware only through the traits in
//! [`drivers`], [`power::PowerHal`] and [`rtc::Clock`]. A firmware image wires
//! real chip drivers into those seams, the `simulator` binary wires host fakes.
//!
//! Per scheduler tick the firmware calls [`Scheduler::tick`], which feeds the
//! watchdog, lets [`Power`] settle the power mode and then runs every task,
//! the [`Alarm`] engine among them.

#![cfg_attr(not(test), no_std)]

cfg_if::cfg_if! {
    if #[cfg(feature = "defmt")] {
        #[allow(unused_imports)]
        pub(crate) use defmt::{debug, error, info, trace, warn};
    }
    else if #[cfg(feature = "log")] {
        #[allow(unused_imports)]
        pub(crate) use log::{debug, error, info, trace, warn};
    }
    else {
        /// No-op logging used when neither `log` nor `defmt` is enabled
        mod noop_log {
            macro_rules! trace {
                ($($arg:tt)*) => {{}};
            }
            macro_rules! debug {
                ($($arg:tt)*) => {{}};
            }
            macro_rules! info {
                ($($arg:tt)*) => {{}};
            }
            macro_rules! warn {
                ($($arg:tt)*) => {{}};
            }
            macro_rules! error {
                ($($arg:tt)*) => {{}};
            }
            #[allow(unused_imports)]
            pub(crate) use {debug, error, info, trace, warn};
        }
        #[allow(unused_imports)]
        pub(crate) use noop_log::{debug, error, info, trace, warn};
    }
}

pub mod alarm;
pub mod audio;
pub mod color;
pub mod config;
pub mod drivers;
pub mod error;
pub mod irq;
pub mod play_mode;
pub mod power;
pub mod profile;
pub mod rtc;
pub mod schedule;
pub mod scheduler;
pub mod sdcard;
pub mod visual;

pub use alarm::{Alarm, Collaborators};
pub use audio::AudioOutput;
pub use color::ColorId;
pub use config::{ClockSettings, LampMode, NightLampSettings};
pub use error::Error;
pub use play_mode::PlayMode;
pub use power::{Power, PowerAware, PowerControl, PowerHal, PowerMode};
pub use profile::{AlarmProfile, AlarmTime, ProfileSlots, ProfileStore, VisualMode};
pub use rtc::{Clock, DateTime, DayOfWeek};
pub use scheduler::{Scheduler, Task};
pub use sdcard::{CardEvent, SdCard};
