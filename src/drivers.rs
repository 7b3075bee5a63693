//! # Drivers
//! Method-level contracts of the hardware the alarm engine commands.
//!
//! Register-level failures are swallowed inside the implementations; none of
//! these calls report errors back to the engine.

use crate::color::ColorId;
use crate::config::{MAX_LENGTH_ALARM_FILENAME, NightLampSettings};
use heapless::String;
use smart_leds::RGB8;

/// Audio decoder chip (VS1053 style)
pub trait AudioCodec {
    /// Power up and initialise
    fn begin(&mut self);
    /// Power down
    fn end(&mut self);
    /// Whether the decoder FIFO accepts another block
    fn ready_for_data(&mut self) -> bool;
    /// Push one block of encoded audio
    fn play_data(&mut self, data: &[u8]);
    /// Per-channel attenuation, 0 is loudest and 255 silent
    fn set_volume(&mut self, left: u8, right: u8);
    /// Reset the decode time register before a new stream
    fn reset_playback(&mut self);
    /// Cancel the running stream
    fn cancel_playback(&mut self);
}

/// Class-D amplifier (TPA2016 style)
pub trait Amplifier {
    /// Power up and initialise
    fn begin(&mut self);
    /// Power down
    fn end(&mut self);
    /// Unmute the speaker outputs
    fn enable_outputs(&mut self);
    /// Mute the speaker outputs
    fn disable_outputs(&mut self);
    /// Fixed gain in dB
    fn set_fixed_gain(&mut self, db: i8);
    /// AGC maximum gain in dB
    fn set_max_gain(&mut self, db: u8);
}

/// SD card filesystem, one open file at a time, root directory only
pub trait Storage {
    /// Mount the card and open the root directory
    fn begin(&mut self) -> bool;
    /// Open a file in the root directory by name
    fn open(&mut self, name: &str) -> bool;
    /// Open the next directory entry, `false` at the end of the directory
    fn open_next(&mut self) -> bool;
    /// Short name of the open file
    fn file_name(&self) -> Option<String<MAX_LENGTH_ALARM_FILENAME>>;
    /// Whether the open entry is a regular file
    fn is_file(&self) -> bool;
    /// Read into `buf`, returns bytes read, 0 at end of file
    fn read(&mut self, buf: &mut [u8]) -> usize;
    /// Seek the open file back to its start
    fn rewind(&mut self);
    /// Close the open file
    fn close(&mut self);
    /// Whether a file is open
    fn is_open(&self) -> bool;
    /// Restart directory iteration
    fn rewind_dir(&mut self);
    /// Whether the root directory is open
    fn is_root_open(&self) -> bool;
    /// Whether a file exists in the root directory
    fn exists(&mut self, name: &str) -> bool;
}

/// Night lamp
pub trait Lamp {
    /// Switch on with the given settings
    fn activate(&mut self, settings: &NightLampSettings, test_mode: bool);
    /// Switch off
    fn deactivate(&mut self);
    /// Whether the lamp is on
    fn is_active(&self) -> bool;
}

/// Clock display (NeoPixel matrix)
pub trait Display {
    /// Set the color from the color table
    fn set_color_from_table(&mut self, color: ColorId);
    /// Set an arbitrary color
    fn set_color_rgb(&mut self, color: RGB8);
    /// Brightness in percent
    fn set_brightness(&mut self, brightness: u8);
    /// Push pending changes to the LEDs
    fn update(&mut self);
    /// Redraw the clock face, optionally in full
    fn request_clock_update(&mut self, full: bool);
}

/// Screens the alarm engine and the power state machine switch to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScreenId {
    /// Shown while an alarm is active
    Alarm,
    /// Minimal layout shown in suspend
    Suspend,
}

/// Status LCD screen manager
pub trait Screen {
    /// Switch to a screen
    fn activate(&mut self, screen: ScreenId);
    /// Leave the current screen
    fn exit_screen(&mut self);
    /// Repaint, clearing first when `clear` is set
    fn request_update(&mut self, clear: bool);
    /// Inactivity timeout of the current screen
    fn set_timeout(&mut self, timeout_ms: u32);
    /// Restart the inactivity timeout
    fn reset_timeout(&mut self);
}
