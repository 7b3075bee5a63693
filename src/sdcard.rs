//! # SD card
//! Card-detect debouncing and alarm sound file selection on the SD card.

use crate::config::{MAX_LENGTH_ALARM_FILENAME, SD_DEBOUNCE};
use crate::drivers::Storage;
use crate::error::{Error, Result};
use crate::power::PowerMode;
use crate::{info, warn};
use embassy_time::Instant;
use embedded_hal::digital::InputPin;
use heapless::String;

/// Extensions the codec can decode
const AUDIO_EXTENSIONS: [&str; 5] = [".MP3", ".MID", ".OGG", ".AAC", ".WAV"];

/// Card presence change reported by [`SdCard::detect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CardEvent {
    /// Card inserted and mounted
    Inserted,
    /// Card removed
    Removed,
}

/// Debounce state of the card-detect pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Debounce {
    /// Pin not asserted
    Idle,
    /// Asserted during suspend, where the millisecond timer is stopped.
    /// Counts as settled on the next wakeup.
    Wakeup,
    /// Asserted since the given instant
    Since(Instant),
}

/// SD card with its card-detect pin
pub struct SdCard<S: Storage, CD: InputPin> {
    /// Filesystem
    storage: S,
    /// Card-detect switch, low when a card is inserted
    detect_pin: CD,
    /// Card mounted
    present: bool,
    /// Card-detect debounce
    debounce: Debounce,
}

impl<S: Storage, CD: InputPin> SdCard<S, CD> {
    /// Wrap the filesystem and the card-detect pin
    pub const fn new(storage: S, detect_pin: CD) -> Self {
        Self {
            storage,
            detect_pin,
            present: false,
            debounce: Debounce::Idle,
        }
    }

    /// Whether a card is mounted
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.present
    }

    /// Poll the card-detect pin.
    ///
    /// A newly inserted card must stay detected for the debounce window (one
    /// wakeup in suspend) before it is mounted. Returns the presence change,
    /// if any.
    pub fn detect(&mut self, power_mode: PowerMode, now: Instant) -> Option<CardEvent> {
        let inserted = self.detect_pin.is_low().unwrap_or(false);

        if !inserted {
            if !self.present {
                self.debounce = Debounce::Idle;
                return None;
            }
            self.storage.close();
            self.debounce = Debounce::Idle;
            self.present = false;
            info!("SD card removed");
            return Some(CardEvent::Removed);
        }

        if self.present {
            return None;
        }

        match (self.debounce, power_mode) {
            (Debounce::Idle, PowerMode::Suspend) => {
                self.debounce = Debounce::Wakeup;
                return None;
            }
            (Debounce::Idle, _) => {
                self.debounce = Debounce::Since(now);
                return None;
            }
            (Debounce::Since(start), _) if now.saturating_duration_since(start) < SD_DEBOUNCE => {
                return None;
            }
            _ => {}
        }

        self.debounce = Debounce::Idle;
        if !self.storage.begin() {
            warn!("SD card init failed");
            return None;
        }
        self.storage.rewind_dir();
        if !self.storage.is_root_open() {
            warn!("cannot open root directory on SD card");
            return None;
        }

        self.present = true;
        info!("SD card inserted");
        Some(CardEvent::Inserted)
    }

    /// Open a named file. Names without an audio extension are skipped in
    /// favour of the next audio file in the directory.
    /// Returns the name of the file actually opened.
    pub fn open_file(&mut self, name: &str) -> Result<String<MAX_LENGTH_ALARM_FILENAME>> {
        if !self.present || !self.storage.is_root_open() {
            return Err(Error::NoCard);
        }
        if self.storage.is_open() {
            self.storage.close();
        }
        if name.is_empty() {
            return Err(Error::FileNotFound);
        }
        if !self.storage.open(name) {
            self.storage.rewind_dir();
            return Err(Error::FileNotFound);
        }
        self.select_audio_file()
    }

    /// Open the next audio file in the directory after `current`.
    ///
    /// An entry with the same name as `current` is skipped. Reaching the end
    /// of the directory rewinds it and fails, so the following call starts
    /// over from the first file.
    pub fn open_next_file(&mut self, current: &str) -> Result<String<MAX_LENGTH_ALARM_FILENAME>> {
        if !self.present || !self.storage.is_root_open() {
            return Err(Error::NoCard);
        }
        if self.storage.is_open() {
            self.storage.close();
        }

        if !self.storage.open_next() {
            return self.end_of_directory();
        }
        let same = self
            .storage
            .file_name()
            .is_some_and(|n| !current.is_empty() && n.as_str() == current);
        if same {
            self.storage.close();
            if !self.storage.open_next() {
                return self.end_of_directory();
            }
        }
        self.select_audio_file()
    }

    /// Walk forward from the open entry to the first playable file
    fn select_audio_file(&mut self) -> Result<String<MAX_LENGTH_ALARM_FILENAME>> {
        loop {
            if self.storage.is_file()
                && let Some(name) = self.storage.file_name()
                && is_audio_file(&name)
            {
                info!("selected alarm file {}", name.as_str());
                return Ok(name);
            }
            self.storage.close();
            if !self.storage.open_next() {
                return self.end_of_directory();
            }
        }
    }

    /// Rewind so the next search starts over from the first entry
    fn end_of_directory(&mut self) -> Result<String<MAX_LENGTH_ALARM_FILENAME>> {
        self.storage.rewind_dir();
        Err(Error::NoAudioFile)
    }

    /// Whether a file exists on the card
    pub fn file_exists(&mut self, name: &str) -> bool {
        self.present && !name.is_empty() && self.storage.exists(name)
    }

    /// Whether a file is open
    pub fn is_file_open(&self) -> bool {
        self.storage.is_open()
    }

    /// Read from the open file, 0 at end of file
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        self.storage.read(buf)
    }

    /// Seek the open file back to its start
    pub fn rewind(&mut self) {
        self.storage.rewind();
    }

    /// Close the open file
    pub fn close(&mut self) {
        self.storage.close();
    }

    /// Filesystem, for inspection
    pub const fn storage(&self) -> &S {
        &self.storage
    }
}

/// Case-insensitive check for a decodable file extension
fn is_audio_file(name: &str) -> bool {
    let Some(ext) = name.len().checked_sub(4).and_then(|i| name.get(i..)) else {
        return false;
    };
    AUDIO_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext))
}
