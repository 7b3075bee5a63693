//! # Error
//! Errors returned by the alarm engine and the power state machine.

/// Crate error type
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The profile slot does not exist
    #[error("invalid alarm profile id {0}")]
    InvalidProfile(usize),
    /// No SD card present or the filesystem is not mounted
    #[error("no SD card")]
    NoCard,
    /// The requested file could not be opened
    #[error("file not found")]
    FileNotFound,
    /// The card holds no playable audio file
    #[error("no audio file on SD card")]
    NoAudioFile,
    /// The power mode subscriber list is full
    #[error("power subscriber list full")]
    SubscriberListFull,
}

/// Crate result type
pub type Result<T> = core::result::Result<T, Error>;
