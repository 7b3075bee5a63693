//! # Audio
//! Codec and amplifier stack of the alarm sound, plus the built-in fallback clip.

use crate::config::{AMP_FIXED_GAIN_DB, AMP_MAX_GAIN_DB, AUDIO_BLOCK_SIZE};
use crate::drivers::{Amplifier, AudioCodec};
use crate::power::{PowerAware, PowerMode};
use crate::{debug, info};

/// Alarm sound compiled into the firmware, played when no SD file is usable
pub static FALLBACK_CLIP: &[u8] = include_bytes!("../assets/alarm_fallback.mp3");

/// Looping read cursor over [`FALLBACK_CLIP`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackCursor {
    /// Offset of the next block
    position: usize,
}

impl FallbackCursor {
    /// Start from the beginning of the clip
    pub const fn reset(&mut self) {
        self.position = 0;
    }

    /// Next block of the clip. A short block at the end of the clip wraps the
    /// cursor back to the start.
    pub fn next_block(&mut self) -> &'static [u8] {
        let start = self.position;
        let end = (start + AUDIO_BLOCK_SIZE).min(FALLBACK_CLIP.len());
        self.position = if end >= FALLBACK_CLIP.len() { 0 } else { end };
        &FALLBACK_CLIP[start..end]
    }

    /// Offset of the next block
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }
}

/// Audio codec and amplifier, owned by the alarm engine
pub struct AudioOutput<C: AudioCodec, A: Amplifier> {
    /// Decoder chip
    codec: C,
    /// Speaker amplifier
    amp: A,
    /// Set by `begin`, power transitions are ignored before that
    initialized: bool,
    /// Logical volume in percent
    volume: u8,
}

impl<C: AudioCodec, A: Amplifier> AudioOutput<C, A> {
    /// Wrap the drivers, nothing is powered yet
    pub const fn new(codec: C, amp: A) -> Self {
        Self {
            codec,
            amp,
            initialized: false,
            volume: 0,
        }
    }

    /// Power up for the given mode
    pub fn begin(&mut self, mode: PowerMode) {
        self.initialized = true;
        self.on_power_state_change(mode);
    }

    /// Power down codec and amplifier
    pub fn end(&mut self) {
        self.amp.end();
        self.codec.end();
        self.initialized = false;
    }

    /// Set the amplifier up for the alarm speaker
    fn init_amplifier(&mut self) {
        self.amp.begin();
        self.amp.set_fixed_gain(AMP_FIXED_GAIN_DB);
        self.amp.set_max_gain(AMP_MAX_GAIN_DB);
    }

    /// Set the volume in percent, clamped to 100.
    /// The codec attenuates, so it receives `100 - volume`.
    pub fn set_volume(&mut self, volume: u8) {
        let volume = volume.min(100);
        self.volume = volume;
        let attenuation = 100 - volume;
        self.codec.set_volume(attenuation, attenuation);
    }

    /// Logical volume in percent
    #[must_use]
    pub const fn volume(&self) -> u8 {
        self.volume
    }

    /// Prepare the codec for a new stream and unmute the speaker
    pub fn start_playback(&mut self) {
        self.codec.reset_playback();
        self.amp.enable_outputs();
    }

    /// Mute the speaker and, if a stream was running, cancel it
    pub fn stop_playback(&mut self, cancel: bool) {
        self.amp.disable_outputs();
        if cancel {
            self.codec.cancel_playback();
        }
    }

    /// Whether the codec accepts another block
    pub fn ready_for_data(&mut self) -> bool {
        self.codec.ready_for_data()
    }

    /// Push one block to the codec
    pub fn play_data(&mut self, data: &[u8]) {
        self.codec.play_data(data);
    }

    /// Decoder chip, for inspection
    pub const fn codec(&self) -> &C {
        &self.codec
    }

    /// Amplifier, for inspection
    pub const fn amplifier(&self) -> &A {
        &self.amp
    }
}

impl<C: AudioCodec, A: Amplifier> PowerAware for AudioOutput<C, A> {
    fn on_power_state_change(&mut self, mode: PowerMode) {
        if !self.initialized {
            return;
        }

        if mode == PowerMode::Suspend {
            debug!("audio: powering down");
            self.amp.end();
            self.codec.end();
        } else {
            info!("audio: powering up");
            self.codec.begin();
            self.init_amplifier();
        }
    }
}
