//! # Play mode
//! Flag set describing which alarm sub-effects are running.
//!
//! The sub-effects combine freely (a preview may play audio only, a real
//! alarm runs all of them), so this is a bit set rather than an enum.

use core::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// Set of alarm sub-effect flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlayMode(u8);

impl PlayMode {
    /// Idle
    pub const OFF: Self = Self(0x00);
    /// Alarm sound
    pub const AUDIO: Self = Self(0x01);
    /// Visual effect on the clock display
    pub const VISUAL: Self = Self(0x02);
    /// Alarm screen on the status display
    pub const SCREEN: Self = Self(0x04);
    /// Snooze in progress, only ever set together with a base mode
    pub const SNOOZE: Self = Self(0x08);
    /// Lamp
    pub const LAMP: Self = Self(0x10);
    /// User-initiated preview, ignores the alarm switch
    pub const TEST: Self = Self(0x80);

    /// A real alarm
    pub const NORMAL: Self = Self(Self::AUDIO.0 | Self::VISUAL.0 | Self::LAMP.0 | Self::SCREEN.0);
    /// Preview of the alarm sound
    pub const TEST_AUDIO: Self = Self(Self::TEST.0 | Self::AUDIO.0);
    /// Preview of the visual effect
    pub const TEST_VISUAL: Self = Self(Self::TEST.0 | Self::VISUAL.0);
    /// Preview of the alarm lamp
    pub const TEST_LAMP: Self = Self(Self::TEST.0 | Self::LAMP.0);
    /// Preview of a whole profile without the alarm screen
    pub const TEST_PROFILE: Self = Self(Self::TEST.0 | Self::AUDIO.0 | Self::VISUAL.0 | Self::LAMP.0);

    /// Build from raw bits
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw bits
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether all flags of `other` are set
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// Whether any flag of `other` is set
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// No flags set
    #[must_use]
    pub const fn is_off(self) -> bool {
        self.0 == 0
    }

    /// Preview started by the user
    #[must_use]
    pub const fn is_test(self) -> bool {
        self.contains(Self::TEST)
    }

    /// Snooze in progress
    #[must_use]
    pub const fn is_snoozing(self) -> bool {
        self.contains(Self::SNOOZE)
    }

    /// Copy with the flags of `other` cleared
    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for PlayMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PlayMode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for PlayMode {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for PlayMode {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}
