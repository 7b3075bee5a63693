//! # Visual effect
//! Animation state of the alarm's visual effect on the clock display.
//!
//! This timer belongs to the alarm engine alone. The night lamp steps its own
//! effects independently even when it runs as part of an alarm.

use crate::color::{ColorId, rainbow};
use crate::config::ClockSettings;
use crate::drivers::Display;
use crate::profile::VisualMode;
use embassy_time::{Duration, Instant};

/// Brightness added to the clock baseline while an effect shows
const BRIGHTNESS_BOOST: u8 = 25;

/// Half-width of the fading triangle wave around the baseline
const FADE_SPAN: u8 = 20;

/// Brightness / hue increment per step
const STEP_SIZE: u8 = 5;

/// Step delay for a mode, shorter for higher speeds, zero disables stepping
#[must_use]
pub fn step_delay(mode: VisualMode, speed: u8) -> Duration {
    let speed = u64::from(speed.max(1));
    match mode {
        VisualMode::None => Duration::from_millis(0),
        VisualMode::Fading | VisualMode::Rainbow => Duration::from_millis(250 / speed),
        VisualMode::Flashing | VisualMode::WhiteFlash | VisualMode::RedFlash => {
            Duration::from_millis(2000 / speed)
        }
    }
}

/// Visual effect animation state
#[derive(Debug, Clone, Copy, Default)]
pub struct VisualEffect {
    /// Brightness for fading, hue for rainbow
    step_value: u8,
    /// Delay between steps, zero when stopped
    step_delay: Duration,
    /// Direction of the triangle wave, phase of the flash effects
    reverse: bool,
    /// Time of the last step, `None` fires the next step at once
    last_step: Option<Instant>,
}

impl VisualEffect {
    /// Arm the effect for `mode`
    pub fn start(&mut self, mode: VisualMode, speed: u8, settings: &ClockSettings) {
        self.reverse = false;
        self.step_value = if mode == VisualMode::Fading {
            settings.clock_brightness
        } else {
            0
        };
        self.last_step = None;
        self.step_delay = step_delay(mode, speed);
    }

    /// Disarm the effect
    pub fn stop(&mut self) {
        self.step_delay = Duration::from_millis(0);
        self.last_step = None;
    }

    /// Whether the effect is armed
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.step_delay.as_ticks() > 0
    }

    /// Current step delay
    #[must_use]
    pub const fn current_step_delay(&self) -> Duration {
        self.step_delay
    }

    /// Advance the animation by one step if its delay has elapsed.
    /// Returns whether a step was drawn.
    pub fn step(
        &mut self,
        now: Instant,
        mode: VisualMode,
        speed: u8,
        settings: &ClockSettings,
        display: &mut dyn Display,
    ) -> bool {
        if mode == VisualMode::None || !self.is_running() {
            return false;
        }
        if let Some(last) = self.last_step
            && now.saturating_duration_since(last) < self.step_delay
        {
            return false;
        }

        let base = settings.clock_brightness;
        let boosted = base.saturating_add(BRIGHTNESS_BOOST);

        match mode {
            VisualMode::Flashing | VisualMode::RedFlash => {
                self.reverse = !self.reverse;
                display.set_brightness(if self.reverse { 0 } else { boosted });
                if mode == VisualMode::RedFlash {
                    display.set_color_from_table(ColorId::Red);
                }
            }
            VisualMode::WhiteFlash => {
                self.reverse = !self.reverse;
                display.set_brightness(boosted);
                display.set_color_from_table(if self.reverse {
                    ColorId::White
                } else {
                    settings.clock_color
                });
            }
            VisualMode::Fading => {
                let low = if base < 25 { 5 } else { base - FADE_SPAN };
                if self.step_value < low {
                    self.reverse = false;
                }
                if self.step_value > base.saturating_add(FADE_SPAN) {
                    self.reverse = true;
                }
                self.step_value = if self.reverse {
                    self.step_value.saturating_sub(STEP_SIZE)
                } else {
                    self.step_value.saturating_add(STEP_SIZE)
                };
                display.set_brightness(self.step_value);
            }
            VisualMode::Rainbow => {
                display.set_brightness(boosted);
                self.step_value = self.step_value.wrapping_add(STEP_SIZE);
                display.set_color_rgb(rainbow(self.step_value));
            }
            VisualMode::None => {}
        }

        display.update();
        self.last_step = Some(now);
        self.step_delay = step_delay(mode, speed);
        true
    }
}
