//! # Power
//! Power mode state machine: mains or battery, and when to put the CPU to sleep.
//!
//! [`Power`] owns the single power mode of the device. It is polled once per
//! scheduler tick, before any other task, and fans every transition out to the
//! registered [`PowerAware`] subscribers.
//!
//! ```text
//!            on battery                 30 s on battery
//!   NORMAL ─────────────▶ LOW_POWER ─────────────────────▶ SUSPEND ─┐
//!     ▲                       │                               │    │ CPU sleep
//!     └───────────────────────┴───────── mains back ──────────┘◀───┘
//! ```

use crate::config::{MAX_POWER_SUBSCRIBERS, SUSPEND_DELAY};
use crate::drivers::{Screen, ScreenId};
use crate::error::{Error, Result};
use crate::rtc::Clock;
use crate::{debug, info, warn};
use core::cell::RefCell;
use embassy_time::Instant;
use heapless::Vec;

/// Power posture of the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMode {
    /// Running on mains
    #[default]
    Normal,
    /// Running on battery, grace window before suspend
    LowPower,
    /// Deep sleep, most peripherals powered down
    Suspend,
}

/// A module that adapts to power mode changes
pub trait PowerAware {
    /// Called once per power mode transition with the new mode
    fn on_power_state_change(&mut self, mode: PowerMode);
}

/// Board functions the power state machine needs
pub trait PowerHal {
    /// Level of the on-battery pin
    fn is_on_battery(&mut self) -> bool;
    /// Put the CPU to sleep until a pin-change or timer interrupt
    fn enter_sleep(&mut self);
    /// Arm the hardware watchdog
    fn watchdog_start(&mut self);
    /// Disarm the hardware watchdog
    fn watchdog_stop(&mut self);
    /// Feed the hardware watchdog
    fn watchdog_feed(&mut self);
}

/// What the rest of the firmware may ask of the power state machine
pub trait PowerControl {
    /// Current power mode
    fn power_mode(&self) -> PowerMode;
    /// Request a power mode, returns the mode actually in effect
    fn set_power_mode(&mut self, mode: PowerMode) -> PowerMode;
    /// Restart the low power to suspend grace timer
    fn reset_suspend_delay(&mut self);
    /// Poll the on-battery pin and run the transitions
    fn detect_power_state(&mut self) -> PowerMode;
    /// Feed the watchdog if it is armed
    fn feed_watchdog(&mut self);
}

/// Power mode state machine
pub struct Power<'a, H: PowerHal> {
    /// Board functions
    hal: H,
    /// Millisecond timer for the suspend grace delay
    clock: &'a dyn Clock,
    /// Status screen, switched to the suspend layout in suspend
    screen: &'a RefCell<dyn Screen + 'a>,
    /// Modules notified on every transition
    subscribers: Vec<&'a RefCell<dyn PowerAware + 'a>, MAX_POWER_SUBSCRIBERS>,
    /// Current mode
    mode: PowerMode,
    /// Start of the suspend grace window
    low_power_start: Instant,
    /// Whether the watchdog should run
    watchdog_enabled: bool,
}

impl<'a, H: PowerHal> Power<'a, H> {
    /// Create the state machine in normal mode
    pub fn new(hal: H, clock: &'a dyn Clock, screen: &'a RefCell<dyn Screen + 'a>) -> Self {
        Self {
            hal,
            clock,
            screen,
            subscribers: Vec::new(),
            mode: PowerMode::Normal,
            low_power_start: clock.now(),
            watchdog_enabled: false,
        }
    }

    /// Register a module for power mode notifications
    pub fn subscribe(&mut self, subscriber: &'a RefCell<dyn PowerAware + 'a>) -> Result<()> {
        self.subscribers.push(subscriber).map_err(|_| {
            warn!("power subscriber list full");
            Error::SubscriberListFull
        })
    }

    /// Reset to normal mode and settle on the actual supply state
    pub fn begin(&mut self) -> PowerMode {
        self.mode = PowerMode::Normal;
        self.reset_suspend_delay();
        self.detect_power_state()
    }

    /// Current power mode
    #[must_use]
    pub const fn power_mode(&self) -> PowerMode {
        self.mode
    }

    /// Whether the device runs on battery
    pub fn is_on_battery_power(&mut self) -> bool {
        self.hal.is_on_battery()
    }

    /// Poll the on-battery pin and run the transitions.
    ///
    /// Returning to mains always lands in normal mode at once. While on
    /// battery, normal drops to low power, low power drops to suspend after
    /// the grace delay, and suspend puts the CPU to sleep.
    pub fn detect_power_state(&mut self) -> PowerMode {
        if self.hal.is_on_battery() {
            match self.mode {
                PowerMode::Normal => return self.set_power_mode(PowerMode::LowPower),
                PowerMode::LowPower => {
                    let elapsed = self.clock.now().saturating_duration_since(self.low_power_start);
                    if elapsed >= SUSPEND_DELAY {
                        return self.set_power_mode(PowerMode::Suspend);
                    }
                }
                PowerMode::Suspend => self.enter_sleep(),
            }
            return self.mode;
        }

        if self.mode == PowerMode::Normal {
            return self.mode;
        }
        self.set_power_mode(PowerMode::Normal)
    }

    /// Request a power mode.
    ///
    /// On mains any request is clamped to normal. A real transition restarts
    /// the grace timer, switches the suspend screen in or out and notifies
    /// every subscriber once.
    pub fn set_power_mode(&mut self, mode: PowerMode) -> PowerMode {
        let previous = self.mode;
        if previous == mode {
            return mode;
        }

        let mode = if self.hal.is_on_battery() { mode } else { PowerMode::Normal };
        if previous == mode {
            return mode;
        }

        self.mode = mode;
        self.reset_suspend_delay();

        {
            let mut screen = self.screen.borrow_mut();
            if mode == PowerMode::Suspend {
                screen.activate(ScreenId::Suspend);
            } else if previous == PowerMode::Suspend {
                screen.exit_screen();
            }
            screen.request_update(mode == PowerMode::Suspend || previous == PowerMode::Suspend);
        }

        for subscriber in &self.subscribers {
            subscriber.borrow_mut().on_power_state_change(mode);
        }

        info!("power mode {:?} -> {:?}", previous, mode);
        mode
    }

    /// Restart the low power to suspend grace timer
    pub fn reset_suspend_delay(&mut self) {
        self.low_power_start = self.clock.now();
    }

    /// Arm the watchdog
    pub fn enable_watchdog(&mut self) {
        self.watchdog_enabled = true;
        self.hal.watchdog_start();
    }

    /// Disarm the watchdog
    pub fn disable_watchdog(&mut self) {
        self.watchdog_enabled = false;
        self.hal.watchdog_stop();
    }

    /// Feed the watchdog if it is armed
    pub fn feed_watchdog(&mut self) {
        if self.watchdog_enabled {
            self.hal.watchdog_feed();
        }
    }

    /// Sleep until the next interrupt, with the watchdog off meanwhile
    fn enter_sleep(&mut self) {
        debug!("entering CPU sleep");
        self.hal.watchdog_stop();
        self.hal.enter_sleep();
        if self.watchdog_enabled {
            self.hal.watchdog_start();
        }
    }

    /// Board functions, for inspection
    pub const fn hal(&self) -> &H {
        &self.hal
    }
}

impl<H: PowerHal> PowerControl for Power<'_, H> {
    fn power_mode(&self) -> PowerMode {
        self.mode
    }

    fn set_power_mode(&mut self, mode: PowerMode) -> PowerMode {
        Power::set_power_mode(self, mode)
    }

    fn reset_suspend_delay(&mut self) {
        Power::reset_suspend_delay(self);
    }

    fn detect_power_state(&mut self) -> PowerMode {
        Power::detect_power_state(self)
    }

    fn feed_watchdog(&mut self) {
        Power::feed_watchdog(self);
    }
}
