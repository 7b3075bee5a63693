//! Host stand-ins for the clock hardware. Everything the firmware would drive
//! is printed through `log`.

use core::convert::Infallible;
use core::sync::atomic::{AtomicBool, Ordering};
use embassy_time::{Duration, Instant};
use embedded_hal::digital::{ErrorType, InputPin};
use heapless::String;
use log::{debug, info, warn};
use neoclock_alarm::color::ColorId;
use neoclock_alarm::config::MAX_LENGTH_ALARM_FILENAME;
use neoclock_alarm::drivers::{Amplifier, AudioCodec, Display, Lamp, Screen, ScreenId, Storage};
use neoclock_alarm::{Clock, DateTime, NightLampSettings, PowerAware, PowerHal, PowerMode};
use smart_leds::RGB8;

/// Input pin backed by a static flag, so the script can flip it
pub struct SimPin(pub &'static AtomicBool);

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.load(Ordering::Relaxed))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.load(Ordering::Relaxed))
    }
}

/// Wall clock running `speedup` times faster than the host
pub struct SimClock {
    start: Instant,
    base_epoch: u32,
    speedup: u64,
}

impl SimClock {
    pub fn new(base_epoch: u32, speedup: u64) -> Self {
        Self {
            start: Instant::now(),
            base_epoch,
            speedup,
        }
    }

    fn elapsed(&self) -> Duration {
        Instant::now().saturating_duration_since(self.start) * u32::try_from(self.speedup).unwrap_or(1)
    }
}

impl Clock for SimClock {
    fn now(&self) -> Instant {
        Instant::from_ticks(0) + self.elapsed()
    }

    fn epoch(&self) -> u32 {
        self.base_epoch
            .saturating_add(u32::try_from(self.elapsed().as_secs()).unwrap_or(u32::MAX))
    }

    fn local_time(&self) -> DateTime {
        DateTime::from_unix(self.epoch())
    }
}

/// Audio decoder that only counts what it is fed
#[derive(Default)]
pub struct SimCodec {
    bytes: usize,
}

impl AudioCodec for SimCodec {
    fn begin(&mut self) {
        info!("codec: on");
    }

    fn end(&mut self) {
        info!("codec: off");
    }

    fn ready_for_data(&mut self) -> bool {
        true
    }

    fn play_data(&mut self, data: &[u8]) {
        self.bytes += data.len();
        if self.bytes % 4096 < data.len() {
            debug!("codec: {} bytes played", self.bytes);
        }
    }

    fn set_volume(&mut self, left: u8, right: u8) {
        debug!("codec: attenuation {}/{}", left, right);
    }

    fn reset_playback(&mut self) {
        self.bytes = 0;
    }

    fn cancel_playback(&mut self) {
        info!("codec: stream cancelled after {} bytes", self.bytes);
    }
}

/// Speaker amplifier
pub struct SimAmp;

impl Amplifier for SimAmp {
    fn begin(&mut self) {
        info!("amp: on");
    }

    fn end(&mut self) {
        info!("amp: off");
    }

    fn enable_outputs(&mut self) {
        info!("amp: unmuted");
    }

    fn disable_outputs(&mut self) {
        info!("amp: muted");
    }

    fn set_fixed_gain(&mut self, db: i8) {
        debug!("amp: fixed gain {} dB", db);
    }

    fn set_max_gain(&mut self, db: u8) {
        debug!("amp: max gain {} dB", db);
    }
}

/// SD card root directory held in memory
pub struct SimStorage {
    files: &'static [(&'static str, &'static [u8])],
    mounted: bool,
    next: usize,
    open: Option<usize>,
    position: usize,
}

impl SimStorage {
    pub const fn new(files: &'static [(&'static str, &'static [u8])]) -> Self {
        Self {
            files,
            mounted: false,
            next: 0,
            open: None,
            position: 0,
        }
    }
}

impl Storage for SimStorage {
    fn begin(&mut self) -> bool {
        self.mounted = true;
        true
    }

    fn open(&mut self, name: &str) -> bool {
        self.open = self.files.iter().position(|(n, _)| n.eq_ignore_ascii_case(name));
        self.position = 0;
        self.open.is_some()
    }

    fn open_next(&mut self) -> bool {
        self.open = (self.next < self.files.len()).then_some(self.next);
        self.next += 1;
        self.position = 0;
        self.open.is_some()
    }

    fn file_name(&self) -> Option<String<MAX_LENGTH_ALARM_FILENAME>> {
        self.open.and_then(|i| String::try_from(self.files[i].0).ok())
    }

    fn is_file(&self) -> bool {
        self.open.is_some()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let Some(i) = self.open else { return 0 };
        let data = self.files[i].1;
        let n = buf.len().min(data.len() - self.position);
        buf[..n].copy_from_slice(&data[self.position..self.position + n]);
        self.position += n;
        n
    }

    fn rewind(&mut self) {
        self.position = 0;
    }

    fn close(&mut self) {
        self.open = None;
    }

    fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn rewind_dir(&mut self) {
        self.next = 0;
    }

    fn is_root_open(&self) -> bool {
        self.mounted
    }

    fn exists(&mut self, name: &str) -> bool {
        self.files.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

/// Night lamp
#[derive(Default)]
pub struct SimLamp {
    active: bool,
}

impl Lamp for SimLamp {
    fn activate(&mut self, settings: &NightLampSettings, test_mode: bool) {
        self.active = true;
        info!("lamp: {:?} {:?} at {}% (test {})", settings.mode, settings.color, settings.brightness, test_mode);
    }

    fn deactivate(&mut self) {
        if self.active {
            info!("lamp: off");
        }
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl PowerAware for SimLamp {
    fn on_power_state_change(&mut self, mode: PowerMode) {
        if mode == PowerMode::Suspend {
            self.deactivate();
        }
        debug!("lamp: power mode {:?}", mode);
    }
}

/// Clock display, only logs the color and brightness it is given
pub struct SimDisplay;

impl PowerAware for SimDisplay {
    fn on_power_state_change(&mut self, mode: PowerMode) {
        match mode {
            PowerMode::Normal => info!("display: full brightness"),
            PowerMode::LowPower => info!("display: dimmed"),
            PowerMode::Suspend => info!("display: off"),
        }
    }
}

impl Display for SimDisplay {
    fn set_color_from_table(&mut self, color: ColorId) {
        debug!("display: color {:?}", color);
    }

    fn set_color_rgb(&mut self, color: RGB8) {
        debug!("display: rgb {} {} {}", color.r, color.g, color.b);
    }

    fn set_brightness(&mut self, brightness: u8) {
        debug!("display: brightness {}", brightness);
    }

    fn update(&mut self) {}

    fn request_clock_update(&mut self, full: bool) {
        debug!("display: clock redraw (full {})", full);
    }
}

/// Status screen
#[derive(Default)]
pub struct SimScreen {
    current: Option<ScreenId>,
}

impl Screen for SimScreen {
    fn activate(&mut self, screen: ScreenId) {
        info!("screen: {:?}", screen);
        self.current = Some(screen);
    }

    fn exit_screen(&mut self) {
        if let Some(screen) = self.current.take() {
            info!("screen: leaving {:?}", screen);
        }
    }

    fn request_update(&mut self, clear: bool) {
        debug!("screen: redraw (clear {})", clear);
    }

    fn set_timeout(&mut self, timeout_ms: u32) {
        debug!("screen: timeout {} ms", timeout_ms);
    }

    fn reset_timeout(&mut self) {}
}

/// Board supply and watchdog. Sleeping blocks the host thread for a moment,
/// the way the CPU would sit until the next wakeup interrupt.
pub struct SimPowerHal {
    pub on_battery: SimPin,
    watchdog: bool,
}

impl SimPowerHal {
    pub const fn new(on_battery: SimPin) -> Self {
        Self {
            on_battery,
            watchdog: false,
        }
    }
}

impl PowerHal for SimPowerHal {
    fn is_on_battery(&mut self) -> bool {
        self.on_battery.is_high().unwrap_or(false)
    }

    fn enter_sleep(&mut self) {
        if self.watchdog {
            warn!("sleeping with the watchdog armed");
        }
        debug!("cpu: sleeping");
        std::thread::sleep(std::time::Duration::from_millis(100));
    }

    fn watchdog_start(&mut self) {
        self.watchdog = true;
    }

    fn watchdog_stop(&mut self) {
        self.watchdog = false;
    }

    fn watchdog_feed(&mut self) {}
}
