//! Host simulator: runs the alarm engine and the power state machine against
//! logging fakes, driven by a short scripted morning.
//!
//! Run with `cargo run --features simulator --bin simulator`, set `RUST_LOG=debug`
//! for the display and codec traffic.

mod devices;

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};
use devices::{SimAmp, SimClock, SimCodec, SimDisplay, SimLamp, SimPin, SimPowerHal, SimScreen, SimStorage};
use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Timer;
use log::{info, warn};
use neoclock_alarm::config::{LampMode, SELECT_FILE_PLAY_DELAY};
use neoclock_alarm::irq::IrqFlag;
use neoclock_alarm::{
    Alarm, AlarmProfile, AlarmTime, AudioOutput, Clock, ClockSettings, Collaborators, PlayMode, Power, PowerAware,
    PowerMode, ProfileSlots, Scheduler, SdCard, Task, VisualMode,
};
use static_cell::StaticCell;

type SimAudio = AudioOutput<SimCodec, SimAmp>;
type SimPower = Power<'static, SimPowerHal>;
type SimAlarm = Alarm<'static, SimCodec, SimAmp, SimStorage, SimPin, SimPin>;

/// Monday 2024-06-03 06:59:50 UTC
const START_EPOCH: u32 = 1_717_397_990;
/// Simulated seconds per host second
const SPEEDUP: u64 = 10;

/// Root directory of the simulated card
static CARD_FILES: [(&str, &[u8]); 3] = [
    ("README.TXT", b"alarm sounds go here"),
    ("WAKEUP.MP3", include_bytes!("../../../assets/alarm_fallback.mp3")),
    ("BIRDS.MP3", include_bytes!("../../../assets/alarm_fallback.mp3")),
];

/// Supply pin, high on battery
static ON_BATTERY: AtomicBool = AtomicBool::new(false);
/// Card-detect pin, low while a card is inserted
static CARD_DETECT: AtomicBool = AtomicBool::new(false);
/// Alarm slide switch, high when on
static ALARM_SWITCH: AtomicBool = AtomicBool::new(true);
/// Snooze button interrupt
static KEYPAD_IRQ: IrqFlag = IrqFlag::new();

/// Menu actions the script asks for
#[derive(Debug, Clone, Copy)]
enum SimEvent {
    /// Select the next sound file, as the file menu does
    NextFile,
    /// Preview the active profile after the selection delay
    Preview,
    /// Stop the simulation
    Quit,
}

static EVENTS: Channel<CriticalSectionRawMutex, SimEvent, 4> = Channel::new();

/// Slot 0 rings at 07:00 every day
fn demo_profiles() -> ProfileSlots {
    let mut morning = AlarmProfile::default();
    morning.time = AlarmTime::new(7, 0);
    morning.dow = 0x7F;
    morning.snooze_delay = 1;
    morning.gradual = true;
    morning.visual_mode = VisualMode::Rainbow;
    morning.lamp.mode = LampMode::Fading;
    if morning.filename.push_str("WAKEUP.MP3").is_err() {
        warn!("file name too long");
    }

    let mut weekend = morning.clone();
    weekend.time = AlarmTime::new(9, 30);
    weekend.dow = 0b0100_0001;
    weekend.visual_mode = VisualMode::WhiteFlash;

    ProfileSlots::new([morning, weekend])
}

/// The snooze button snoozes a ringing alarm, and stops a snoozed one or a preview
fn on_keypress(alarm: &mut SimAlarm) {
    if alarm.play_mode().is_off() {
        return;
    }
    if alarm.is_snoozing() || alarm.play_mode().is_test() {
        alarm.stop();
    } else {
        alarm.snooze();
        info!("snoozing, {} s left", alarm.snooze_time_remaining());
    }
}

#[embassy_executor::task]
async fn script() {
    info!("script: waiting for the 07:00 alarm");
    Timer::after_secs(4).await;

    info!("script: snooze button");
    KEYPAD_IRQ.raise();
    Timer::after_secs(2).await;

    info!("script: card ejected");
    CARD_DETECT.store(true, Ordering::Relaxed);
    // one simulated minute of snooze, then the built-in sound
    Timer::after_secs(6).await;

    info!("script: card inserted");
    CARD_DETECT.store(false, Ordering::Relaxed);
    Timer::after_secs(2).await;

    info!("script: snooze button twice");
    KEYPAD_IRQ.raise();
    Timer::after_secs(1).await;
    KEYPAD_IRQ.raise();
    Timer::after_secs(1).await;

    info!("script: browsing sound files");
    EVENTS.send(SimEvent::NextFile).await;
    EVENTS.send(SimEvent::Preview).await;
    Timer::after_secs(2).await;
    KEYPAD_IRQ.raise();

    info!("script: mains unplugged");
    ON_BATTERY.store(true, Ordering::Relaxed);
    Timer::after_secs(5).await;

    info!("script: mains plugged in");
    ON_BATTERY.store(false, Ordering::Relaxed);
    Timer::after_secs(1).await;

    EVENTS.send(SimEvent::Quit).await;
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("simulator start");

    static CLOCK: StaticCell<SimClock> = StaticCell::new();
    static SCREEN: StaticCell<RefCell<SimScreen>> = StaticCell::new();
    static DISPLAY: StaticCell<RefCell<SimDisplay>> = StaticCell::new();
    static LAMP: StaticCell<RefCell<SimLamp>> = StaticCell::new();
    static STORE: StaticCell<RefCell<ProfileSlots>> = StaticCell::new();
    static AUDIO: StaticCell<RefCell<SimAudio>> = StaticCell::new();
    static POWER: StaticCell<RefCell<SimPower>> = StaticCell::new();
    static ALARM: StaticCell<RefCell<SimAlarm>> = StaticCell::new();

    let clock: &'static SimClock = CLOCK.init(SimClock::new(START_EPOCH, SPEEDUP));
    let screen: &'static RefCell<SimScreen> = SCREEN.init(RefCell::new(SimScreen::default()));
    let display: &'static RefCell<SimDisplay> = DISPLAY.init(RefCell::new(SimDisplay));
    let lamp: &'static RefCell<SimLamp> = LAMP.init(RefCell::new(SimLamp::default()));
    let store: &'static RefCell<ProfileSlots> = STORE.init(RefCell::new(demo_profiles()));
    let audio: &'static RefCell<SimAudio> = AUDIO.init(RefCell::new(AudioOutput::new(SimCodec::default(), SimAmp)));

    let power: &'static RefCell<SimPower> = POWER.init(RefCell::new(Power::new(
        SimPowerHal::new(SimPin(&ON_BATTERY)),
        clock,
        screen,
    )));
    {
        let mut power = power.borrow_mut();
        let subscribers: [&'static RefCell<dyn PowerAware>; 3] = [audio, display, lamp];
        for subscriber in subscribers {
            if let Err(e) = power.subscribe(subscriber) {
                warn!("power subscriber dropped: {}", e);
            }
        }
        power.enable_watchdog();
        info!("power mode {:?}", power.begin());
    }

    let io = Collaborators {
        power,
        display,
        lamp,
        screen,
        clock,
        store,
    };
    let settings = ClockSettings {
        alarm_on: [true, true],
        ..ClockSettings::default()
    };
    let sd = SdCard::new(SimStorage::new(&CARD_FILES), SimPin(&CARD_DETECT));
    let alarm: &'static RefCell<SimAlarm> = ALARM.init(RefCell::new(Alarm::new(
        audio,
        sd,
        SimPin(&ALARM_SWITCH),
        io,
        settings,
    )));
    {
        let mut alarm = alarm.borrow_mut();
        alarm.begin();
        if let Err(e) = alarm.load_profile(0) {
            warn!("{}", e);
        }
        let now = clock.local_time();
        if let Some(id) = alarm.next_alarm_id(&now, true) {
            info!(
                "next alarm: profile {} in {:?} min, \"{}\"",
                id,
                alarm.next_alarm_offset(id, &now, true),
                alarm.profile().greeting()
            );
        }
    }

    let tasks: [&'static RefCell<dyn Task>; 1] = [alarm];
    let scheduler = Scheduler::new(power, tasks);

    spawner.spawn(script()).unwrap();

    let mut last_mode = PowerMode::Normal;
    loop {
        if KEYPAD_IRQ.take() {
            on_keypress(&mut alarm.borrow_mut());
        }

        if let Ok(event) = EVENTS.try_receive() {
            let mut alarm = alarm.borrow_mut();
            match event {
                SimEvent::NextFile => match alarm.open_next_file() {
                    Ok(()) => info!("selected {}", alarm.profile().filename.as_str()),
                    Err(e) => warn!("{}", e),
                },
                SimEvent::Preview => alarm.play_delayed(PlayMode::TEST_PROFILE, SELECT_FILE_PLAY_DELAY),
                SimEvent::Quit => {
                    alarm.end();
                    info!("simulator done");
                    std::process::exit(0);
                }
            }
        }

        let mode = scheduler.tick();
        if mode != last_mode {
            info!("main loop now in {:?}", mode);
            last_mode = mode;
        }

        Timer::after_millis(1).await;
    }
}
