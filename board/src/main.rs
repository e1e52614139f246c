#![no_std]
#![no_main]
#![warn(rust_2018_idioms)]

#[cfg(feature = "defmt-log")]
use panic_probe as _;

mod clock;
mod flash_store;
mod gatt;
mod hid;
mod leds;
mod rng;

use gatt::GattNotifier;
use hid::UsbHid;
use leds::StatusLed;
use quillkey_core::config::Board;
use quillkey_core::control::ButtonEvent;
use quillkey_core::time::Instant;
use quillkey_core::worker::PacketWorker;

/// Ties the board's concrete peripherals to the types `quillkey-core` asks for.
pub enum AppBoard {}

impl Board for AppBoard {
    type Store = flash_store::FlashStore;
    type Clock = clock::RtcClock;
    type Rng = rng::HwRng;
    type Hid = UsbHid;
    type Notifier = GattNotifier;
    type StateObserver = StatusLed;
}

#[rtic::app(device = nrf52840_hal::pac, peripherals = true)]
mod app {
    use super::*;
    use nrf52840_hal::gpio::{Input, Pin, PullUp};

    #[shared]
    struct Shared {
        worker: PacketWorker<AppBoard>,
        clock: clock::RtcClock,
    }

    #[local]
    struct Local {
        button: Pin<Input<PullUp>>,
    }

    #[init]
    fn init(cx: init::Context) -> (Shared, Local) {
        let device = cx.device;

        device.RTC1.prescaler.write(|w| unsafe { w.bits(31) });
        device.RTC1.tasks_start.write(|w| unsafe { w.bits(1) });

        let clock = clock::RtcClock::new(device.RTC1);
        let store = flash_store::FlashStore::new();
        let hwrng = rng::HwRng::new(device.RNG);
        let hid = UsbHid::new();
        let notifier = GattNotifier::new();
        let leds = StatusLed::new();

        let p0 = nrf52840_hal::gpio::p0::Parts::new(device.P0);
        let button = p0.p0_11.into_pullup_input().degrade();

        let now = Instant::from_millis(0);
        let worker = PacketWorker::new(store, hwrng, hid, notifier, leds, now);

        (Shared { worker, clock }, Local { button })
    }

    /// Periodic tick, scheduled at a fixed cadence from the RTC1 compare interrupt. Drains the
    /// command pipeline, paces typing/consumer/jiggle output, and advances auto-recovery.
    #[task(binds = RTC1, shared = [worker, clock])]
    fn on_rtc_tick(cx: on_rtc_tick::Context) {
        let (mut worker, mut clock) = (cx.shared.worker, cx.shared.clock);
        let now = clock.lock(|clock| clock.now());
        worker.lock(|worker| {
            worker.tick_typing(now);
            worker.tick_consumer(now);
            worker.tick_jiggle(now);
            let _ = worker.tick_state(now);
            while worker.process_one_command().unwrap_or(false) {}
        });
    }

    /// GPIOTE interrupt for the pairing button. Debouncing happens in hardware/GPIOTE config,
    /// not here; this handler only distinguishes click from hold based on how long the pin was
    /// asserted, which the GPIOTE PORT event plus a software timestamp provide.
    #[task(binds = GPIOTE, shared = [worker, clock], local = [button])]
    fn on_button(cx: on_button::Context) {
        let (mut worker, mut clock) = (cx.shared.worker, cx.shared.clock);
        let now = clock.lock(|clock| clock.now());
        let event = if cx.local.button.is_low().unwrap_or(false) {
            ButtonEvent::Hold
        } else {
            ButtonEvent::Click
        };
        worker.lock(|worker| worker.on_button(event, now));
    }

    /// BLE GATT attribute write on the writeable characteristic. The GATT server itself (not
    /// implemented here) calls into this once per inbound write, handing over the raw bytes.
    #[task(shared = [worker, clock], capacity = 4)]
    fn on_attribute_write(cx: on_attribute_write::Context, bytes: heapless::Vec<u8, 256>) {
        let (mut worker, mut clock) = (cx.shared.worker, cx.shared.clock);
        let now = clock.lock(|clock| clock.now());
        worker.lock(|worker| {
            let _ = worker.handle_attribute_write(&bytes, now);
        });
    }

    #[idle]
    fn idle(_cx: idle::Context) -> ! {
        loop {
            cortex_m::asm::wfi();
        }
    }
}
