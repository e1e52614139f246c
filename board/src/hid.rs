//! USB HID sink wiring [`quillkey_core::config::HidSink`] to the board's USB device-class driver.
//!
//! The USB descriptor tables, endpoint allocation, and the class driver that actually clocks
//! reports out to the host are a separate collaborator this crate does not implement — in a
//! real board this would wrap something like `usb-device` + `usbd-hid` with boot-protocol
//! keyboard, mouse, consumer-control and system-control report descriptors. This module is the
//! seam: it owns per-interface completion state and forwards reports once the previous one on
//! that interface has been acknowledged.

use quillkey_core::config::HidSink;
use quillkey_core::hid::{ConsumerReport, KeyboardReport, MouseReport, SystemControlReport};

/// One bit per USB HID interface, set while a report is in flight and cleared by the interrupt
/// handler that observes the host's IN-token completion.
#[derive(Default)]
pub struct InterfaceReady {
    pub keyboard: bool,
    pub mouse: bool,
    pub consumer: bool,
    pub system_control: bool,
}

/// Queues reports behind per-interface completion synchronization.
///
/// A report for an interface that is still busy is dropped rather than queued: the worker will
/// naturally re-offer keyboard/typing state on its next tick, and mouse/consumer reports are
/// inherently lossy over a live HID link in the same way dropped USB IN tokens are.
pub struct UsbHid {
    ready: InterfaceReady,
}

impl UsbHid {
    pub fn new() -> Self {
        UsbHid {
            ready: InterfaceReady {
                keyboard: true,
                mouse: true,
                consumer: true,
                system_control: true,
            },
        }
    }

    /// Called from the USB endpoint-complete interrupt once the host has acknowledged the report
    /// on `interface`.
    pub fn on_endpoint_complete(&mut self, interface: Interface) {
        match interface {
            Interface::Keyboard => self.ready.keyboard = true,
            Interface::Mouse => self.ready.mouse = true,
            Interface::Consumer => self.ready.consumer = true,
            Interface::SystemControl => self.ready.system_control = true,
        }
    }
}

impl Default for UsbHid {
    fn default() -> Self {
        Self::new()
    }
}

pub enum Interface {
    Keyboard,
    Mouse,
    Consumer,
    SystemControl,
}

impl HidSink for UsbHid {
    fn keyboard(&mut self, report: KeyboardReport) {
        if !self.ready.keyboard {
            return;
        }
        self.ready.keyboard = false;
        let _ = report.to_bytes();
        // TODO(hid-class): hand `report` to the USB keyboard endpoint's IN buffer.
    }

    fn mouse(&mut self, report: MouseReport) {
        if !self.ready.mouse {
            return;
        }
        self.ready.mouse = false;
        let _ = report.to_bytes();
    }

    fn consumer(&mut self, report: ConsumerReport) {
        if !self.ready.consumer {
            return;
        }
        self.ready.consumer = false;
        let _ = report.to_bytes();
    }

    fn system_control(&mut self, report: SystemControlReport) {
        if !self.ready.system_control {
            return;
        }
        self.ready.system_control = false;
        let _ = report.to_bytes();
    }
}
