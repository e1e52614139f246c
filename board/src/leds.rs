//! Status-LED [`quillkey_core::state::StateObserver`] — maps device states onto an RGB LED.
//!
//! The LED driver (PWM channel setup, colour mixing) is the external collaborator; this module
//! only picks the colour for each state and hands it off.

use quillkey_core::state::{DeviceState, StateObserver};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

const OFF: Rgb = Rgb { r: 0, g: 0, b: 0 };
const BLUE: Rgb = Rgb { r: 0, g: 0, b: 255 };
const GREEN: Rgb = Rgb { r: 0, g: 255, b: 0 };
const YELLOW: Rgb = Rgb { r: 255, g: 200, b: 0 };
const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };
const PURPLE: Rgb = Rgb { r: 160, g: 0, b: 255 };

fn colour_for(state: DeviceState) -> Rgb {
    match state {
        DeviceState::NotConnected => OFF,
        DeviceState::Unpaired => BLUE,
        DeviceState::Pairing => YELLOW,
        DeviceState::Ready => GREEN,
        DeviceState::Disconnected => BLUE,
        DeviceState::Error => RED,
        DeviceState::Drop => PURPLE,
    }
}

/// Records the most recently requested colour for the RTIC idle task to apply to the PWM
/// peripheral; keeping the actual peripheral write out of the observer callback avoids taking a
/// hardware resource lock from inside the packet worker's call stack.
pub struct StatusLed {
    pending: Option<Rgb>,
}

impl StatusLed {
    pub fn new() -> Self {
        StatusLed { pending: None }
    }

    pub fn take_pending(&mut self) -> Option<Rgb> {
        self.pending.take()
    }
}

impl Default for StatusLed {
    fn default() -> Self {
        Self::new()
    }
}

impl StateObserver for StatusLed {
    fn on_state_changed(&mut self, state: DeviceState) {
        self.pending = Some(colour_for(state));
    }
}
