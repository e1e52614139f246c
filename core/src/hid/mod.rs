//! Translating decoded commands into USB HID reports.

pub mod layout;
pub mod report;

pub use self::layout::{ascii_to_hid, modifier_bit, non_printing_keycode, KeyEntry, ISO_REPLACEMENT};
pub use self::report::{ConsumerReport, JigglePrng, KeyboardReport, MouseReport, SystemControlReport};

use crate::wire::ClickAction;

const MODIFIER_LEFT_SHIFT: u8 = 0x02;
const MODIFIER_RIGHT_ALT: u8 = 0x40;

/// Builds the key-down report for one virtual keycode byte, resolving it as ASCII, a bare
/// modifier, or a non-printing key depending on which range it falls in.
///
/// Returns `None` for ASCII control codes this layout assigns no key to. Used by the keyboard
/// worker, which types one character at a time.
pub fn keyboard_press(virtual_code: u8) -> Option<KeyboardReport> {
    if let Some(entry) = ascii_to_hid(virtual_code) {
        let mut modifiers = 0;
        if entry.shift {
            modifiers |= MODIFIER_LEFT_SHIFT;
        }
        if entry.altgr {
            modifiers |= MODIFIER_RIGHT_ALT;
        }
        return Some(KeyboardReport::single(modifiers, entry.keycode));
    }
    if let Some(bit) = modifier_bit(virtual_code) {
        return Some(KeyboardReport {
            modifiers: bit,
            keycodes: [0; 6],
        });
    }
    non_printing_keycode(virtual_code).map(|keycode| KeyboardReport::single(0, keycode))
}

/// Builds one combined keyboard report from up to 6 encoded virtual keycode bytes (§4.6): ASCII
/// slots contribute a resolved HID keycode plus any shift/AltGr modifier, bare-modifier slots
/// (`0x80-0x87`) only set a modifier bit and do not consume a key slot, and non-printing slots
/// (`0x88-0xFF`) are stored verbatim as `k - 0x88`. Unresolvable bytes are skipped.
pub fn encode_keycode_report(encoded: &[u8; 6]) -> KeyboardReport {
    let mut modifiers = 0u8;
    let mut keys = [0u8; 6];
    let mut slot = 0;
    for &byte in encoded {
        if let Some(entry) = ascii_to_hid(byte) {
            if entry.shift {
                modifiers |= MODIFIER_LEFT_SHIFT;
            }
            if entry.altgr {
                modifiers |= MODIFIER_RIGHT_ALT;
            }
            if slot < keys.len() {
                keys[slot] = entry.keycode;
                slot += 1;
            }
        } else if let Some(bit) = modifier_bit(byte) {
            modifiers |= bit;
        } else if let Some(keycode) = non_printing_keycode(byte) {
            if slot < keys.len() {
                keys[slot] = keycode;
                slot += 1;
            }
        }
    }
    KeyboardReport {
        modifiers,
        keycodes: keys,
    }
}

/// Tracks which mouse buttons are currently held, so a tri-valued [`ClickAction`] ("press if not
/// already pressed", "release if currently pressed") can be applied statelessly per report.
#[derive(Debug, Default, Clone, Copy)]
pub struct MouseButtonState {
    left: bool,
    right: bool,
}

impl MouseButtonState {
    /// Applies the left/right click actions, updating internal state, and returns the resulting
    /// HID button bitmask.
    pub fn apply(&mut self, l_click: ClickAction, r_click: ClickAction) -> u8 {
        apply_one(&mut self.left, l_click);
        apply_one(&mut self.right, r_click);
        let mut buttons = 0;
        if self.left {
            buttons |= MouseReport::BUTTON_LEFT;
        }
        if self.right {
            buttons |= MouseReport::BUTTON_RIGHT;
        }
        buttons
    }
}

fn apply_one(pressed: &mut bool, action: ClickAction) {
    match action {
        ClickAction::NoOp => {}
        ClickAction::Press => *pressed = true,
        ClickAction::Release => *pressed = false,
    }
}

/// Builds one frame of a mouse-move report, clamping the move and wheel deltas into the
/// boot-protocol's signed-byte range.
pub fn mouse_frame_report(dx: i32, dy: i32, wheel: i32, buttons: u8) -> MouseReport {
    MouseReport {
        buttons,
        dx: clamp_i8(dx),
        dy: clamp_i8(dy),
        wheel: clamp_i8(wheel),
    }
}

fn clamp_i8(value: i32) -> i8 {
    value.clamp(i8::MIN as i32, i8::MAX as i32) as i8
}

/// Builds a consumer-control report. A release is reported as usage `0x0000`, per the Consumer
/// page convention for "no control selected".
pub fn consumer_report(usage: u16, pressed: bool) -> ConsumerReport {
    ConsumerReport {
        usage: if pressed { usage } else { 0 },
    }
}

/// Builds a system-control report.
pub fn system_control_report(usage: u8) -> SystemControlReport {
    SystemControlReport { usage }
}
