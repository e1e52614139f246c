//! USB HID report structs and their wire encodings.
//!
//! These mirror the standard boot-protocol report shapes so a board's USB HID class driver can
//! hand the encoded bytes straight to the endpoint with no further translation.

/// A boot-protocol keyboard report: one modifier byte, one reserved byte, six keycode slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyboardReport {
    pub modifiers: u8,
    pub keycodes: [u8; 6],
}

impl KeyboardReport {
    /// The all-zero "nothing pressed" report, sent after each keystroke to release it.
    pub const RELEASED: KeyboardReport = KeyboardReport {
        modifiers: 0,
        keycodes: [0; 6],
    };

    /// A report for a single keycode with the given modifier byte.
    pub fn single(modifiers: u8, keycode: u8) -> Self {
        let mut keycodes = [0u8; 6];
        keycodes[0] = keycode;
        KeyboardReport {
            modifiers,
            keycodes,
        }
    }

    /// Combines a modifier byte with up to 6 non-zero keycodes, packed into free slots in order.
    /// Slots beyond the 6th distinct key are dropped.
    pub fn combined(modifiers: u8, keys: impl Iterator<Item = u8>) -> Self {
        let mut keycodes = [0u8; 6];
        let mut slot = 0;
        for key in keys {
            if slot >= keycodes.len() {
                break;
            }
            keycodes[slot] = key;
            slot += 1;
        }
        KeyboardReport {
            modifiers,
            keycodes,
        }
    }

    /// Encodes this report as the 8-byte boot-protocol wire format.
    pub fn to_bytes(self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[0] = self.modifiers;
        out[2..].copy_from_slice(&self.keycodes);
        out
    }
}

/// A boot-protocol mouse report: button state, relative X/Y, and a wheel delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseReport {
    pub buttons: u8,
    pub dx: i8,
    pub dy: i8,
    pub wheel: i8,
}

impl MouseReport {
    pub const BUTTON_LEFT: u8 = 0x01;
    pub const BUTTON_RIGHT: u8 = 0x02;

    /// Encodes this report as the 4-byte boot-protocol wire format.
    pub fn to_bytes(self) -> [u8; 4] {
        [self.buttons, self.dx as u8, self.dy as u8, self.wheel as u8]
    }
}

/// A consumer-control report: a single 16-bit usage from the Consumer page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConsumerReport {
    pub usage: u16,
}

impl ConsumerReport {
    /// Encodes this report as 2 little-endian bytes. `usage` is zero for a release.
    pub fn to_bytes(self) -> [u8; 2] {
        self.usage.to_le_bytes()
    }
}

/// A system-control report: a single 1-byte usage from the Generic Desktop page (power/sleep/wake).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemControlReport {
    pub usage: u8,
}

impl SystemControlReport {
    pub fn to_bytes(self) -> [u8; 1] {
        [self.usage]
    }
}

/// A small, non-cryptographic PRNG for mouse-jiggle deltas.
///
/// Seeded once from the crypto RNG when jiggling starts, then iterated locally — pulling from the
/// real `CryptoRng` on every tick would be overkill for motion nobody is meant to verify.
pub struct JigglePrng(u32);

impl JigglePrng {
    /// Seeds the generator. A zero seed is replaced with a fixed non-zero value, since xorshift
    /// cannot escape the all-zero state.
    pub fn seed(seed: u32) -> Self {
        JigglePrng(if seed == 0 { 0x9e37_79b9 } else { seed })
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    /// Returns the next pseudo-random mouse delta, each axis in `-3..=3`.
    pub fn next_delta(&mut self) -> (i8, i8) {
        let bits = self.next_u32();
        let dx = ((bits & 0xff) % 7) as i8 - 3;
        let dy = (((bits >> 8) & 0xff) % 7) as i8 - 3;
        (dx, dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_report_places_keycode_after_reserved_byte() {
        let report = KeyboardReport::single(0x02, 0x04);
        let bytes = report.to_bytes();
        assert_eq!(bytes[0], 0x02);
        assert_eq!(bytes[1], 0x00);
        assert_eq!(bytes[2], 0x04);
    }

    #[test]
    fn combined_report_ignores_a_seventh_key() {
        let report = KeyboardReport::combined(0, [0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a].into_iter());
        assert_eq!(report.keycodes, [0x04, 0x05, 0x06, 0x07, 0x08, 0x09]);
    }

    #[test]
    fn released_report_is_all_zero() {
        assert_eq!(KeyboardReport::RELEASED.to_bytes(), [0u8; 8]);
    }

    #[test]
    fn jiggle_deltas_stay_in_range() {
        let mut prng = JigglePrng::seed(12345);
        for _ in 0..1000 {
            let (dx, dy) = prng.next_delta();
            assert!((-3..=3).contains(&dx));
            assert!((-3..=3).contains(&dy));
        }
    }

    #[test]
    fn jiggle_zero_seed_does_not_stall() {
        let mut prng = JigglePrng::seed(0);
        let (dx, dy) = prng.next_delta();
        assert!((-3..=3).contains(&dx));
        assert!((-3..=3).contains(&dy));
    }
}
