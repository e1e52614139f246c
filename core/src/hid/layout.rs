//! ASCII-to-HID-usage lookup and the non-printing virtual keycode space.
//!
//! A typed character (or a raw virtual keycode from a [`crate::wire::Command::Keycode`]) is one
//! byte wide on the wire. That byte means three different things depending on its range:
//!
//! - `0x00..=0x7F`: an ASCII character, resolved through [`ascii_to_hid`] into a US-layout HID
//!   keyboard usage plus whether Shift needs to be held. [`KeyEntry::altgr`] exists for layouts
//!   with AltGr-shifted characters, but the US table here never sets it.
//! - `0x80..=0x87`: a modifier key pressed on its own, resolved through [`modifier_bit`].
//! - `0x88..=0xFF`: a non-printing key (function keys, arrows, editing keys), resolved through
//!   [`non_printing_keycode`] by subtracting `0x88` — the HID usage is stored verbatim at that
//!   offset.

/// A resolved HID keyboard usage and the modifiers needed to produce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEntry {
    pub keycode: u8,
    pub shift: bool,
    pub altgr: bool,
}

const fn plain(keycode: u8) -> KeyEntry {
    KeyEntry {
        keycode,
        shift: false,
        altgr: false,
    }
}

const fn shifted(keycode: u8) -> KeyEntry {
    KeyEntry {
        keycode,
        shift: true,
        altgr: false,
    }
}

/// HID usage sent in place of a symbol this layout has no direct US-keyboard key for.
pub const ISO_REPLACEMENT: u8 = 0x32;

/// Looks up the HID usage (and required modifiers) for a printable or control ASCII byte.
///
/// Returns `None` for control codes this layout does not assign a key to (e.g. NUL, most of the
/// C0 range below Tab).
pub fn ascii_to_hid(ch: u8) -> Option<KeyEntry> {
    Some(match ch {
        b'a'..=b'z' => plain(0x04 + (ch - b'a')),
        b'A'..=b'Z' => shifted(0x04 + (ch - b'A')),
        b'1'..=b'9' => plain(0x1e + (ch - b'1')),
        b'0' => plain(0x27),
        b'\n' | b'\r' => plain(0x28),
        0x1b => plain(0x29),  // Escape
        0x08 => plain(0x2a),  // Backspace
        b'\t' => plain(0x2b), // Tab
        b' ' => plain(0x2c),
        b'-' => plain(0x2d),
        b'=' => plain(0x2e),
        b'[' => plain(0x2f),
        b']' => plain(0x30),
        b'\\' => plain(0x31),
        b';' => plain(0x33),
        b'\'' => plain(0x34),
        b'`' => plain(0x35),
        b',' => plain(0x36),
        b'.' => plain(0x37),
        b'/' => plain(0x38),
        0x7f => plain(0x4c), // Delete Forward
        b'!' => shifted(0x1e),
        b'@' => shifted(0x1f),
        b'#' => shifted(0x20),
        b'$' => shifted(0x21),
        b'%' => shifted(0x22),
        b'^' => shifted(0x23),
        b'&' => shifted(0x24),
        b'*' => shifted(0x25),
        b'(' => shifted(0x26),
        b')' => shifted(0x27),
        b'_' => shifted(0x2d),
        b'+' => shifted(0x2e),
        b'{' => shifted(0x2f),
        b'}' => shifted(0x30),
        b'|' => shifted(0x31),
        b':' => shifted(0x33),
        b'"' => shifted(0x34),
        b'~' => shifted(0x35),
        b'<' => shifted(0x36),
        b'>' => shifted(0x37),
        b'?' => shifted(0x38),
        _ => return None,
    })
}

/// Returns the HID keyboard modifier bit for a virtual keycode in `0x80..=0x87`.
///
/// Order follows the HID boot keyboard modifier byte: left Ctrl/Shift/Alt/GUI, then right.
pub fn modifier_bit(virtual_code: u8) -> Option<u8> {
    match virtual_code {
        0x80..=0x87 => Some(1 << (virtual_code - 0x80)),
        _ => None,
    }
}

/// Resolves a virtual keycode in `0x88..=0xFF` into a HID keyboard usage.
///
/// Stored verbatim as `virtual_code - 0x88` — the wire encoding already carries the HID usage
/// directly, just offset past the printable/modifier ranges below it.
pub fn non_printing_keycode(virtual_code: u8) -> Option<u8> {
    match virtual_code {
        0x88..=0xff => Some(virtual_code - 0x88),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercase_letters_map_sequentially() {
        assert_eq!(ascii_to_hid(b'a'), Some(plain(0x04)));
        assert_eq!(ascii_to_hid(b'z'), Some(plain(0x1d)));
    }

    #[test]
    fn uppercase_letters_require_shift() {
        assert_eq!(ascii_to_hid(b'A'), Some(shifted(0x04)));
    }

    #[test]
    fn digit_zero_is_not_sequential_with_one_through_nine() {
        assert_eq!(ascii_to_hid(b'0'), Some(plain(0x27)));
        assert_eq!(ascii_to_hid(b'9'), Some(plain(0x26)));
    }

    #[test]
    fn unmapped_control_code_is_none() {
        assert_eq!(ascii_to_hid(0x01), None);
    }

    #[test]
    fn modifier_bits_are_distinct_powers_of_two() {
        let bits: std::vec::Vec<u8> = (0x80..=0x87u8).map(|c| modifier_bit(c).unwrap()).collect();
        for (i, a) in bits.iter().enumerate() {
            for (j, b) in bits.iter().enumerate() {
                if i != j {
                    assert_eq!(a & b, 0);
                }
            }
        }
    }

    #[test]
    fn non_printing_range_is_stored_verbatim_as_offset() {
        assert_eq!(non_printing_keycode(0x88), Some(0x00));
        assert_eq!(non_printing_keycode(0xff), Some(0x77));
    }
}
