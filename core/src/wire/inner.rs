//! The decrypted command payload carried inside a DATA packet's ciphertext.
//!
//! One byte of discriminant, then a command-specific body. Kept as a plain enum rather than
//! `BytesOr`-style lazy decoding — every command here is small and decoded once, immediately
//! before being pushed onto the pipeline.

use crate::wire::codec::{ByteReader, ByteWriter, Error};
use crate::MAX_DATA_LEN;

const TAG_KEYBOARD: u8 = 0x01;
const TAG_KEYCODE: u8 = 0x02;
const TAG_MOUSE: u8 = 0x03;
const TAG_CONSUMER_CONTROL: u8 = 0x04;
const TAG_SYSTEM_CONTROL: u8 = 0x05;
const TAG_MOUSE_JIGGLE: u8 = 0x06;
const TAG_RENAME: u8 = 0x07;

/// A single virtual keycode slot with no key pressed, used to pad [`Command::Keycode`]'s array.
pub const KEYCODE_EMPTY: u8 = 0x00;

/// Maximum relative-move frames one `mouse` command may batch.
pub const MAX_MOUSE_FRAMES: usize = 16;

/// Maximum consumer-control usage codes one `consumer_control` command may batch.
pub const MAX_CONSUMER_CODES: usize = 32;

/// Maximum length of a `rename` command's new device name.
pub const MAX_RENAME_LEN: usize = crate::keystore::MAX_DEVICE_NAME_LEN;

/// Tri-valued button action carried alongside a mouse move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    /// Leave the button's current state alone.
    NoOp,
    /// Press the button, if it is not already pressed.
    Press,
    /// Release the button, if it is currently pressed.
    Release,
}

impl ClickAction {
    fn from_u8(raw: u8) -> Result<Self, Error> {
        match raw {
            0 => Ok(ClickAction::NoOp),
            1 => Ok(ClickAction::Press),
            2 => Ok(ClickAction::Release),
            _ => Err(Error::Invalid),
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            ClickAction::NoOp => 0,
            ClickAction::Press => 1,
            ClickAction::Release => 2,
        }
    }
}

/// A single decrypted command, as read out of a DATA packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Type a string of printable characters via the keyboard HID interface.
    Keyboard(heapless::String<MAX_DATA_LEN>),
    /// Send one combined keyboard report built from up to 6 encoded virtual keycodes (§4.6):
    /// `0x00-0x7F` indexes the ASCII layout table, `0x80-0x87` sets a bare modifier bit, and
    /// `0x88-0xFF` is a non-printing keycode. Unused slots are [`KEYCODE_EMPTY`].
    Keycode([u8; 6]),
    /// A batch of relative mouse moves, with a click action and wheel delta applied in the report
    /// that encloses the move (the first frame of the batch).
    Mouse {
        frames: heapless::Vec<(i32, i32), MAX_MOUSE_FRAMES>,
        l_click: ClickAction,
        r_click: ClickAction,
        wheel: i32,
    },
    /// Press, then (10 ms later) release, each 16-bit Consumer-page usage code in order.
    ConsumerControl(heapless::Vec<u16, MAX_CONSUMER_CODES>),
    /// Send a system-control usage, 0..=3, from the Generic Desktop page (sleep/wake/power).
    SystemControl(u8),
    /// Enable or disable the idle mouse-jiggle behavior.
    MouseJiggle(bool),
    /// Set the advertised device name.
    Rename(heapless::String<MAX_RENAME_LEN>),
}

impl Command {
    /// Decodes a command from a decrypted DATA payload.
    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        let mut reader = ByteReader::new(bytes);
        let tag = reader.read_u8()?;
        match tag {
            TAG_KEYBOARD => {
                let text = str_from_rest::<MAX_DATA_LEN>(&mut reader)?;
                Ok(Command::Keyboard(text))
            }
            TAG_KEYCODE => {
                let encoded = reader.read_array::<6>()?;
                Ok(Command::Keycode(encoded))
            }
            TAG_MOUSE => {
                let num_frames = reader.read_u8()? as usize;
                if num_frames > MAX_MOUSE_FRAMES {
                    return Err(Error::Invalid);
                }
                let mut frames = heapless::Vec::new();
                for _ in 0..num_frames {
                    let x = reader.read_i32_le()?;
                    let y = reader.read_i32_le()?;
                    frames.push((x, y)).map_err(|_| Error::Invalid)?;
                }
                let l_click = ClickAction::from_u8(reader.read_u8()?)?;
                let r_click = ClickAction::from_u8(reader.read_u8()?)?;
                let wheel = reader.read_i32_le()?;
                Ok(Command::Mouse {
                    frames,
                    l_click,
                    r_click,
                    wheel,
                })
            }
            TAG_CONSUMER_CONTROL => {
                let count = reader.read_u8()? as usize;
                if count > MAX_CONSUMER_CODES {
                    return Err(Error::Invalid);
                }
                let mut codes = heapless::Vec::new();
                for _ in 0..count {
                    codes.push(reader.read_u16_le()?).map_err(|_| Error::Invalid)?;
                }
                Ok(Command::ConsumerControl(codes))
            }
            TAG_SYSTEM_CONTROL => {
                let usage = reader.read_u8()?;
                if usage > 3 {
                    return Err(Error::Invalid);
                }
                Ok(Command::SystemControl(usage))
            }
            TAG_MOUSE_JIGGLE => {
                let enabled = reader.read_u8()? != 0;
                Ok(Command::MouseJiggle(enabled))
            }
            TAG_RENAME => {
                let name = str_from_rest::<MAX_RENAME_LEN>(&mut reader)?;
                Ok(Command::Rename(name))
            }
            _ => Err(Error::Invalid),
        }
    }

    /// Encodes this command, for tests and for the peer-facing loopback path.
    pub fn encode(&self, writer: &mut ByteWriter<'_>) -> Result<(), Error> {
        match self {
            Command::Keyboard(text) => {
                writer.write_u8(TAG_KEYBOARD)?;
                writer.write_slice(text.as_bytes())
            }
            Command::Keycode(encoded) => {
                writer.write_u8(TAG_KEYCODE)?;
                writer.write_slice(encoded)
            }
            Command::Mouse {
                frames,
                l_click,
                r_click,
                wheel,
            } => {
                writer.write_u8(TAG_MOUSE)?;
                writer.write_u8(frames.len() as u8)?;
                for (x, y) in frames {
                    writer.write_i32_le(*x)?;
                    writer.write_i32_le(*y)?;
                }
                writer.write_u8(l_click.to_u8())?;
                writer.write_u8(r_click.to_u8())?;
                writer.write_i32_le(*wheel)
            }
            Command::ConsumerControl(codes) => {
                writer.write_u8(TAG_CONSUMER_CONTROL)?;
                writer.write_u8(codes.len() as u8)?;
                for code in codes {
                    writer.write_u16_le(*code)?;
                }
                Ok(())
            }
            Command::SystemControl(usage) => {
                writer.write_u8(TAG_SYSTEM_CONTROL)?;
                writer.write_u8(*usage)
            }
            Command::MouseJiggle(enabled) => {
                writer.write_u8(TAG_MOUSE_JIGGLE)?;
                writer.write_u8(*enabled as u8)
            }
            Command::Rename(name) => {
                writer.write_u8(TAG_RENAME)?;
                writer.write_slice(name.as_bytes())
            }
        }
    }
}

fn str_from_rest<const N: usize>(reader: &mut ByteReader<'_>) -> Result<heapless::String<N>, Error> {
    let rest = reader.read_rest();
    let s = core::str::from_utf8(rest).map_err(|_| Error::Invalid)?;
    let mut out = heapless::String::new();
    out.push_str(s).map_err(|_| Error::Invalid)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(cmd: Command) {
        let mut buf = [0u8; MAX_DATA_LEN + 1];
        let mut writer = ByteWriter::new(&mut buf);
        cmd.encode(&mut writer).unwrap();
        let written = MAX_DATA_LEN + 1 - writer.space_left();
        assert_eq!(Command::decode(&buf[..written]).unwrap(), cmd);
    }

    #[test]
    fn keyboard_round_trips() {
        let mut s = heapless::String::new();
        s.push_str("hello world").unwrap();
        round_trip(Command::Keyboard(s));
    }

    #[test]
    fn keycode_round_trips_with_modifier_and_key() {
        let mut encoded = [KEYCODE_EMPTY; 6];
        encoded[0] = 0x82;
        encoded[1] = 0x04;
        round_trip(Command::Keycode(encoded));
    }

    #[test]
    fn mouse_round_trips_with_multiple_frames() {
        let mut frames = heapless::Vec::new();
        frames.push((-5, 3)).unwrap();
        frames.push((10, -10)).unwrap();
        round_trip(Command::Mouse {
            frames,
            l_click: ClickAction::Press,
            r_click: ClickAction::NoOp,
            wheel: -2,
        });
    }

    #[test]
    fn mouse_rejects_frame_count_over_capacity() {
        let mut buf = [0u8; 4];
        buf[0] = TAG_MOUSE;
        buf[1] = (MAX_MOUSE_FRAMES + 1) as u8;
        assert_eq!(Command::decode(&buf), Err(Error::Invalid));
    }

    #[test]
    fn consumer_control_round_trips_with_multiple_codes() {
        let mut codes = heapless::Vec::new();
        codes.push(0x00e9).unwrap();
        codes.push(0x00ea).unwrap();
        round_trip(Command::ConsumerControl(codes));
    }

    #[test]
    fn system_control_rejects_usage_out_of_range() {
        assert_eq!(Command::decode(&[TAG_SYSTEM_CONTROL, 4]), Err(Error::Invalid));
    }

    #[test]
    fn rename_round_trips() {
        let mut name = heapless::String::new();
        name.push_str("New Name").unwrap();
        round_trip(Command::Rename(name));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert_eq!(Command::decode(&[0xff]), Err(Error::Invalid));
    }

    #[test]
    fn empty_buffer_is_eof() {
        assert_eq!(Command::decode(&[]), Err(Error::Eof));
    }
}
