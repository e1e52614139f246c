//! Outer framing for every inbound attribute write and every outbound notification.
//!
//! Inbound AUTH and DATA writes share one [`Frame`] shape: `iv(12) || tag(16) || header(4) ||
//! body`. AUTH frames carry the IV/tag fields too, even though there is no session key yet to
//! authenticate them with; they are zero-filled and ignored, which keeps one decoder in front of
//! both packet types instead of special-casing the first one. `packet_number`/`total_packets`
//! are not wire-encoded: reassembly is not implemented (see the module doc on [`crate::wire`]),
//! so the only thing worth encoding is a fixed-size header the peer and device agree on.
//!
//! Outbound notifications use a separate, unframed [`ResponsePacket`].

use crate::crypto::{IV_LEN, TAG_LEN};
use crate::wire::codec::{ByteReader, ByteWriter, Error};

/// Discriminates what a [`Frame`]'s body means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    /// Pairing/reconnect handshake: body is a base64-encoded public key.
    Auth,
    /// Body is AEAD ciphertext that decrypts to a [`crate::wire::inner::Command`].
    Data,
}

impl PacketType {
    fn from_u8(raw: u8) -> Result<Self, Error> {
        match raw {
            0x00 => Ok(PacketType::Auth),
            0x01 => Ok(PacketType::Data),
            _ => Err(Error::Invalid),
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            PacketType::Auth => 0x00,
            PacketType::Data => 0x01,
        }
    }
}

/// The 4-byte header that precedes every frame's body: packet type, the slow-mode flag, and the
/// body length. Slow mode is accepted for wire compatibility but does not relax the
/// [`crate::SLOW_MODE_MILLIS`] inter-character floor either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub packet_type: PacketType,
    pub slow_mode: bool,
    pub payload_len: u16,
}

impl Header {
    /// Encoded size of a header, in bytes.
    pub const LEN: usize = 4;

    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, Error> {
        let packet_type = PacketType::from_u8(reader.read_u8()?)?;
        let slow_mode = reader.read_u8()? != 0;
        let payload_len = reader.read_u16_le()?;
        Ok(Header {
            packet_type,
            slow_mode,
            payload_len,
        })
    }

    fn encode(&self, writer: &mut ByteWriter<'_>) -> Result<(), Error> {
        writer.write_u8(self.packet_type.to_u8())?;
        writer.write_u8(self.slow_mode as u8)?;
        writer.write_u16_le(self.payload_len)
    }
}

/// A fully-framed, not-yet-decrypted record: the unit of transfer over the attribute protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub iv: [u8; IV_LEN],
    pub tag: [u8; TAG_LEN],
    pub packet_type: PacketType,
    pub slow_mode: bool,
    pub body: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Parses a frame out of a raw attribute write. Rejects writes shorter than
    /// [`crate::MIN_ATTRIBUTE_LEN`] before touching the rest of the decode.
    pub fn decode(bytes: &'a [u8]) -> Result<Self, Error> {
        if bytes.len() < crate::MIN_ATTRIBUTE_LEN {
            return Err(Error::Eof);
        }
        let mut reader = ByteReader::new(bytes);
        let iv = reader.read_array::<IV_LEN>()?;
        let tag = reader.read_array::<TAG_LEN>()?;
        let header = Header::decode(&mut reader)?;
        let body = reader.read_slice(header.payload_len as usize)?;
        Ok(Frame {
            iv,
            tag,
            packet_type: header.packet_type,
            slow_mode: header.slow_mode,
            body,
        })
    }

    /// Writes a frame into `writer`.
    pub fn encode(
        iv: &[u8; IV_LEN],
        tag: &[u8; TAG_LEN],
        packet_type: PacketType,
        slow_mode: bool,
        body: &[u8],
        writer: &mut ByteWriter<'_>,
    ) -> Result<(), Error> {
        writer.write_slice(iv)?;
        writer.write_slice(tag)?;
        Header {
            packet_type,
            slow_mode,
            payload_len: body.len() as u16,
        }
        .encode(writer)?;
        writer.write_slice(body)
    }
}

/// The kind of outbound notification, per §3's Response Packet entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    /// Entering `Ready`: carries a fresh [`crate::session::SecureSession::session_salt`].
    Challenge,
    /// An AUTH named a fingerprint with no enrollment; state moves to `Unpaired`.
    PeerUnknown,
    /// Reserved for protocol completeness; current flows fold the ready acknowledgement into
    /// `Challenge` rather than emitting this separately.
    Ready,
    /// A recoverable fault (bad AUTH, decode failure, AEAD failure); state moves to `Drop`.
    Drop,
}

impl ResponseType {
    fn to_u8(self) -> u8 {
        match self {
            ResponseType::Challenge => 0x00,
            ResponseType::PeerUnknown => 0x01,
            ResponseType::Ready => 0x02,
            ResponseType::Drop => 0x03,
        }
    }

    fn from_u8(raw: u8) -> Result<Self, Error> {
        match raw {
            0x00 => Ok(ResponseType::Challenge),
            0x01 => Ok(ResponseType::PeerUnknown),
            0x02 => Ok(ResponseType::Ready),
            0x03 => Ok(ResponseType::Drop),
            _ => Err(Error::Invalid),
        }
    }
}

/// A device-to-peer notification: a response type plus an optional payload (the session salt, for
/// `Challenge`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponsePacket {
    pub response_type: ResponseType,
    pub challenge_data: Option<[u8; 32]>,
}

impl ResponsePacket {
    /// A bare notification with no payload.
    pub fn bare(response_type: ResponseType) -> Self {
        ResponsePacket {
            response_type,
            challenge_data: None,
        }
    }

    /// A `Challenge` notification carrying the session salt.
    pub fn challenge(salt: [u8; 32]) -> Self {
        ResponsePacket {
            response_type: ResponseType::Challenge,
            challenge_data: Some(salt),
        }
    }

    pub fn encode(&self, writer: &mut ByteWriter<'_>) -> Result<(), Error> {
        writer.write_u8(self.response_type.to_u8())?;
        match self.challenge_data {
            Some(salt) => {
                writer.write_u8(salt.len() as u8)?;
                writer.write_slice(&salt)
            }
            None => writer.write_u8(0),
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        let mut reader = ByteReader::new(bytes);
        let response_type = ResponseType::from_u8(reader.read_u8()?)?;
        let len = reader.read_u8()? as usize;
        let challenge_data = if len == 0 {
            None
        } else if len == 32 {
            Some(reader.read_array::<32>()?)
        } else {
            return Err(Error::Invalid);
        };
        Ok(ResponsePacket {
            response_type,
            challenge_data,
        })
    }
}

impl From<crate::error::CoreError> for ResponsePacket {
    fn from(e: crate::error::CoreError) -> Self {
        use crate::error::CoreError;
        match e {
            CoreError::PeerUnknown => ResponsePacket::bare(ResponseType::PeerUnknown),
            _ => ResponsePacket::bare(ResponseType::Drop),
        }
    }
}
