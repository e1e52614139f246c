//! Wire framing and command encoding: the layer between raw attribute bytes and [`crate::session`].

pub mod codec;
pub mod inner;
pub mod packet;

pub use self::inner::{ClickAction, Command, MAX_CONSUMER_CODES, MAX_MOUSE_FRAMES};
pub use self::packet::{Frame, Header, PacketType, ResponsePacket, ResponseType};
