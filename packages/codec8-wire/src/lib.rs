//! # codec8-wire
//!
//! Shared Teltonika Codec 8 wire types and the byte-exact packet decoder.
//!
//! Used by:
//! - `backend-rust`: decoding AVL frames from connected trackers
//! - `codec8-sim`: encoding synthetic frames to exercise the server
//!
//! ## Scope
//! Codec 8 only (codec id `0x08`). Codec 8 Extended, Codec 12/13/14, and any
//! encryption/auth layer are out of scope.

mod crc;
mod error;
mod io_element;
mod packet;
mod reader;
mod record;

pub use crc::crc16_ibm;
pub use error::DecodeError;
pub use io_element::IoElement;
pub use packet::{decode_packet, Packet, CODEC_ID, MIN_FRAME_LEN};
pub use record::{AvlRecord, Priority};

#[cfg(any(test, feature = "encode"))]
pub use packet::encode::encode_packet;
