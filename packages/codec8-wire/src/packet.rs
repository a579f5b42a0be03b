//! Codec 8 packet decoder.
//!
//! One TCP frame decodes to exactly one [`Packet`] or one [`DecodeError`].
//! Framing (how many bytes make up "one frame") is the caller's job — see
//! `connection.rs` in the server crate; this module only ever looks at a
//! slice it is told is a complete frame.

use crate::crc::crc16_ibm;
use crate::error::DecodeError;
use crate::reader::ByteReader;
use crate::record::AvlRecord;

/// The minimum byte length of any valid Codec 8 frame: the fixed header and
/// trailer (12 bytes) plus the smallest possible AVL record (26 bytes), with
/// the 45-byte floor retained verbatim from the reference implementation as
/// a conservative guard.
pub const MIN_FRAME_LEN: usize = 45;

pub const CODEC_ID: u8 = 0x08;

#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub preamble: u32,
    pub payload_len: u32,
    pub codec_id: u8,
    pub record_count: u8,
    pub records: Vec<AvlRecord>,
    pub record_count_trailer: u8,
    pub crc16: i32,
}

impl Packet {
    /// The 4-byte big-endian acknowledgement to write back to the device
    /// after a successful decode: the record count, per the Codec 8 protocol.
    pub fn ack_bytes(&self) -> [u8; 4] {
        (self.record_count as u32).to_be_bytes()
    }
}

/// Decodes exactly one Codec 8 frame. `input` must contain the whole frame
/// and nothing else — trailing or missing bytes are both `Truncated`.
pub fn decode_packet(input: &[u8]) -> Result<Packet, DecodeError> {
    if input.len() < MIN_FRAME_LEN {
        return Err(DecodeError::Truncated {
            at: input.len(),
            needed: MIN_FRAME_LEN - input.len(),
        });
    }

    let mut reader = ByteReader::new(input);

    let preamble = reader.read_u32()?;
    if preamble != 0 {
        return Err(DecodeError::BadPreamble(preamble));
    }

    let payload_len = reader.read_u32()?;

    let codec_id = reader.read_u8()?;
    if codec_id != CODEC_ID {
        return Err(DecodeError::UnsupportedCodec(codec_id));
    }

    let record_count = reader.read_u8()?;

    let mut records = Vec::with_capacity(record_count as usize);
    for _ in 0..record_count {
        records.push(AvlRecord::decode(&mut reader)?);
    }

    let record_count_trailer = reader.read_u8()?;
    if record_count_trailer != record_count {
        return Err(DecodeError::CountMismatch { leading: record_count, trailer: record_count_trailer });
    }

    // CRC-16/IBM covers codec_id..=record_count_trailer, i.e. input[8..cursor).
    let crc_range_end = reader.position();
    let computed_crc = crc16_ibm(&input[8..crc_range_end]);

    let crc16 = reader.read_i32()?;
    let wire_crc = (crc16 as u32 & 0xFFFF) as u16;
    if wire_crc != computed_crc {
        return Err(DecodeError::BadCrc { computed: computed_crc, wire: wire_crc });
    }

    // I5: parsing must consume exactly payload_len + 12 bytes from frame start.
    let consumed = reader.position();
    let expected = payload_len as usize + 12;
    if consumed != expected || consumed != input.len() {
        return Err(DecodeError::Truncated { at: consumed, needed: expected.saturating_sub(consumed) });
    }

    Ok(Packet {
        preamble,
        payload_len,
        codec_id,
        record_count,
        records,
        record_count_trailer,
        crc16,
    })
}

#[cfg(any(test, feature = "encode"))]
pub mod encode {
    use super::*;
    use crate::io_element::IoElement;

    /// Builds a well-formed Codec 8 frame from records, filling in
    /// `payload_len`, the trailing count, and a correct CRC-16/IBM. Used by
    /// round-trip tests and by the companion traffic generator.
    pub fn encode_packet(records: &[AvlRecord]) -> Vec<u8> {
        let mut body = Vec::new();
        body.push(CODEC_ID);
        body.push(records.len() as u8);
        for r in records {
            encode_record(&mut body, r);
        }
        body.push(records.len() as u8);

        let payload_len = body.len() as u32;
        let crc = crc16_ibm(&body);

        let mut frame = Vec::with_capacity(12 + body.len());
        frame.extend_from_slice(&0u32.to_be_bytes());
        frame.extend_from_slice(&payload_len.to_be_bytes());
        frame.extend_from_slice(&body);
        frame.extend_from_slice(&(crc as u32).to_be_bytes());
        frame
    }

    fn encode_record(out: &mut Vec<u8>, r: &AvlRecord) {
        out.extend_from_slice(&r.timestamp_ms.to_be_bytes());
        out.push(r.priority.as_u8());
        out.extend_from_slice(&r.longitude.to_be_bytes());
        out.extend_from_slice(&r.latitude.to_be_bytes());
        out.extend_from_slice(&(r.altitude as i16).to_be_bytes());
        out.extend_from_slice(&(r.angle as i16).to_be_bytes());
        out.extend_from_slice(&(r.satellite_count as u8).to_be_bytes());
        out.extend_from_slice(&r.speed.to_be_bytes());
        out.push(r.event_id);
        out.push(r.io_elements.len() as u8);
        encode_io_elements(out, &r.io_elements);
    }

    fn encode_io_elements(out: &mut Vec<u8>, elements: &[IoElement]) {
        for width in [1u8, 2, 4, 8] {
            let section: Vec<&IoElement> = elements.iter().filter(|e| e.length == width).collect();
            out.push(section.len() as u8);
            for e in section {
                out.push(e.id);
                out.extend_from_slice(&e.value);
            }
        }
    }
}
