use crate::error::DecodeError;
use crate::io_element::{parse_io_elements, IoElement};
use crate::reader::ByteReader;

/// Severity bucket for an AVL record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Low = 0,
    High = 1,
    Panic = 2,
}

impl Priority {
    fn from_u8(v: u8) -> Result<Self, DecodeError> {
        match v {
            0 => Ok(Self::Low),
            1 => Ok(Self::High),
            2 => Ok(Self::Panic),
            other => Err(DecodeError::BadPriority(other)),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// One AVL record: position, motion, and the IO elements attached to it.
#[derive(Debug, Clone, PartialEq)]
pub struct AvlRecord {
    pub timestamp_ms: u64,
    pub priority: Priority,
    pub longitude: i32,
    pub latitude: i32,
    /// Only 2 bytes wide on the wire; sign-extended to i32 on decode.
    pub altitude: i32,
    /// Only 2 bytes wide on the wire; sign-extended to i32 on decode.
    pub angle: i32,
    pub satellite_count: i8,
    pub speed: u16,
    pub event_id: u8,
    pub io_elements: Vec<IoElement>,
}

impl AvlRecord {
    /// Number of IO elements, i.e. the wire `element_count` field (I2).
    pub fn element_count(&self) -> u8 {
        self.io_elements.len() as u8
    }

    pub(crate) fn decode(reader: &mut ByteReader) -> Result<Self, DecodeError> {
        let timestamp_ms = reader.read_u64()?;
        let priority = Priority::from_u8(reader.read_u8()?)?;
        let longitude = reader.read_i32()?;
        let latitude = reader.read_i32()?;
        let altitude = reader.read_i32_from_u16()?;
        let angle = reader.read_i32_from_u16()?;
        let satellite_count = reader.read_i8()?;
        let speed = reader.read_u16()?;
        let event_id = reader.read_u8()?;
        let element_count = reader.read_u8()?;
        let io_elements = parse_io_elements(reader, element_count)?;

        Ok(Self {
            timestamp_ms,
            priority,
            longitude,
            latitude,
            altitude,
            angle,
            satellite_count,
            speed,
            event_id,
            io_elements,
        })
    }
}
