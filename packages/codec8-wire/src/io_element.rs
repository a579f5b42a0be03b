use crate::error::DecodeError;
use crate::reader::ByteReader;

/// One IO element: an id and its raw value bytes. `length` is not a wire
/// field — it is the width of the section the element was read from
/// (1, 2, 4, or 8 bytes), assigned by [`parse_io_elements`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoElement {
    pub id: u8,
    pub length: u8,
    pub value: Vec<u8>,
}

/// Parses the four fixed-order IO sections (1-byte, 2-byte, 4-byte, 8-byte
/// valued) following an AVL record's `element_count` field. Returns the
/// elements in section order and the cursor position just past the last
/// section.
pub fn parse_io_elements(
    reader: &mut ByteReader,
    expected_element_count: u8,
) -> Result<Vec<IoElement>, DecodeError> {
    let mut elements = Vec::with_capacity(expected_element_count as usize);

    for width in [1u8, 2, 4, 8] {
        let count = reader.read_u8()?;
        for _ in 0..count {
            let id = reader.read_u8()?;
            let value = reader.read_slice(width as usize)?.to_vec();
            elements.push(IoElement { id, length: width, value });
        }
    }

    if elements.len() != expected_element_count as usize {
        return Err(DecodeError::ElementCountMismatch {
            declared: expected_element_count,
            parsed: elements.len(),
        });
    }

    Ok(elements)
}
