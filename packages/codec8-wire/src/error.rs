use thiserror::Error;

/// Reasons a Codec 8 frame was rejected. Every variant is fatal for the
/// frame it applies to — there is no partial `Packet`.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DecodeError {
    #[error("ran off the end of the buffer: needed {needed} more byte(s) at offset {at}")]
    Truncated { at: usize, needed: usize },

    #[error("preamble is not four zero bytes, got {0:#010x}")]
    BadPreamble(u32),

    #[error("unsupported codec id {0:#04x}, only Codec 8 (0x08) is handled")]
    UnsupportedCodec(u8),

    #[error("priority {0} out of range, want <= 2")]
    BadPriority(u8),

    #[error("trailing record count {trailer} does not match leading count {leading}")]
    CountMismatch { leading: u8, trailer: u8 },

    #[error("IO element section counts sum to {parsed}, declared element_count is {declared}")]
    ElementCountMismatch { declared: u8, parsed: usize },

    #[error("CRC-16/IBM mismatch: computed {computed:#06x}, wire {wire:#06x}")]
    BadCrc { computed: u16, wire: u16 },
}
