use crc::{Algorithm, Crc};

/// CRC-16/IBM (a.k.a. CRC-16/ARC): poly 0x8005 reflected, init 0x0000, no
/// xorout. Teltonika's Codec 8 trailer CRC uses this variant over the byte
/// range from `codec_id` through the trailing record-count repeat.
const CRC16_IBM: Algorithm<u16> = crc::CRC_16_ARC;

pub fn crc16_ibm(data: &[u8]) -> u16 {
    Crc::<u16>::new(&CRC16_IBM).checksum(data)
}
