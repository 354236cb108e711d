//! CRC16-CCITT frame check sequence.
//!
//! Polynomial `0x1021`, initial value `0xFFFF`, no reflection, no final XOR
//! (the CCITT-FALSE parameter set). The FCS is appended most significant byte
//! first, so running the same CRC over a frame *including* its FCS yields zero
//! for an intact frame.

const POLY: u16 = 0x1021;
const INIT: u16 = 0xFFFF;

const TABLE: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Compute the CRC16-CCITT of `data`.
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    data.iter().fold(INIT, |crc, &byte| {
        (crc << 8) ^ TABLE[((crc >> 8) as u8 ^ byte) as usize]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        // Standard check input for CRC-16/CCITT-FALSE.
        assert_eq!(crc16_ccitt(b"123456789"), 0x29B1);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(crc16_ccitt(&[]), INIT);
    }

    #[test]
    fn test_residue_is_zero() {
        let data = b"selective repeat";
        let fcs = crc16_ccitt(data);

        let mut framed = data.to_vec();
        framed.extend_from_slice(&fcs.to_be_bytes());
        assert_eq!(crc16_ccitt(&framed), 0);
    }
}
