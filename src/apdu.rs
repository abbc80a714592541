//! Command/response APDU buffers and parsing.
//!
//! A command APDU is `CLA, INS, P1, P2, Lc, data..., [Le]`. Two length
//! encodings are in play: short (Lc is one byte, 1-255) and extended
//! (Lc byte is 0x00, followed by two bytes of true length, big-endian).
//! `cmd_APDU_size` (the total buffer length) is authoritative; `Lc` is
//! advisory, matching spec.md section 3.

use crate::api::StatusWord;

/// Minimum size of a well-formed command APDU: CLA INS P1 P2 Lc.
const MIN_APDU_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthEncoding {
    Short,
    Extended,
}

/// A parsed, borrowed view over the request buffer. Never copies the
/// payload; handlers slice directly into the backing buffer.
#[derive(Debug, Clone, Copy)]
pub struct CommandApdu<'a> {
    bytes: &'a [u8],
    data_start: usize,
    data_len: usize,
}

impl<'a> CommandApdu<'a> {
    /// Parses `bytes` (the full `cmd_APDU` buffer, length `cmd_APDU_size`)
    /// into header fields and a bounds-checked data slice.
    ///
    /// Returns `Err(GENERIC_ERROR)` for anything that doesn't parse to a
    /// valid, in-bounds APDU -- the dispatcher is defensive about offset
    /// arithmetic even though the original firmware wasn't (spec.md
    /// section 9, "Defensive cmd_APDU offset arithmetic").
    pub fn parse(bytes: &'a [u8]) -> Result<Self, StatusWord> {
        if bytes.len() < MIN_APDU_LEN {
            return Err(StatusWord::GENERIC_ERROR);
        }
        // CLA/INS/P1/P2 alone satisfy MIN_APDU_LEN; Lc is a fifth byte and
        // must be bounds-checked on its own before it's indexed.
        let Some(&lc) = bytes.get(4) else {
            return Err(StatusWord::GENERIC_ERROR);
        };
        let (encoding, data_start, declared_len) = if lc == 0x00 && bytes.len() >= 7 {
            let len = u16::from_be_bytes([bytes[5], bytes[6]]) as usize;
            (LengthEncoding::Extended, 7usize, len)
        } else {
            (LengthEncoding::Short, 5usize, lc as usize)
        };
        // cmd_APDU_size is authoritative over the advisory Lc/extended-length
        // field, but an advertised length that runs past the buffer is
        // malformed input, not something to silently truncate.
        let available = bytes.len().saturating_sub(data_start);
        if declared_len > available {
            return Err(StatusWord::GENERIC_ERROR);
        }
        let data_len = declared_len;
        let _ = encoding;
        Ok(CommandApdu { bytes, data_start, data_len })
    }

    pub fn cla(&self) -> u8 {
        self.bytes[0]
    }
    pub fn ins(&self) -> u8 {
        self.bytes[1]
    }
    pub fn p1(&self) -> u8 {
        self.bytes[2]
    }
    pub fn p2(&self) -> u8 {
        self.bytes[3]
    }
    pub fn lc_byte(&self) -> u8 {
        self.bytes[4]
    }
    /// The payload, bounds-checked against the buffer at parse time.
    pub fn data(&self) -> &'a [u8] {
        &self.bytes[self.data_start..self.data_start + self.data_len]
    }
    pub fn data_len(&self) -> usize {
        self.data_len
    }
    /// Total length of the command buffer (`cmd_APDU_size`).
    pub fn total_len(&self) -> usize {
        self.bytes.len()
    }
    /// Raw byte at an absolute offset into the command buffer, if present.
    /// Used by GENERATE ASYMMETRIC KEY PAIR, which addresses its purpose
    /// byte by absolute APDU offset rather than relative to the parsed
    /// data window (spec.md section 4.8).
    pub fn byte_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(offset).copied()
    }
}

/// The response buffer: payload bytes followed by SW1 SW2.
/// `res_APDU_size` always equals `payload_len + 2`.
#[derive(Debug, Clone, Default)]
pub struct ResponseApdu {
    buf: Vec<u8>,
}

impl ResponseApdu {
    pub fn new() -> Self {
        ResponseApdu { buf: Vec::new() }
    }

    /// Writes `payload` followed by `sw`, replacing any prior contents.
    /// Every handler exit goes through this (or `status_only`), so every
    /// path writes exactly one SW1/SW2 pair.
    pub fn set(&mut self, payload: &[u8], sw: StatusWord) {
        self.buf.clear();
        self.buf.extend_from_slice(payload);
        self.buf.extend_from_slice(&sw.as_bytes());
    }

    pub fn status_only(&mut self, sw: StatusWord) {
        self.set(&[], sw);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// `res_APDU_size`.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn status_word(&self) -> Option<StatusWord> {
        if self.buf.len() < 2 {
            return None;
        }
        Some(StatusWord(self.buf[self.buf.len() - 2], self.buf[self.buf.len() - 1]))
    }

    pub fn payload(&self) -> &[u8] {
        &self.buf[..self.buf.len().saturating_sub(2)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_form_data_start_is_five() {
        let bytes = [0x00, 0x20, 0x00, 0x81, 0x06, b'1', b'2', b'3', b'4', b'5', b'6'];
        let apdu = CommandApdu::parse(&bytes).unwrap();
        assert_eq!(apdu.data(), b"123456");
    }

    #[test]
    fn extended_form_data_start_is_seven() {
        let mut bytes = vec![0x00, 0xDA, 0x00, 0x00, 0x00, 0x01, 0x00];
        bytes.extend_from_slice(&[0xAAu8; 256]);
        let apdu = CommandApdu::parse(&bytes).unwrap();
        assert_eq!(apdu.data_len(), 256);
    }

    #[test]
    fn truncated_buffer_is_generic_error() {
        let bytes = [0x00, 0x20, 0x00, 0x81];
        assert_eq!(CommandApdu::parse(&bytes), Err(StatusWord::GENERIC_ERROR));
    }

    #[test]
    fn advertised_length_past_buffer_is_generic_error() {
        // Lc claims 10 bytes of payload but only 2 are actually present.
        let bytes = [0x00, 0x20, 0x00, 0x81, 0x0A, 0x01, 0x02];
        assert_eq!(CommandApdu::parse(&bytes), Err(StatusWord::GENERIC_ERROR));
    }

    #[test]
    fn response_round_trip() {
        let mut res = ResponseApdu::new();
        res.set(&[0xDE, 0xAD], StatusWord::SUCCESS);
        assert_eq!(res.len(), 4);
        assert_eq!(res.status_word(), Some(StatusWord::SUCCESS));
        assert_eq!(res.payload(), &[0xDE, 0xAD]);
    }
}
