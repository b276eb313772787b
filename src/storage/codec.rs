//! Fixed-layout binary ledger format
//!
//! ```text
//! header   difficulty u32 | length u32
//! record   sequence_id u32 | timestamp i64 | payload [384] |
//!          prev_digest [65] | digest [65] | nonce u32
//! payload  policy_id [32] | member_id [32] | event_kind i32 |
//!          provider_id [32] | pad [4] | amount f64 |
//!          diagnosis_code [16] | notes [256]
//! ```
//!
//! Integers are little-endian. Text is NUL-terminated and zero-padded;
//! bytes after the first NUL are ignored when reading. Decoding is purely
//! structural, no integrity checks.

use thiserror::Error;

use crate::consensus::Block;
use crate::constants::{DIAGNOSIS_CAPACITY, DIGEST_FIELD_LEN, ID_CAPACITY, NOTES_CAPACITY};
use crate::crypto::HexDigest;
use crate::storage::Chain;
use crate::validation::{EventKind, FixedText, Payload};

pub const HEADER_LEN: usize = 8;
pub const PAYLOAD_LEN: usize = 384;
pub const RECORD_LEN: usize = 4 + 8 + PAYLOAD_LEN + DIGEST_FIELD_LEN * 2 + 4;

/// Padding between `provider_id` and the 8-aligned `amount`
const AMOUNT_PAD: usize = 4;

/// Decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("ledger data truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
    #[error("ledger data has {0} trailing bytes after the last block")]
    TrailingBytes(usize),
    #[error("ledger header declares zero blocks")]
    NoBlocks,
    #[error("block {index}: field {field} is not valid text")]
    InvalidText { index: u32, field: &'static str },
    #[error("block {index}: unknown event kind code {code}")]
    UnknownEventKind { index: u32, code: i32 },
    #[error("block {index}: field {field} is not terminated within {width} bytes")]
    Unterminated {
        index: u32,
        field: &'static str,
        width: usize,
    },
}

/// Serialize a chain to its on-disk image
pub fn encode_chain(chain: &Chain) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + RECORD_LEN * chain.blocks().len());
    out.extend_from_slice(&chain.difficulty().to_le_bytes());
    out.extend_from_slice(&chain.len().to_le_bytes());
    for block in chain.blocks() {
        encode_block(block, &mut out);
    }
    out
}

/// Append one fixed-size block record
pub fn encode_block(block: &Block, out: &mut Vec<u8>) {
    let p = &block.payload;
    out.extend_from_slice(&block.sequence_id.to_le_bytes());
    out.extend_from_slice(&block.timestamp.to_le_bytes());

    put_text(out, p.policy_id.as_bytes(), ID_CAPACITY);
    put_text(out, p.member_id.as_bytes(), ID_CAPACITY);
    out.extend_from_slice(&p.event_kind.code().to_le_bytes());
    put_text(out, p.provider_id.as_bytes(), ID_CAPACITY);
    out.extend_from_slice(&[0u8; AMOUNT_PAD]);
    out.extend_from_slice(&p.amount.to_le_bytes());
    put_text(out, p.diagnosis_code.as_bytes(), DIAGNOSIS_CAPACITY);
    put_text(out, p.notes.as_bytes(), NOTES_CAPACITY);

    put_text(out, block.prev_digest.as_str().as_bytes(), DIGEST_FIELD_LEN);
    put_text(out, block.digest.as_str().as_bytes(), DIGEST_FIELD_LEN);
    out.extend_from_slice(&block.nonce.to_le_bytes());
}

/// Deserialize a chain image
pub fn decode_chain(bytes: &[u8]) -> Result<Chain, CodecError> {
    let mut reader = Reader::new(bytes);
    let difficulty = reader.u32()?;
    let length = reader.u32()?;
    if length == 0 {
        return Err(CodecError::NoBlocks);
    }

    let needed = HEADER_LEN + RECORD_LEN * length as usize;
    if bytes.len() < needed {
        return Err(CodecError::Truncated {
            needed,
            available: bytes.len(),
        });
    }

    let mut blocks = Vec::with_capacity(length as usize);
    for index in 0..length {
        blocks.push(decode_block(&mut reader, index)?);
    }

    if reader.remaining() > 0 {
        return Err(CodecError::TrailingBytes(reader.remaining()));
    }

    Chain::from_parts(blocks, difficulty).ok_or(CodecError::NoBlocks)
}

fn decode_block(reader: &mut Reader<'_>, index: u32) -> Result<Block, CodecError> {
    let sequence_id = reader.u32()?;
    let timestamp = reader.i64()?;

    let policy_id = reader.text(ID_CAPACITY, index, "policy_id")?;
    let member_id = reader.text(ID_CAPACITY, index, "member_id")?;
    let code = reader.i32()?;
    let event_kind = EventKind::from_code(code).ok_or(CodecError::UnknownEventKind { index, code })?;
    let provider_id = reader.text(ID_CAPACITY, index, "provider_id")?;
    reader.take(AMOUNT_PAD)?;
    let amount = reader.f64()?;
    let diagnosis_code = reader.text(DIAGNOSIS_CAPACITY, index, "diagnosis_code")?;
    let notes = reader.text(NOTES_CAPACITY, index, "notes")?;

    let prev_digest = reader.text(DIGEST_FIELD_LEN, index, "prev_digest")?;
    let digest = reader.text(DIGEST_FIELD_LEN, index, "digest")?;
    let nonce = reader.u32()?;

    let invalid = |field| CodecError::InvalidText { index, field };
    let payload = Payload {
        policy_id: FixedText::from_bytes(policy_id).map_err(|_| invalid("policy_id"))?,
        member_id: FixedText::from_bytes(member_id).map_err(|_| invalid("member_id"))?,
        event_kind,
        provider_id: FixedText::from_bytes(provider_id).map_err(|_| invalid("provider_id"))?,
        amount,
        diagnosis_code: FixedText::from_bytes(diagnosis_code)
            .map_err(|_| invalid("diagnosis_code"))?,
        notes: FixedText::from_bytes(notes).map_err(|_| invalid("notes"))?,
    };

    let digest_text = |raw: &[u8], field| {
        std::str::from_utf8(raw)
            .ok()
            .and_then(HexDigest::from_text)
            .ok_or_else(|| invalid(field))
    };
    let mut block = Block::new(
        sequence_id,
        timestamp,
        payload,
        digest_text(prev_digest, "prev_digest")?,
    );
    block.digest = digest_text(digest, "digest")?;
    block.nonce = nonce;
    Ok(block)
}

/// Write `bytes` into a zero-filled field of `width` bytes
fn put_text(out: &mut Vec<u8>, bytes: &[u8], width: usize) {
    let len = bytes.len().min(width - 1);
    out.extend_from_slice(&bytes[..len]);
    out.resize(out.len() + width - len, 0);
}

/// Cursor over a ledger image
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::Truncated {
                needed: self.pos + n,
                available: self.bytes.len(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut arr = [0u8; N];
        arr.copy_from_slice(self.take(N)?);
        Ok(arr)
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    fn i64(&mut self) -> Result<i64, CodecError> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    fn f64(&mut self) -> Result<f64, CodecError> {
        Ok(f64::from_le_bytes(self.array()?))
    }

    /// Read a NUL-terminated field of `width` bytes, terminator excluded
    fn text(&mut self, width: usize, index: u32, field: &'static str) -> Result<&'a [u8], CodecError> {
        let raw = self.take(width)?;
        let end = raw.iter().position(|b| *b == 0).ok_or(CodecError::Unterminated {
            index,
            field,
            width,
        })?;
        Ok(&raw[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mining::Miner;
    use crate::validation::{Identifier, Notes};

    fn sample_chain() -> Chain {
        let miner = Miner::new();
        let mut chain = Chain::initialize_at(1, 1_700_000_000, &miner).unwrap();
        let payload = Payload::new(
            EventKind::ClaimSubmission,
            Identifier::new("POL-7").unwrap(),
            Identifier::new("MEM_42").unwrap(),
            Identifier::new("CLINIC9").unwrap(),
        )
        .with_amount(2500.75)
        .with_notes(Notes::new("MRI scan").unwrap());
        chain.append_at(payload, 1_700_000_100, &miner).unwrap();
        chain
    }

    #[test]
    fn test_record_width() {
        assert_eq!(RECORD_LEN, 530);
        let chain = sample_chain();
        assert_eq!(encode_chain(&chain).len(), HEADER_LEN + 2 * RECORD_LEN);
    }

    #[test]
    fn test_field_offsets() {
        let chain = sample_chain();
        let bytes = encode_chain(&chain);
        let record = &bytes[HEADER_LEN + RECORD_LEN..];
        assert_eq!(&record[0..4], &1u32.to_le_bytes());
        assert_eq!(&record[4..12], &1_700_000_100i64.to_le_bytes());
        // payload starts at 12
        assert_eq!(&record[12..17], b"POL-7");
        assert_eq!(record[17], 0);
        assert_eq!(&record[12 + 64..12 + 68], &3i32.to_le_bytes());
        assert_eq!(&record[12 + 68..12 + 75], b"CLINIC9");
        assert_eq!(&record[12 + 104..12 + 112], &2500.75f64.to_le_bytes());
        assert_eq!(&record[12 + 112..12 + 115], b"N/A");
        assert_eq!(&record[12 + 128..12 + 136], b"MRI scan");
        let prev = &record[12 + PAYLOAD_LEN..12 + PAYLOAD_LEN + 64];
        assert_eq!(prev, chain.genesis().digest.as_str().as_bytes());
        assert_eq!(&record[RECORD_LEN - 4..], &chain.tip().nonce.to_le_bytes());
    }

    #[test]
    fn test_roundtrip() {
        let chain = sample_chain();
        let decoded = decode_chain(&encode_chain(&chain)).unwrap();
        assert_eq!(decoded, chain);
    }

    #[test]
    fn test_garbage_after_terminator_is_ignored() {
        let chain = sample_chain();
        let mut bytes = encode_chain(&chain);
        // notes field of genesis: bytes after the terminator are arbitrary
        let notes_end = HEADER_LEN + 12 + PAYLOAD_LEN;
        bytes[notes_end - 1] = 0xAB;
        let decoded = decode_chain(&bytes).unwrap();
        assert_eq!(decoded, chain);
    }

    #[test]
    fn test_non_utf8_text_decodes_and_verifies() {
        use crate::consensus::VerifyMode;

        let miner = Miner::new();
        let mut chain = Chain::initialize_at(0, 1_700_000_000, &miner).unwrap();
        let payload = Payload::new(
            EventKind::Enrollment,
            Identifier::new("POL-7").unwrap(),
            Identifier::from_bytes(b"M\xFCLLER".to_vec()).unwrap(),
            Identifier::new("CLINIC9").unwrap(),
        )
        .with_notes(Notes::from_bytes(b"caf\xE9".to_vec()).unwrap());
        chain.append_at(payload, 1_700_000_100, &miner).unwrap();

        let bytes = encode_chain(&chain);
        let notes_at = HEADER_LEN + RECORD_LEN + 12 + 128;
        assert_eq!(&bytes[notes_at..notes_at + 5], b"caf\xE9\0");

        let decoded = decode_chain(&bytes).unwrap();
        assert_eq!(decoded, chain);
        assert_eq!(decoded.tip().payload.notes.as_bytes(), b"caf\xE9");
        assert_eq!(decoded.verify(VerifyMode::PerBlock), Ok(()));
    }

    #[test]
    fn test_non_hex_digest_rejected() {
        let mut bytes = encode_chain(&sample_chain());
        let at = HEADER_LEN + RECORD_LEN + 12 + PAYLOAD_LEN;
        bytes[at] = 0xFF;
        assert_eq!(
            decode_chain(&bytes),
            Err(CodecError::InvalidText {
                index: 1,
                field: "prev_digest"
            })
        );
    }

    #[test]
    fn test_truncated() {
        let bytes = encode_chain(&sample_chain());
        let err = decode_chain(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { .. }));
        assert!(matches!(decode_chain(&bytes[..3]), Err(CodecError::Truncated { .. })));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = encode_chain(&sample_chain());
        bytes.push(0);
        assert_eq!(decode_chain(&bytes), Err(CodecError::TrailingBytes(1)));
    }

    #[test]
    fn test_zero_length() {
        let bytes = [0u8; HEADER_LEN];
        assert_eq!(decode_chain(&bytes), Err(CodecError::NoBlocks));
    }

    #[test]
    fn test_unknown_event_kind() {
        let mut bytes = encode_chain(&sample_chain());
        let at = HEADER_LEN + RECORD_LEN + 12 + 64;
        bytes[at..at + 4].copy_from_slice(&9i32.to_le_bytes());
        assert_eq!(
            decode_chain(&bytes),
            Err(CodecError::UnknownEventKind { index: 1, code: 9 })
        );
    }

    #[test]
    fn test_unterminated_field() {
        let mut bytes = encode_chain(&sample_chain());
        let at = HEADER_LEN + 12;
        bytes[at..at + ID_CAPACITY].fill(b'A');
        assert_eq!(
            decode_chain(&bytes),
            Err(CodecError::Unterminated {
                index: 0,
                field: "policy_id",
                width: ID_CAPACITY
            })
        );
    }
}
