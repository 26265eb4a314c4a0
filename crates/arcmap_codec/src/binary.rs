//! Length-prefixed binary wire format.
//!
//! A compact alternative to the JSON reference format. Both objects are a
//! 32-bit big-endian record count followed by the records:
//!
//! ```text
//! topology:  count (u32) | { rank (u32) | lo | hi } * count
//! payload:   count (u32) | { key | value } * count
//! ```
//!
//! Integers are fixed-width big-endian; strings are a 32-bit big-endian
//! length followed by UTF-8 bytes. Decoding rejects truncated input and
//! trailing bytes.

use crate::error::{CodecError, CodecResult};
use crate::{ArcRecord, Codec, PairRecord};

/// A value with a fixed binary field encoding.
pub trait Field: Sized {
    /// Appends the encoded field to `buf`.
    fn encode_field(&self, buf: &mut Vec<u8>);

    /// Decodes one field from the front of `input`, advancing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is truncated or the field is malformed.
    fn decode_field(input: &mut &[u8]) -> CodecResult<Self>;
}

fn take<'a>(input: &mut &'a [u8], need: usize) -> CodecResult<&'a [u8]> {
    if input.len() < need {
        return Err(CodecError::UnexpectedEof {
            need,
            have: input.len(),
        });
    }
    let (head, rest) = input.split_at(need);
    *input = rest;
    Ok(head)
}

macro_rules! int_field {
    ($($ty:ty),*) => {$(
        impl Field for $ty {
            fn encode_field(&self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.to_be_bytes());
            }

            fn decode_field(input: &mut &[u8]) -> CodecResult<Self> {
                let size = std::mem::size_of::<$ty>();
                let bytes = take(input, size)?;
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                Ok(<$ty>::from_be_bytes(raw))
            }
        }
    )*};
}

int_field!(u8, u16, u32, u64);

impl Field for String {
    fn encode_field(&self, buf: &mut Vec<u8>) {
        (self.len() as u32).encode_field(buf);
        buf.extend_from_slice(self.as_bytes());
    }

    fn decode_field(input: &mut &[u8]) -> CodecResult<Self> {
        let len = u32::decode_field(input)? as usize;
        let bytes = take(input, len)?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }
}

/// Codec producing the length-prefixed binary format.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl BinaryCodec {
    /// Creates the binary codec.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn finish<T>(records: Vec<T>, input: &[u8]) -> CodecResult<Vec<T>> {
        if !input.is_empty() {
            return Err(CodecError::TrailingBytes {
                trailing: input.len(),
            });
        }
        Ok(records)
    }
}

impl<K, V> Codec<K, V> for BinaryCodec
where
    K: Field,
    V: Field,
{
    fn encode_topology(&self, arcs: &[ArcRecord<K>]) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::new();
        (arcs.len() as u32).encode_field(&mut buf);
        for arc in arcs {
            arc.rank.encode_field(&mut buf);
            arc.lo.encode_field(&mut buf);
            arc.hi.encode_field(&mut buf);
        }
        Ok(buf)
    }

    fn decode_topology(&self, bytes: &[u8]) -> CodecResult<Vec<ArcRecord<K>>> {
        let mut input = bytes;
        let count = u32::decode_field(&mut input)?;

        let mut arcs = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let rank = u32::decode_field(&mut input)?;
            let lo = K::decode_field(&mut input)?;
            let hi = K::decode_field(&mut input)?;
            arcs.push(ArcRecord { rank, lo, hi });
        }

        Self::finish(arcs, input)
    }

    fn encode_pairs(&self, pairs: &[PairRecord<K, V>]) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::new();
        (pairs.len() as u32).encode_field(&mut buf);
        for pair in pairs {
            pair.key.encode_field(&mut buf);
            pair.value.encode_field(&mut buf);
        }
        Ok(buf)
    }

    fn decode_pairs(&self, bytes: &[u8]) -> CodecResult<Vec<PairRecord<K, V>>> {
        let mut input = bytes;
        let count = u32::decode_field(&mut input)?;

        let mut pairs = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let key = K::decode_field(&mut input)?;
            let value = V::decode_field(&mut input)?;
            pairs.push(PairRecord { key, value });
        }

        Self::finish(pairs, input)
    }
}
