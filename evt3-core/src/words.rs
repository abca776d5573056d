//! Little-endian 16-bit word framing over a raw byte buffer.

use crate::decoder::DecodeError;
use byteorder::{ByteOrder, LittleEndian};
use std::iter::FusedIterator;
use std::slice::ChunksExact;

/// A lazy, forward-only sequence of EVT 3.0 words.
///
/// Cloning the stream before iterating gives an independent cursor that starts
/// from the same position, so a stream can be restarted from its beginning.
#[derive(Debug, Clone)]
pub struct WordStream<'a> {
    chunks: ChunksExact<'a, u8>,
    position: usize,
}

impl<'a> WordStream<'a> {
    /// Frames `bytes` as 16-bit words.
    ///
    /// Fails with [`DecodeError::OddLength`] when a trailing byte cannot form a
    /// word. An empty buffer is a valid, empty stream.
    pub fn new(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        if bytes.len() % 2 != 0 {
            return Err(DecodeError::OddLength { len: bytes.len() });
        }
        Ok(Self {
            chunks: bytes.chunks_exact(2),
            position: 0,
        })
    }

    /// Index of the next word to be yielded.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }
}

impl Iterator for WordStream<'_> {
    type Item = u16;

    #[inline]
    fn next(&mut self) -> Option<u16> {
        let chunk = self.chunks.next()?;
        self.position += 1;
        Some(LittleEndian::read_u16(chunk))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for WordStream<'_> {}

impl FusedIterator for WordStream<'_> {}
