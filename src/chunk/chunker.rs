//! Fixed-size splitting with sequential index assignment

use crate::crypto::TAG_SIZE;

/// First index used for data chunks (0 is the metadata block)
pub const FIRST_DATA_INDEX: u64 = 1;

/// A borrowed slice of input paired with its unit index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Unit index, starting at [`FIRST_DATA_INDEX`]
    pub index: u64,
    /// Chunk bytes
    pub data: &'a [u8],
}

/// Single-pass producer of fixed-size chunks
///
/// Indices are handed out in strictly increasing order as the iterator is
/// driven; the AEAD work on each chunk can then happen anywhere.
pub struct Chunker<'a> {
    remaining: &'a [u8],
    chunk_size: usize,
    next_index: u64,
}

impl<'a> Chunker<'a> {
    /// Split plaintext into `chunk_size` pieces (the last may be shorter)
    pub fn new(data: &'a [u8], chunk_size: usize) -> Self {
        debug_assert!(chunk_size > 0);
        Chunker {
            remaining: data,
            chunk_size,
            next_index: FIRST_DATA_INDEX,
        }
    }

    /// Split a sealed body into `chunk_size + TAG_SIZE` blocks
    pub fn sealed(body: &'a [u8], chunk_size: usize) -> Self {
        Self::new(body, chunk_size + TAG_SIZE)
    }

    /// Number of chunks `len` bytes split into
    pub fn chunk_count(len: usize, chunk_size: usize) -> usize {
        len.div_ceil(chunk_size)
    }
}

impl<'a> Iterator for Chunker<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }

        let take = self.chunk_size.min(self.remaining.len());
        let (data, rest) = self.remaining.split_at(take);
        self.remaining = rest;

        let index = self.next_index;
        self.next_index += 1;

        Some(Chunk { index, data })
    }
}
