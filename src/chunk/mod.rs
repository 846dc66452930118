//! Chunk processing module
//!
//! Handles splitting content into fixed-size chunks, transparent
//! compression, and the per-chunk AEAD pass. Index assignment is strictly
//! sequential; the cipher work for a batch of chunks runs on the rayon pool
//! and results are appended back in index order.

mod chunker;
mod compression;

pub use chunker::{Chunk, FIRST_DATA_INDEX};
pub(crate) use chunker::Chunker;
pub use compression::{compress, decompress, should_compress};

use crate::crypto::{derive_iv, ChunkCipher, NONCE_SIZE, TAG_SIZE};
use crate::error::Result;
use crate::progress::{percent, Progress};
use rayon::prelude::*;
use tracing::debug;

/// Plaintext size of every data chunk but the last: 1 MiB
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Largest accepted number of chunks per parallel batch
pub const MAX_BATCH_SIZE: usize = 4096;

/// How the chunk pass is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOptions {
    /// Plaintext chunk size. Fixed by the container format; only tests
    /// in this crate shrink it.
    pub(crate) chunk_size: usize,
    /// Run AEAD work on the rayon pool
    pub parallel: bool,
    /// Chunks per parallel batch (0 = one per rayon thread), capped at
    /// [`MAX_BATCH_SIZE`]
    pub batch_size: usize,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        ChunkOptions::new(true, 0)
    }
}

impl ChunkOptions {
    /// Scheduling options for the format's fixed [`CHUNK_SIZE`]
    pub fn new(parallel: bool, batch_size: usize) -> Self {
        ChunkOptions {
            chunk_size: CHUNK_SIZE,
            parallel,
            batch_size,
        }
    }

    /// Plaintext size of each data chunk
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn effective_batch(&self) -> usize {
        if !self.parallel {
            1
        } else if self.batch_size == 0 {
            rayon::current_num_threads().clamp(1, MAX_BATCH_SIZE)
        } else {
            self.batch_size.min(MAX_BATCH_SIZE)
        }
    }
}

/// Encrypt `data` chunk by chunk, returning the concatenated sealed blocks
pub fn seal_chunks<P: Progress>(
    cipher: &ChunkCipher,
    base_nonce: &[u8; NONCE_SIZE],
    data: &[u8],
    options: &ChunkOptions,
    progress: &mut P,
) -> Result<Vec<u8>> {
    let total = Chunker::chunk_count(data.len(), options.chunk_size);
    let mut out = Vec::with_capacity(data.len() + total * TAG_SIZE);

    run_batches(
        Chunker::new(data, options.chunk_size),
        total,
        options,
        progress,
        |chunk| {
            let iv = derive_iv(base_nonce, chunk.index)?;
            cipher.seal(&iv, chunk.data)
        },
        |sealed| out.extend_from_slice(&sealed),
    )?;

    debug!(chunks = total, bytes = out.len(), "Sealed chunk sequence");
    Ok(out)
}

/// Decrypt a body of sealed blocks back into plaintext
///
/// The first failing block aborts the pass; nothing decrypted so far is
/// returned.
pub fn open_chunks<P: Progress>(
    cipher: &ChunkCipher,
    base_nonce: &[u8; NONCE_SIZE],
    body: &[u8],
    options: &ChunkOptions,
    progress: &mut P,
) -> Result<Vec<u8>> {
    let block_size = options.chunk_size + TAG_SIZE;
    let total = Chunker::chunk_count(body.len(), block_size);
    let mut out = Vec::with_capacity(body.len().saturating_sub(total * TAG_SIZE));

    run_batches(
        Chunker::sealed(body, options.chunk_size),
        total,
        options,
        progress,
        |block| {
            let iv = derive_iv(base_nonce, block.index)?;
            cipher.open(&iv, block.data)
        },
        |plain| out.extend_from_slice(&plain),
    )?;

    debug!(chunks = total, bytes = out.len(), "Opened chunk sequence");
    Ok(out)
}

/// Pull batches from the chunker, transform each batch (in parallel when
/// enabled) and emit the results in index order.
fn run_batches<'a, P, W, E>(
    mut chunker: Chunker<'a>,
    total: usize,
    options: &ChunkOptions,
    progress: &mut P,
    work: W,
    mut emit: E,
) -> Result<()>
where
    P: Progress,
    W: Fn(Chunk<'a>) -> Result<Vec<u8>> + Sync,
    E: FnMut(Vec<u8>),
{
    let batch_size = options.effective_batch();
    let mut batch: Vec<Chunk<'a>> = Vec::with_capacity(batch_size.min(total));
    let mut done = 0usize;

    loop {
        batch.clear();
        batch.extend(chunker.by_ref().take(batch_size));
        if batch.is_empty() {
            break;
        }

        let results: Vec<Vec<u8>> = if options.parallel && batch.len() > 1 {
            batch
                .par_iter()
                .map(|chunk| work(*chunk))
                .collect::<Result<Vec<_>>>()?
        } else {
            batch
                .iter()
                .map(|chunk| work(*chunk))
                .collect::<Result<Vec<_>>>()?
        };

        for result in results {
            emit(result);
        }

        done += batch.len();
        progress.report(percent(done, total));
    }

    if total == 0 {
        progress.report(100);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KEY_SIZE;
    use crate::error::Error;

    const BASE: [u8; NONCE_SIZE] = [0x5a; NONCE_SIZE];

    fn cipher() -> ChunkCipher {
        ChunkCipher::new(&[7u8; KEY_SIZE]).unwrap()
    }

    fn small(parallel: bool) -> ChunkOptions {
        ChunkOptions {
            chunk_size: 16,
            parallel,
            batch_size: 3,
        }
    }

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 251) as u8).collect()
    }

    #[test]
    fn test_roundtrip_multi_chunk() {
        let data = sample(16 * 7 + 5);
        for parallel in [false, true] {
            let opts = small(parallel);
            let sealed = seal_chunks(&cipher(), &BASE, &data, &opts, &mut ()).unwrap();
            assert_eq!(sealed.len(), data.len() + 8 * TAG_SIZE);
            let opened = open_chunks(&cipher(), &BASE, &sealed, &opts, &mut ()).unwrap();
            assert_eq!(opened, data);
        }
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let data = sample(16 * 10);
        let a = seal_chunks(&cipher(), &BASE, &data, &small(false), &mut ()).unwrap();
        let b = seal_chunks(&cipher(), &BASE, &data, &small(true), &mut ()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_chunks_use_indices_from_one() {
        let data = sample(20);
        let sealed = seal_chunks(&cipher(), &BASE, &data, &small(false), &mut ()).unwrap();

        let first_iv = derive_iv(&BASE, 1).unwrap();
        let first = cipher().seal(&first_iv, &data[..16]).unwrap();
        assert_eq!(&sealed[..16 + TAG_SIZE], first.as_slice());
    }

    #[test]
    fn test_empty_data() {
        let mut reports = Vec::new();
        let sealed = seal_chunks(&cipher(), &BASE, &[], &small(true), &mut |p: u8| reports.push(p)).unwrap();
        assert!(sealed.is_empty());
        assert_eq!(reports, vec![100]);
        assert!(open_chunks(&cipher(), &BASE, &[], &small(true), &mut ()).unwrap().is_empty());
    }

    #[test]
    fn test_progress_monotonic_and_complete() {
        let data = sample(16 * 9);
        let mut reports = Vec::new();
        seal_chunks(&cipher(), &BASE, &data, &small(true), &mut |p: u8| reports.push(p)).unwrap();
        assert_eq!(reports.len(), 3);
        assert!(reports.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*reports.last().unwrap(), 100);
    }

    #[test]
    fn test_swapped_chunks_rejected() {
        let data = sample(32);
        let sealed = seal_chunks(&cipher(), &BASE, &data, &small(false), &mut ()).unwrap();
        let block = 16 + TAG_SIZE;
        let mut swapped = sealed[block..].to_vec();
        swapped.extend_from_slice(&sealed[..block]);
        let result = open_chunks(&cipher(), &BASE, &swapped, &small(true), &mut ());
        assert!(matches!(result, Err(Error::Authentication)));
    }

    #[test]
    fn test_oversized_batch_is_capped() {
        let data = sample(16 * 5 + 3);
        let opts = ChunkOptions {
            batch_size: usize::MAX,
            ..small(true)
        };
        let sealed = seal_chunks(&cipher(), &BASE, &data, &opts, &mut ()).unwrap();
        let opened = open_chunks(&cipher(), &BASE, &sealed, &opts, &mut ()).unwrap();
        assert_eq!(opened, data);
        assert_eq!(opts.effective_batch(), MAX_BATCH_SIZE);
    }

    #[test]
    fn test_public_constructor_pins_chunk_size() {
        assert_eq!(ChunkOptions::new(false, 8).chunk_size(), CHUNK_SIZE);
        assert_eq!(ChunkOptions::default().chunk_size(), CHUNK_SIZE);
        assert_eq!(ChunkOptions::new(false, 8).effective_batch(), 1);
    }

    #[test]
    fn test_trailing_fragment_is_corrupt() {
        let data = sample(16);
        let mut sealed = seal_chunks(&cipher(), &BASE, &data, &small(false), &mut ()).unwrap();
        sealed.extend_from_slice(&[0u8; 5]);
        let result = open_chunks(&cipher(), &BASE, &sealed, &small(false), &mut ());
        assert!(matches!(result, Err(Error::CorruptContainer(_))));
    }
}
