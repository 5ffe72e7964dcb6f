//! Decoded-block cache in front of a stereo 16-bit source.
//!
//! Source frames are fetched in blocks of [`BLOCK_FRAMES`], decoded to
//! normalized `f64` pairs and kept in a small strict-LRU cache. The
//! interpolation window slides forward through the source, so the dominant
//! pattern is sequential; a block that directly follows the last one read
//! from the source is fetched without seeking.

use std::collections::{BTreeMap, HashMap};
use std::io::SeekFrom;

use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, trace};

use crate::audio::constants::{BLOCK_BYTES, BLOCK_FRAMES, CACHE_BLOCKS, FRAME_BYTES, INT16_SCALE};
use crate::audio::source::{PcmSource, read_full};
use crate::common::errors::Result;

/// One decoded block: parallel left/right channels of `BLOCK_FRAMES` samples.
/// Frames past a short read stay at zero.
pub struct Block {
    left: Box<[f64]>,
    right: Box<[f64]>,
}

impl Block {
    fn decode(bytes: &[u8]) -> Self {
        let mut left = vec![0.0; BLOCK_FRAMES].into_boxed_slice();
        let mut right = vec![0.0; BLOCK_FRAMES].into_boxed_slice();
        for (i, frame) in bytes.chunks_exact(FRAME_BYTES).enumerate() {
            left[i] = LittleEndian::read_i16(&frame[0..2]) as f64 / INT16_SCALE;
            right[i] = LittleEndian::read_i16(&frame[2..4]) as f64 / INT16_SCALE;
        }
        Self { left, right }
    }

    #[inline]
    pub fn frame(&self, offset: usize) -> (f64, f64) {
        (self.left[offset], self.right[offset])
    }
}

struct Entry {
    block: Block,
    stamp: u64,
}

/// Strict LRU map from block index to decoded block.
///
/// Recency is an ordered map of access stamps, so promotion and eviction
/// never scan the resident set.
pub struct BlockCache {
    entries: HashMap<u64, Entry>,
    recency: BTreeMap<u64, u64>,
    clock: u64,
    capacity: usize,
}

impl BlockCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity + 1),
            recency: BTreeMap::new(),
            clock: 0,
            capacity,
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Looks up `index` and marks it most recently used.
    pub fn get(&mut self, index: u64) -> Option<&Block> {
        let stamp = self.tick();
        let entry = self.entries.get_mut(&index)?;
        self.recency.remove(&entry.stamp);
        entry.stamp = stamp;
        self.recency.insert(stamp, index);
        Some(&entry.block)
    }

    /// Inserts `block` as most recently used, evicting the least recently
    /// used entries beyond capacity.
    pub fn insert(&mut self, index: u64, block: Block) {
        let stamp = self.tick();
        if let Some(old) = self.entries.insert(index, Entry { block, stamp }) {
            self.recency.remove(&old.stamp);
        }
        self.recency.insert(stamp, index);

        while self.entries.len() > self.capacity {
            let Some((_, evicted)) = self.recency.pop_first() else {
                break;
            };
            self.entries.remove(&evicted);
            trace!("BlockCache: evicted block {}", evicted);
        }
    }

    pub fn contains(&self, index: u64) -> bool {
        self.entries.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resident block indices, least recently used first.
    pub fn lru_order(&self) -> Vec<u64> {
        self.recency.values().copied().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }
}

/// Serves individual source frames out of a [`BlockCache`], loading blocks
/// from the owned source on demand.
pub struct BlockLoader<S> {
    source: S,
    frames: u64,
    cache: BlockCache,
    /// Last block read from the source; the source cursor sits right after it.
    last_loaded: Option<u64>,
    scratch: Vec<u8>,
}

impl<S: PcmSource> BlockLoader<S> {
    /// `source_len` is the source size in bytes; a trailing partial frame is
    /// ignored.
    pub fn new(source: S, source_len: u64) -> Self {
        Self {
            source,
            frames: source_len / FRAME_BYTES as u64,
            cache: BlockCache::new(CACHE_BLOCKS),
            last_loaded: None,
            scratch: Vec::new(),
        }
    }

    /// Number of whole frames in the source.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Normalized `(left, right)` at source frame `index`; silence outside
    /// `[0, frames)`.
    pub fn sample(&mut self, index: i64) -> Result<(f64, f64)> {
        if index < 0 || index as u64 >= self.frames {
            return Ok((0.0, 0.0));
        }
        let index = index as u64;
        let block_index = index / BLOCK_FRAMES as u64;
        let offset = (index % BLOCK_FRAMES as u64) as usize;

        if !self.cache.contains(block_index) {
            let block = self.load(block_index)?;
            self.cache.insert(block_index, block);
        }
        match self.cache.get(block_index) {
            Some(block) => Ok(block.frame(offset)),
            None => Ok((0.0, 0.0)),
        }
    }

    fn load(&mut self, block_index: u64) -> Result<Block> {
        let sequential = self
            .last_loaded
            .is_some_and(|last| last.checked_add(1) == Some(block_index));

        // Whatever happens below, the source cursor is no longer known to sit
        // after the previous block.
        self.last_loaded = None;

        if !sequential {
            let offset = block_index * BLOCK_BYTES as u64;
            debug!("BlockLoader: seeking source to block {} (byte {})", block_index, offset);
            self.source.seek(SeekFrom::Start(offset))?;
        } else {
            trace!("BlockLoader: sequential load of block {}", block_index);
        }

        self.scratch.resize(BLOCK_BYTES, 0);
        let filled = read_full(&mut self.source, &mut self.scratch)?;
        let block = Block::decode(&self.scratch[..filled]);

        self.last_loaded = Some(block_index);
        Ok(block)
    }

    pub fn resident_blocks(&self) -> usize {
        self.cache.len()
    }

    pub fn cache(&self) -> &BlockCache {
        &self.cache
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Drops every decoded block.
    pub fn clear(&mut self) {
        self.cache.clear();
        self.last_loaded = None;
        self.scratch = Vec::new();
    }
}
