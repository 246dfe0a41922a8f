//! # Occupancy Index
//!
//! One bit per band, packed into 32-bit words. Bit `b` is set iff band `b`
//! holds at least one packet. Word `i` covers bands `32 * i .. 32 * i + 31`,
//! least significant bit first, which is also the layout exported in stats
//! snapshots.
//!
//! Queries use `trailing_zeros`/`leading_zeros` on the first non-zero word,
//! so a lookup costs one pass over at most `bands / 32` words.

use tracing::trace;

/// Bands covered by a single bitmap word.
pub const BANDS_PER_WORD: usize = u32::BITS as usize;

/// Occupancy bitmap over a fixed number of bands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyIndex {
    words: Vec<u32>,
    bands: usize,
}

#[inline]
fn locate(band: usize) -> (usize, u32) {
    (band / BANDS_PER_WORD, 1u32 << (band % BANDS_PER_WORD))
}

impl OccupancyIndex {
    /// Create an index with every band clear.
    pub fn new(bands: usize) -> Self {
        OccupancyIndex {
            words: vec![0; bands.div_ceil(BANDS_PER_WORD)],
            bands,
        }
    }

    /// Number of bands tracked.
    pub fn bands(&self) -> usize {
        self.bands
    }

    /// Mark `band` as holding at least one packet.
    pub fn mark(&mut self, band: usize) {
        debug_assert!(band < self.bands, "band {band} out of range");
        let (word, bit) = locate(band);
        self.words[word] |= bit;
    }

    /// Mark `band` as empty.
    pub fn clear(&mut self, band: usize) {
        debug_assert!(band < self.bands, "band {band} out of range");
        let (word, bit) = locate(band);
        self.words[word] &= !bit;
    }

    pub fn is_set(&self, band: usize) -> bool {
        if band >= self.bands {
            return false;
        }
        let (word, bit) = locate(band);
        self.words[word] & bit != 0
    }

    /// Clear every band.
    pub fn clear_all(&mut self) {
        self.words.iter_mut().for_each(|w| *w = 0);
    }

    /// Whether no band is occupied.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Number of occupied bands (not packets).
    pub fn occupied_count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Most urgent occupied band: the smallest set bit, scanning the lowest
    /// word first.
    pub fn highest_priority_occupied(&self) -> Option<usize> {
        let band = self
            .words
            .iter()
            .enumerate()
            .find(|(_, w)| **w != 0)
            .map(|(i, &w)| i * BANDS_PER_WORD + w.trailing_zeros() as usize);
        trace!(?band, "highest occupied band");
        band
    }

    /// Least urgent occupied band: the largest set bit, scanning the highest
    /// word first.
    pub fn lowest_priority_occupied(&self) -> Option<usize> {
        let band = self
            .words
            .iter()
            .enumerate()
            .rev()
            .find(|(_, w)| **w != 0)
            .map(|(i, &w)| {
                i * BANDS_PER_WORD + (BANDS_PER_WORD - 1 - w.leading_zeros() as usize)
            });
        trace!(?band, "lowest occupied band");
        band
    }

    /// Raw bitmap words.
    pub fn snapshot(&self) -> &[u32] {
        &self.words
    }

    /// Iterate occupied bands from most to least urgent.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &w)| {
            let mut rest = w;
            std::iter::from_fn(move || {
                if rest == 0 {
                    return None;
                }
                let bit = rest.trailing_zeros() as usize;
                rest &= rest - 1;
                Some(i * BANDS_PER_WORD + bit)
            })
        })
    }
}
