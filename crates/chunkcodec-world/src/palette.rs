//! Per-section block palette.

use std::sync::Arc;

use crate::bitpack::bits_for_palette;
use crate::block::BlockState;

/// Ordered, deduplicated list of block states. The position of a state is
/// the index stored in the section's block array. Palettes only grow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Palette {
    entries: Vec<Arc<BlockState>>,
}

impl Palette {
    /// Most entries a palette can hold while every index fits in a `u16`.
    pub const MAX_LEN: usize = u16::MAX as usize + 1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Palette of a freshly created section: air at index 0, then the fill block.
    pub fn with_default(default_block: Arc<BlockState>) -> Self {
        let mut palette = Self {
            entries: vec![crate::block::shared_air()],
        };
        palette.get_or_add(default_block);
        palette
    }

    /// Index of a content-equal entry, appending `state` on a miss.
    /// Returns `None` when `state` is new and the palette already holds
    /// [`Palette::MAX_LEN`] entries.
    ///
    /// Palettes rarely exceed a few dozen entries, so a linear scan is used
    /// and insertion order is kept.
    pub fn get_or_add(&mut self, state: impl Into<Arc<BlockState>>) -> Option<u16> {
        let state = state.into();
        if let Some(index) = self.index_of(&state) {
            return Some(index);
        }
        let index = u16::try_from(self.entries.len()).ok()?;
        self.entries.push(state);
        Some(index)
    }

    pub fn index_of(&self, state: &BlockState) -> Option<u16> {
        self.entries
            .iter()
            .position(|entry| **entry == *state)
            .and_then(|i| u16::try_from(i).ok())
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= Self::MAX_LEN
    }

    /// Append without deduplication. Decoded palettes are taken as stored.
    pub(crate) fn push_raw(&mut self, state: Arc<BlockState>) {
        self.entries.push(state);
    }

    pub fn get(&self, index: u16) -> Option<&Arc<BlockState>> {
        self.entries.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[Arc<BlockState>] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<BlockState>> {
        self.entries.iter()
    }

    /// Index width for the current palette size.
    pub fn bit_width(&self) -> u32 {
        bits_for_palette(self.entries.len())
    }
}
