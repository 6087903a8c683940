//! Dense arrays of small palette indices packed into 32-bit words.
//!
//! Widths that divide 32 pack entries back to back. The others (3, 5 and 6
//! bits) leave the top bits of every word unused so no entry crosses a word
//! boundary. The fixed logical size is checked on every access.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BitArrayVersion {
    /// One value for every cell, no words at all.
    V0,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
    V8,
    V16,
}

impl BitArrayVersion {
    pub const ALL: [BitArrayVersion; 9] = [
        Self::V0,
        Self::V1,
        Self::V2,
        Self::V3,
        Self::V4,
        Self::V5,
        Self::V6,
        Self::V8,
        Self::V16,
    ];

    pub const fn bits(self) -> u8 {
        match self {
            Self::V0 => 0,
            Self::V1 => 1,
            Self::V2 => 2,
            Self::V3 => 3,
            Self::V4 => 4,
            Self::V5 => 5,
            Self::V6 => 6,
            Self::V8 => 8,
            Self::V16 => 16,
        }
    }

    pub const fn entries_per_word(self) -> usize {
        match self {
            Self::V0 => 0,
            Self::V1 => 32,
            Self::V2 => 16,
            Self::V3 => 10,
            Self::V4 => 8,
            Self::V5 => 6,
            Self::V6 => 5,
            Self::V8 => 4,
            Self::V16 => 2,
        }
    }

    /// Largest palette index this width can store.
    pub const fn max_entry_value(self) -> u32 {
        (1u32 << self.bits()) - 1
    }

    pub const fn is_padded(self) -> bool {
        matches!(self, Self::V3 | Self::V5 | Self::V6)
    }

    pub fn word_count(self, size: usize) -> usize {
        match self.entries_per_word() {
            0 => 0,
            per_word => size.div_ceil(per_word),
        }
    }

    pub fn next(self) -> Option<Self> {
        match self {
            Self::V0 => Some(Self::V1),
            Self::V1 => Some(Self::V2),
            Self::V2 => Some(Self::V3),
            Self::V3 => Some(Self::V4),
            Self::V4 => Some(Self::V5),
            Self::V5 => Some(Self::V6),
            Self::V6 => Some(Self::V8),
            Self::V8 => Some(Self::V16),
            Self::V16 => None,
        }
    }

    pub fn from_bits(bits: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.bits() == bits)
    }

    /// Narrowest width able to index a palette of `len` entries.
    pub fn for_palette_len(len: usize) -> Option<Self> {
        if len <= 1 {
            return Some(Self::V0);
        }
        let max_index = (len - 1) as u32;
        Self::ALL[1..]
            .iter()
            .copied()
            .find(|v| v.max_entry_value() >= max_index)
    }
}

/// Palette indices for a fixed number of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitArray {
    Singleton {
        size: usize,
    },
    PowerOfTwo {
        version: BitArrayVersion,
        size: usize,
        words: Vec<u32>,
    },
    Padded {
        version: BitArrayVersion,
        size: usize,
        words: Vec<u32>,
    },
}

impl BitArray {
    /// A zeroed array of `size` cells.
    pub fn new(version: BitArrayVersion, size: usize) -> Self {
        let words = vec![0; version.word_count(size)];
        match version {
            BitArrayVersion::V0 => Self::Singleton { size },
            v if v.is_padded() => Self::Padded {
                version,
                size,
                words,
            },
            _ => Self::PowerOfTwo {
                version,
                size,
                words,
            },
        }
    }

    pub fn version(&self) -> BitArrayVersion {
        match self {
            Self::Singleton { .. } => BitArrayVersion::V0,
            Self::PowerOfTwo { version, .. } | Self::Padded { version, .. } => *version,
        }
    }

    pub fn size(&self) -> usize {
        match self {
            Self::Singleton { size }
            | Self::PowerOfTwo { size, .. }
            | Self::Padded { size, .. } => *size,
        }
    }

    pub fn words(&self) -> &[u32] {
        match self {
            Self::Singleton { .. } => &[],
            Self::PowerOfTwo { words, .. } | Self::Padded { words, .. } => words,
        }
    }

    /// Word index and bit offset of a cell.
    fn locate(&self, index: usize) -> (usize, u32) {
        match self {
            Self::Singleton { .. } => (0, 0),
            Self::PowerOfTwo { version, .. } => {
                let bit = index << version.bits().trailing_zeros();
                (bit >> 5, (bit & 31) as u32)
            }
            Self::Padded { version, .. } => {
                let per_word = version.entries_per_word();
                (
                    index / per_word,
                    ((index % per_word) * version.bits() as usize) as u32,
                )
            }
        }
    }

    fn check_index(&self, index: usize) {
        assert!(
            index < self.size(),
            "bit array index {index} out of bounds for size {}",
            self.size()
        );
    }

    pub fn get(&self, index: usize) -> u32 {
        self.check_index(index);
        match self {
            Self::Singleton { .. } => 0,
            Self::PowerOfTwo { version, words, .. } | Self::Padded { version, words, .. } => {
                let (word, offset) = self.locate(index);
                (words[word] >> offset) & version.max_entry_value()
            }
        }
    }

    /// Panics when `value` does not fit the current width; grow first.
    pub fn set(&mut self, index: usize, value: u32) {
        self.check_index(index);
        let version = self.version();
        assert!(
            value <= version.max_entry_value(),
            "value {value} does not fit {}-bit storage",
            version.bits()
        );
        let (word, offset) = self.locate(index);
        match self {
            Self::Singleton { .. } => {}
            Self::PowerOfTwo { words, .. } | Self::Padded { words, .. } => {
                let mask = version.max_entry_value() << offset;
                words[word] = (words[word] & !mask) | (value << offset);
            }
        }
    }

    /// Every cell decoded, in index order.
    pub fn to_vec(&self) -> Vec<u32> {
        (0..self.size()).map(|i| self.get(i)).collect()
    }

    /// Copy of this array re-packed at another width.
    pub fn widened(&self, version: BitArrayVersion) -> Self {
        let mut next = Self::new(version, self.size());
        for index in 0..self.size() {
            next.set(index, self.get(index));
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_match_word_layout() {
        let expected = [(1, 32), (2, 16), (3, 10), (4, 8), (5, 6), (6, 5), (8, 4), (16, 2)];
        for (version, (bits, per_word)) in BitArrayVersion::ALL[1..].iter().zip(expected) {
            assert_eq!(version.bits(), bits);
            assert_eq!(version.entries_per_word(), per_word);
            assert!(version.bits() as usize * per_word <= 32);
        }
        assert_eq!(BitArrayVersion::V3.word_count(4096), 410);
        assert_eq!(BitArrayVersion::V4.word_count(4096), 512);
        assert_eq!(BitArrayVersion::V16.next(), None);
    }

    #[test]
    fn palette_len_picks_narrowest() {
        assert_eq!(BitArrayVersion::for_palette_len(1), Some(BitArrayVersion::V0));
        assert_eq!(BitArrayVersion::for_palette_len(2), Some(BitArrayVersion::V1));
        assert_eq!(BitArrayVersion::for_palette_len(5), Some(BitArrayVersion::V3));
        assert_eq!(BitArrayVersion::for_palette_len(65), Some(BitArrayVersion::V8));
        assert_eq!(BitArrayVersion::for_palette_len(70_000), None);
    }

    #[test]
    fn every_width_stores_its_maximum() {
        for version in &BitArrayVersion::ALL[1..] {
            let mut array = BitArray::new(*version, 4096);
            let max = version.max_entry_value();
            for index in 0..4096 {
                array.set(index, (index as u32 * 7) & max);
            }
            array.set(4095, max);
            for index in 0..4095 {
                assert_eq!(array.get(index), (index as u32 * 7) & max, "{version:?} @ {index}");
            }
            assert_eq!(array.get(4095), max);
        }
    }

    #[test]
    fn padded_words_keep_top_bits_clear() {
        let mut array = BitArray::new(BitArrayVersion::V5, 4096);
        for index in 0..4096 {
            array.set(index, 31);
        }
        assert!(matches!(array, BitArray::Padded { .. }));
        assert!(array.words().iter().all(|w| w >> 30 == 0));
    }

    #[test]
    fn neighbours_are_untouched() {
        let mut array = BitArray::new(BitArrayVersion::V2, 64);
        array.set(15, 3);
        array.set(16, 1);
        assert_eq!(array.get(14), 0);
        assert_eq!(array.get(15), 3);
        assert_eq!(array.get(16), 1);
        assert_eq!(array.words()[0], 3 << 30);
        assert_eq!(array.words()[1], 1);
    }

    #[test]
    fn widening_keeps_values() {
        let mut array = BitArray::new(BitArrayVersion::V3, 100);
        for index in 0..100 {
            array.set(index, (index % 8) as u32);
        }
        let before = array.to_vec();
        let wide = array.widened(BitArrayVersion::V4);
        assert_eq!(wide.version(), BitArrayVersion::V4);
        assert_eq!(wide.to_vec(), before);
    }

    #[test]
    fn clones_do_not_alias() {
        let mut a = BitArray::new(BitArrayVersion::V4, 16);
        let b = a.clone();
        a.set(0, 9);
        assert_eq!(b.get(0), 0);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn out_of_range_index_panics() {
        BitArray::new(BitArrayVersion::V8, 4096).get(4096);
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn oversized_value_panics() {
        BitArray::new(BitArrayVersion::V1, 8).set(0, 2);
    }
}
