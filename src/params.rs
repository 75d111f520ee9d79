// Built-in deps
// External deps
// (none — tree parameters are plain data, no external crate needed)

/// Maximum supported tree height. An index is represented as `u64`, and the
/// recursive split needs a bit position within that range at every level.
pub const MAX_HEIGHT: u8 = 64;

/// Height of the canonical block/transaction/output partition (see
/// `TreeConfig::BLOCK_TX_OUTPUT`): 2^24 blocks, 2^20 transactions per block,
/// 2^4 outputs per transaction.
pub const BLOCK_PREFIX_BITS: u8 = 24;
pub const TRANSACTION_PREFIX_BITS: u8 = 20;
pub const OUTPUT_PREFIX_BITS: u8 = 4;

/// Fixed parameters of a tree instance: its height, and (informationally)
/// how that height is carved up into semantic address fields. Changing any
/// of these for an existing tree invalidates every root and proof computed
/// under the old configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    height: u8,
    /// Named index-field widths, most significant first. Purely
    /// documentation/validation: the tree engine itself only consumes `height`.
    fields: &'static [(&'static str, u8)],
}

impl TreeConfig {
    /// The partition used by the reference deployment: 24 bits of block id,
    /// 20 bits of transaction id, 4 bits of output id, for a height of 48.
    pub const BLOCK_TX_OUTPUT: TreeConfig = TreeConfig {
        height: BLOCK_PREFIX_BITS + TRANSACTION_PREFIX_BITS + OUTPUT_PREFIX_BITS,
        fields: &[
            ("block", BLOCK_PREFIX_BITS),
            ("transaction", TRANSACTION_PREFIX_BITS),
            ("output", OUTPUT_PREFIX_BITS),
        ],
    };

    /// Builds a tree configuration out of named, ordered address fields,
    /// checking that their combined width does not exceed `MAX_HEIGHT` and
    /// deriving the tree's height as their sum.
    ///
    /// # Panics
    /// Panics if `fields` is empty or the combined width exceeds `MAX_HEIGHT`.
    pub fn from_fields(fields: &'static [(&'static str, u8)]) -> Self {
        assert!(!fields.is_empty(), "a tree needs at least one index field");
        let height: u16 = fields.iter().map(|(_, bits)| *bits as u16).sum();
        assert!(
            height <= MAX_HEIGHT as u16,
            "combined field width {} exceeds MAX_HEIGHT {}",
            height,
            MAX_HEIGHT
        );
        Self {
            height: height as u8,
            fields,
        }
    }

    /// Builds an unnamed, single-field tree configuration of the given height.
    pub fn of_height(height: u8) -> Self {
        assert!(height >= 1 && height <= MAX_HEIGHT);
        Self { height, fields: &[] }
    }

    /// The tree's height: leaves live at level 0, the root at level `height`.
    pub fn height(&self) -> u8 {
        self.height
    }

    /// The named address fields this height is carved into, if any were supplied.
    pub fn fields(&self) -> &'static [(&'static str, u8)] {
        self.fields
    }

    /// Tree capacity: the number of addressable leaves, `2^height`.
    ///
    /// `2^64` does not fit in a `u64`, so a height-64 tree (the spec-permitted
    /// maximum) reports `u64::MAX` here rather than overflowing — every `u64`
    /// index is valid at that height regardless. Range checks against an
    /// arbitrary index should use [`TreeConfig::contains_index`], not compare
    /// directly against this value.
    pub fn capacity(&self) -> u64 {
        if self.height >= 64 {
            u64::MAX
        } else {
            1u64 << self.height
        }
    }

    /// Whether `index` addresses a valid leaf at this configuration's height.
    pub fn contains_index(&self, index: u64) -> bool {
        self.height >= 64 || index < self.capacity()
    }
}
