//! Collection policy flags.

bitflags::bitflags! {
    /// How non-numeric elements are treated while collecting a range.
    ///
    /// For each element kind the "ignore" bit wins over the "zero" bit. When
    /// neither applies the kind is strict: the first such element aborts the
    /// collection with an error.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    pub struct CollectFlags: u32 {
        // --- Strings ---
        /// Skip text.
        const IGNORE_STRINGS   = 1 << 0;
        /// Parse text as a number; unparsable text falls back to the other
        /// string bits, and is an error when none is set.
        const COERCE_STRINGS   = 1 << 1;
        /// Treat text as 0.
        const ZERO_STRINGS     = 1 << 2;

        // --- Booleans ---
        const IGNORE_BOOLS     = 1 << 4;
        /// TRUE → 1, FALSE → 0.
        const ZEROONE_BOOLS    = 1 << 5;

        // --- Errors ---
        const IGNORE_ERRORS    = 1 << 8;
        const ZERO_ERRORS      = 1 << 9;

        // --- Blanks ---
        const IGNORE_BLANKS    = 1 << 12;
        const ZERO_BLANKS      = 1 << 13;

        // --- Iteration ---
        /// Skip cells whose own formula is a subtotal.
        const IGNORE_SUBTOTAL  = 1 << 16;

        // --- Result shape ---
        /// Sort the collected values ascending.
        const SORT             = 1 << 20;
        /// The caller does not care about element order. Such requests may
        /// be served by a sorted result.
        const ORDER_IRRELEVANT = 1 << 21;
        /// Record the positions of skipped elements. Incompatible with `SORT`.
        const TRACK_MISSING    = 1 << 22;
    }
}

bitflags::bitflags! {
    /// Filters applied by the evaluator before a value reaches the collector.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct IterFlags: u8 {
        /// Do not visit blank cells at all.
        const IGNORE_BLANK    = 1 << 0;
        /// Do not visit cells holding a subtotal formula.
        const IGNORE_SUBTOTAL = 1 << 1;
    }
}

impl CollectFlags {
    /// The flags that take part in cache-key identity.
    ///
    /// `ORDER_IRRELEVANT` is dropped: an unordered request reuses whatever is
    /// cached under the same policy.
    pub fn key_bits(self) -> Self {
        self - CollectFlags::ORDER_IRRELEVANT
    }

    /// Whether a request with these flags may be served from or stored in a
    /// cache at all.
    pub fn cacheable(self) -> bool {
        !self.intersects(CollectFlags::TRACK_MISSING | CollectFlags::IGNORE_SUBTOTAL)
    }

    /// Iteration filters implied by this policy.
    ///
    /// Blanks are only filtered out up front when nobody needs their
    /// positions.
    pub fn iter_flags(self) -> IterFlags {
        let mut iter = IterFlags::empty();
        if self.contains(CollectFlags::IGNORE_BLANKS) && !self.contains(CollectFlags::TRACK_MISSING)
        {
            iter |= IterFlags::IGNORE_BLANK;
        }
        if self.contains(CollectFlags::IGNORE_SUBTOTAL) {
            iter |= IterFlags::IGNORE_SUBTOTAL;
        }
        iter
    }
}
