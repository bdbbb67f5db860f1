//! Lifecycle flags.

use bitflags::bitflags;

bitflags! {
    /// Lifecycle flags of a block.
    ///
    /// The bits are independent; the observable block states are derived
    /// from their combinations:
    ///
    /// | flags               | state          |
    /// |---------------------|----------------|
    /// | `DIRTY`             | fresh          |
    /// | `DIRTY \| UPDATING` | rendering      |
    /// | `MOUNTED`           | mounted, clean |
    /// | `MOUNTED \| DIRTY`  | mounted, dirty |
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BlockFlags: u8 {
        /// Committed to the node tree
        const MOUNTED = 1 << 0;
        /// Props changed since the last render
        const DIRTY = 1 << 1;
        /// A render is scheduled or in progress
        const UPDATING = 1 << 2;
    }
}

impl BlockFlags {
    /// Whether a scheduled update should still render.
    #[inline]
    pub fn is_renderable(self) -> bool {
        self.contains(Self::MOUNTED | Self::UPDATING)
    }
}
