//! Read access to the blocks of a buffer
//!
//! The engine never owns the text. Whatever holds the lines implements
//! [`Blocks`] and the highlighter and indent engine read through it.

/// Indexed access to block text
pub trait Blocks {
    /// Number of blocks
    fn block_count(&self) -> usize;

    /// Text of the block at `index`, `None` past the end
    fn block_text(&self, index: usize) -> Option<&str>;

    /// Text of the block `offset` blocks away from `index`
    fn block_at_offset(&self, index: usize, offset: isize) -> Option<&str> {
        self.block_text(index.checked_add_signed(offset)?)
    }
}

impl<S: AsRef<str>> Blocks for [S] {
    fn block_count(&self) -> usize {
        self.len()
    }

    fn block_text(&self, index: usize) -> Option<&str> {
        self.get(index).map(AsRef::as_ref)
    }
}

impl<S: AsRef<str>> Blocks for Vec<S> {
    fn block_count(&self) -> usize {
        self.len()
    }

    fn block_text(&self, index: usize) -> Option<&str> {
        self.as_slice().block_text(index)
    }
}

impl<S: AsRef<str>, const N: usize> Blocks for [S; N] {
    fn block_count(&self) -> usize {
        N
    }

    fn block_text(&self, index: usize) -> Option<&str> {
        self.as_slice().block_text(index)
    }
}
