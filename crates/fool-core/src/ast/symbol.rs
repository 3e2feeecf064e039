//! Resolved-symbol records attached to use sites by the scope resolver.

use super::Type;

/// What the resolver knows about a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    /// Nesting level of the declaration.
    pub level: u32,
    /// Declared type.
    pub ty: Type,
    /// Storage offset, relative to the frame pointer of the declaring frame
    /// (or to the object pointer / dispatch pointer for class members).
    pub offset: i32,
}

impl SymbolEntry {
    pub fn new(level: u32, ty: Type, offset: i32) -> Self {
        Self { level, ty, offset }
    }
}

/// A resolved use: the declaration's entry plus the nesting level of the use
/// site, which together give the static-chain distance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub entry: SymbolEntry,
    pub use_level: u32,
}

impl Resolution {
    pub fn new(entry: SymbolEntry, use_level: u32) -> Self {
        Self { entry, use_level }
    }

    /// Number of access links to follow from the use site's frame to reach
    /// the declaring frame.
    pub fn hops(&self) -> u32 {
        self.use_level.saturating_sub(self.entry.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hops_is_level_difference() {
        let res = Resolution::new(SymbolEntry::new(1, Type::Int, -2), 3);
        assert_eq!(res.hops(), 2);

        let local = Resolution::new(SymbolEntry::new(2, Type::Int, 1), 2);
        assert_eq!(local.hops(), 0);
    }
}
