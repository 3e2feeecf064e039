//! Label allocation and binding.
//!
//! Every branch target and every function or method entry point gets a fresh
//! label when it is first needed. Addresses are bound once the final layout
//! of the program is known.

use rustc_hash::FxHashMap;

/// A symbolic code address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(pub(crate) u32);

impl Label {
    pub fn id(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "label{}", self.0)
    }
}

/// Hands out fresh labels and records where they end up.
#[derive(Debug, Default)]
pub struct LabelTable {
    next: u32,
    addresses: FxHashMap<Label, usize>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A label distinct from every label handed out before.
    pub fn fresh(&mut self) -> Label {
        let label = Label(self.next);
        self.next += 1;
        label
    }

    /// Bind `label` to `address`. Returns `false` if it was already bound;
    /// the first binding is kept.
    pub fn bind(&mut self, label: Label, address: usize) -> bool {
        if self.addresses.contains_key(&label) {
            return false;
        }
        self.addresses.insert(label, address);
        true
    }

    pub fn address(&self, label: Label) -> Option<usize> {
        self.addresses.get(&label).copied()
    }
}
