//! Single-inheritance class hierarchy.
//!
//! Built by the scope resolver as classes are declared and read by the type
//! checker for subtyping and joins.

use rustc_hash::FxHashMap;

/// Map from class name to its direct superclass.
#[derive(Debug, Clone, Default)]
pub struct ClassHierarchy {
    parents: FxHashMap<String, Option<String>>,
}

impl ClassHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a class. Returns `false` if the class was already known, in
    /// which case the first record is kept.
    pub fn declare(&mut self, class: impl Into<String>, parent: Option<String>) -> bool {
        let class = class.into();
        if self.parents.contains_key(&class) {
            return false;
        }
        self.parents.insert(class, parent);
        true
    }

    pub fn contains(&self, class: &str) -> bool {
        self.parents.contains_key(class)
    }

    pub fn parent(&self, class: &str) -> Option<&str> {
        self.parents.get(class).and_then(|p| p.as_deref())
    }

    /// The class itself followed by each ancestor, nearest first.
    pub fn ancestors<'a>(&'a self, class: &'a str) -> Ancestors<'a> {
        Ancestors {
            hierarchy: self,
            next: Some(class),
            remaining: self.parents.len() + 1,
        }
    }

    /// Whether `ancestor` is `class` or appears on its superclass chain.
    pub fn is_ancestor(&self, ancestor: &str, class: &str) -> bool {
        self.ancestors(class).any(|c| c == ancestor)
    }
}

/// Iterator over a superclass chain.
pub struct Ancestors<'a> {
    hierarchy: &'a ClassHierarchy,
    next: Option<&'a str>,
    // Bounds the walk so a malformed map can never loop forever.
    remaining: usize,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.next?;
        self.next = self.hierarchy.parent(current);
        Some(current)
    }
}
