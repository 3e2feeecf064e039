//! Lexical scope tables.
//!
//! A stack of name tables, one per open scope: the program body, each
//! function or method body, and each class body. The index of a table in the
//! stack is its nesting level.

use fool_core::SymbolEntry;
use rustc_hash::FxHashMap;

/// Name table of one scope. A class's virtual table has the same shape.
pub type SymbolTable = FxHashMap<String, SymbolEntry>;

/// Stack of open scopes, innermost last.
#[derive(Debug, Default)]
pub struct ScopeStack {
    tables: Vec<SymbolTable>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Scope Management
    // ==========================================================================

    /// Open a new, empty scope.
    pub fn push_scope(&mut self) {
        self.tables.push(SymbolTable::default());
    }

    /// Open a scope pre-populated with `table` (a class body opens its
    /// virtual table this way).
    pub fn push_table(&mut self, table: SymbolTable) {
        self.tables.push(table);
    }

    /// Close the innermost scope.
    pub fn pop_scope(&mut self) -> Option<SymbolTable> {
        self.tables.pop()
    }

    /// Nesting level of the innermost scope (0 = program body).
    pub fn level(&self) -> u32 {
        self.tables.len().saturating_sub(1) as u32
    }

    // ==========================================================================
    // Declaration
    // ==========================================================================

    /// Declare `name` in the innermost scope.
    ///
    /// If the name is already declared there, the existing entry is kept and
    /// returned as the error.
    pub fn declare(&mut self, name: &str, entry: SymbolEntry) -> Result<(), SymbolEntry> {
        let Some(table) = self.tables.last_mut() else {
            return Err(entry);
        };
        if let Some(existing) = table.get(name) {
            return Err(existing.clone());
        }
        table.insert(name.to_string(), entry);
        Ok(())
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Find the innermost visible declaration of `name`.
    pub fn lookup(&self, name: &str) -> Option<&SymbolEntry> {
        self.tables.iter().rev().find_map(|table| table.get(name))
    }

    /// Find `name` in the global scope only.
    pub fn lookup_global(&self, name: &str) -> Option<&SymbolEntry> {
        self.tables.first().and_then(|table| table.get(name))
    }

    pub fn is_declared_in_current_scope(&self, name: &str) -> bool {
        self.tables
            .last()
            .map(|table| table.contains_key(name))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fool_core::Type;

    fn entry(level: u32, offset: i32) -> SymbolEntry {
        SymbolEntry::new(level, Type::Int, offset)
    }

    #[test]
    fn levels_follow_the_stack() {
        let mut scopes = ScopeStack::new();
        scopes.push_scope();
        assert_eq!(scopes.level(), 0);
        scopes.push_scope();
        assert_eq!(scopes.level(), 1);
        scopes.pop_scope();
        assert_eq!(scopes.level(), 0);
    }

    #[test]
    fn redeclaration_keeps_first() {
        let mut scopes = ScopeStack::new();
        scopes.push_scope();
        scopes.declare("x", entry(0, -2)).unwrap();

        let existing = scopes.declare("x", entry(0, -3)).unwrap_err();
        assert_eq!(existing.offset, -2);
        assert_eq!(scopes.lookup("x").map(|e| e.offset), Some(-2));
    }

    #[test]
    fn shadowing_resolves_innermost() {
        let mut scopes = ScopeStack::new();
        scopes.push_scope();
        scopes.declare("x", entry(0, -2)).unwrap();

        scopes.push_scope();
        scopes.declare("x", entry(1, 1)).unwrap();
        assert_eq!(scopes.lookup("x").map(|e| e.level), Some(1));
        assert_eq!(scopes.lookup_global("x").map(|e| e.level), Some(0));

        scopes.pop_scope();
        assert_eq!(scopes.lookup("x").map(|e| e.level), Some(0));
    }

    #[test]
    fn pop_removes_names() {
        let mut scopes = ScopeStack::new();
        scopes.push_scope();
        scopes.push_scope();
        scopes.declare("y", entry(1, -2)).unwrap();
        assert!(scopes.is_declared_in_current_scope("y"));
        scopes.pop_scope();
        assert!(scopes.lookup("y").is_none());
    }

    #[test]
    fn pushed_table_is_visible() {
        let mut scopes = ScopeStack::new();
        scopes.push_scope();
        let mut table = SymbolTable::default();
        table.insert("f".into(), entry(1, -1));
        scopes.push_table(table);
        assert_eq!(scopes.lookup("f").map(|e| e.offset), Some(-1));
    }
}
