//! Type nodes.
//!
//! Types appear both in declarations written by the user (`int`, `bool`, a
//! class name, a function type for a parameter) and in the types computed by
//! the resolver and type checker (class types, method types, the type of
//! `null`, the incomplete marker).

use std::fmt;

/// A type node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// `int`
    Int,
    /// `bool`, a subtype of `int`.
    Bool,
    /// Function type: ordered parameter types and a return type.
    Arrow(ArrowType),
    /// A virtual method. Wraps the function type so methods can be told apart
    /// from plain functions at call sites.
    Method(ArrowType),
    /// The type recorded for a class declaration itself.
    Class(ClassType),
    /// A reference to an instance of the named class.
    Ref(String),
    /// The type of `null`.
    Empty,
    /// A type that could not be resolved. Never valid in a finished tree.
    Incomplete,
}

impl Type {
    /// Shorthand for a function type.
    pub fn arrow(params: Vec<Type>, ret: Type) -> Self {
        Type::Arrow(ArrowType::new(params, ret))
    }

    /// Shorthand for a class reference type.
    pub fn class_ref(name: impl Into<String>) -> Self {
        Type::Ref(name.into())
    }

    /// Returns the function type behind a plain function or a method.
    pub fn as_callable(&self) -> Option<&ArrowType> {
        match self {
            Type::Arrow(arrow) | Type::Method(arrow) => Some(arrow),
            _ => None,
        }
    }

    /// Whether this is the incomplete marker.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Type::Incomplete)
    }

    /// Whether this is a method type.
    pub fn is_method(&self) -> bool {
        matches!(self, Type::Method(_))
    }

    /// Whether the type, or any type nested in it, is the incomplete marker.
    pub fn contains_incomplete(&self) -> bool {
        match self {
            Type::Incomplete => true,
            Type::Arrow(arrow) | Type::Method(arrow) => arrow.contains_incomplete(),
            Type::Class(class) => {
                class.fields.iter().any(Type::contains_incomplete)
                    || class.methods.iter().any(ArrowType::contains_incomplete)
            }
            Type::Int | Type::Bool | Type::Ref(_) | Type::Empty => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("int"),
            Type::Bool => f.write_str("bool"),
            Type::Arrow(arrow) => write!(f, "{arrow}"),
            Type::Method(arrow) => write!(f, "method {arrow}"),
            Type::Class(class) => write!(
                f,
                "class {{{} fields, {} methods}}",
                class.fields.len(),
                class.methods.len()
            ),
            Type::Ref(name) => f.write_str(name),
            Type::Empty => f.write_str("null"),
            Type::Incomplete => f.write_str("<incomplete>"),
        }
    }
}

/// A function type `(T1, ..., Tn) -> T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrowType {
    pub params: Vec<Type>,
    pub ret: Box<Type>,
}

impl ArrowType {
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        Self {
            params,
            ret: Box::new(ret),
        }
    }

    fn contains_incomplete(&self) -> bool {
        self.ret.contains_incomplete() || self.params.iter().any(Type::contains_incomplete)
    }
}

impl fmt::Display for ArrowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

/// Layout of a class: every field type and every method type, including the
/// inherited ones.
///
/// The field with offset `-k` lives at `fields[k - 1]`, the method with offset
/// `k` at `methods[k]`. Subclasses extend a copy of their superclass's layout,
/// so indices never move across the hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassType {
    pub fields: Vec<Type>,
    pub methods: Vec<ArrowType>,
}

impl ClassType {
    /// Index into `fields` for a field offset.
    pub fn field_index(offset: i32) -> usize {
        (-offset - 1) as usize
    }

    /// Offset of the field stored at `index`.
    pub fn field_offset(index: usize) -> i32 {
        -(index as i32) - 1
    }

    /// Field type at a field offset.
    pub fn field_at(&self, offset: i32) -> Option<&Type> {
        if offset >= 0 {
            return None;
        }
        self.fields.get(Self::field_index(offset))
    }

    /// Method type at a method offset.
    pub fn method_at(&self, offset: i32) -> Option<&ArrowType> {
        usize::try_from(offset)
            .ok()
            .and_then(|index| self.methods.get(index))
    }
}
