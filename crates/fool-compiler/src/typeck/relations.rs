//! Subtyping and least upper bound.

use fool_core::{ArrowType, ClassHierarchy, Type};

/// Whether `a` is a subtype of `b` under `hierarchy`.
///
/// - `bool <: int`
/// - a class reference is a subtype of every ancestor's reference
/// - `null` is a subtype of every type
/// - function and method types are contravariant in their parameters and
///   covariant in the return type; arities must match
/// - otherwise two types are related only if they are the same kind of type
pub fn is_subtype(a: &Type, b: &Type, hierarchy: &ClassHierarchy) -> bool {
    match (a, b) {
        (Type::Empty, _) => true,
        (Type::Bool, Type::Int) => true,
        (Type::Ref(sub), Type::Ref(sup)) => hierarchy.is_ancestor(sup, sub),
        (Type::Arrow(sub), Type::Arrow(sup)) | (Type::Method(sub), Type::Method(sup)) => {
            arrow_subtype(sub, sup, hierarchy)
        }
        (Type::Incomplete, _) | (_, Type::Incomplete) => false,
        _ => std::mem::discriminant(a) == std::mem::discriminant(b),
    }
}

fn arrow_subtype(sub: &ArrowType, sup: &ArrowType, hierarchy: &ClassHierarchy) -> bool {
    sub.params.len() == sup.params.len()
        && is_subtype(&sub.ret, &sup.ret, hierarchy)
        && sub
            .params
            .iter()
            .zip(&sup.params)
            .all(|(sub_param, sup_param)| is_subtype(sup_param, sub_param, hierarchy))
}

/// Least upper bound of two types, if they have one.
///
/// For two class references this is the nearest ancestor of `a` (itself
/// included) that `b` is a subtype of.
pub fn join(a: &Type, b: &Type, hierarchy: &ClassHierarchy) -> Option<Type> {
    match (a, b) {
        (Type::Incomplete, _) | (_, Type::Incomplete) => None,
        _ if a == b => Some(a.clone()),
        (Type::Empty, other) | (other, Type::Empty) => Some(other.clone()),
        (Type::Ref(left), Type::Ref(_)) => hierarchy
            .ancestors(left)
            .map(|candidate| Type::Ref(candidate.to_string()))
            .find(|candidate| is_subtype(b, candidate, hierarchy)),
        (Type::Int | Type::Bool, Type::Int | Type::Bool) => Some(Type::Int),
        _ => None,
    }
}
