//! Assignment compatibility between static types.

use decaf_core::DataType;

use crate::hierarchy::ClassHierarchy;

/// Whether a value of type `given` may be stored where `expected` is
/// required.
///
/// - an [`DataType::Error`] on either side is compatible, so one bad
///   subexpression is reported once
/// - a named type accepts `null`, itself, any subclass of the class it names
///   and any class implementing the interface it names
/// - an array type accepts `null` and arrays of an equivalent element type
/// - every other type accepts only itself
pub fn is_compatible(
    hierarchy: &ClassHierarchy<'_>,
    expected: &DataType,
    given: &DataType,
) -> bool {
    match (expected, given) {
        (DataType::Error, _) | (_, DataType::Error) => true,
        (DataType::Named(_) | DataType::Array(_), DataType::Null) => true,
        (DataType::Named(target), DataType::Named(source)) => {
            target == source
                || hierarchy.is_subclass_of(source, target)
                || hierarchy.implements(source, target)
        }
        (DataType::Array(_), DataType::Array(_)) => expected.is_equivalent_to(given),
        _ => expected == given,
    }
}

/// Whether two function signatures are interchangeable: same return type and
/// pairwise equivalent formal types.
pub fn signatures_match(
    ret_a: &DataType,
    formals_a: &[DataType],
    ret_b: &DataType,
    formals_b: &[DataType],
) -> bool {
    ret_a.is_equivalent_to(ret_b)
        && formals_a.len() == formals_b.len()
        && formals_a
            .iter()
            .zip(formals_b)
            .all(|(a, b)| a.is_equivalent_to(b))
}
