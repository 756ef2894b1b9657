//! Static types computed by the checker.
//!
//! [`DataType`] is the semantic counterpart of a type expression in the AST:
//! named types are reduced to their class or interface name and array types
//! to their element type. Assignment compatibility needs the class hierarchy
//! and therefore lives in the compiler crate; everything here is structural.

use std::fmt;

/// Size in bytes of every value the back end handles (ints, bools, pointers).
pub const WORD_SIZE: i32 = 4;

/// A static type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 32-bit integer.
    Int,
    /// Double-precision float (checked, not supported by the back end).
    Double,
    /// Boolean.
    Bool,
    /// String reference.
    String,
    /// No value.
    Void,
    /// Type of the `null` literal.
    Null,
    /// A class or interface, by name.
    Named(String),
    /// Array of the boxed element type.
    Array(Box<DataType>),
    /// Marker for an expression whose type could not be determined.
    ///
    /// Checks involving an `Error` operand are skipped so one mistake is
    /// reported once.
    Error,
}

impl DataType {
    /// Array type with the given element type.
    pub fn array_of(elem: DataType) -> Self {
        DataType::Array(Box::new(elem))
    }

    /// Named type for a class or interface.
    pub fn named(name: impl Into<String>) -> Self {
        DataType::Named(name.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, DataType::Error)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, DataType::Array(_))
    }

    /// The class or interface name of a named type.
    pub fn name(&self) -> Option<&str> {
        match self {
            DataType::Named(name) => Some(name),
            _ => None,
        }
    }

    /// Structural equivalence: same primitive, same class name, or arrays
    /// of equivalent element types.
    pub fn is_equivalent_to(&self, other: &DataType) -> bool {
        match (self, other) {
            (DataType::Array(a), DataType::Array(b)) => a.is_equivalent_to(b),
            (DataType::Named(a), DataType::Named(b)) => a == b,
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => f.write_str("int"),
            DataType::Double => f.write_str("double"),
            DataType::Bool => f.write_str("bool"),
            DataType::String => f.write_str("string"),
            DataType::Void => f.write_str("void"),
            DataType::Null => f.write_str("null"),
            DataType::Named(name) => f.write_str(name),
            DataType::Array(elem) => write!(f, "{elem}[]"),
            DataType::Error => f.write_str("error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_nested_arrays() {
        let t = DataType::array_of(DataType::array_of(DataType::named("Dog")));
        assert_eq!(t.to_string(), "Dog[][]");
    }

    #[test]
    fn equivalence_is_structural() {
        assert!(DataType::array_of(DataType::Int).is_equivalent_to(&DataType::array_of(DataType::Int)));
        assert!(!DataType::array_of(DataType::Int).is_equivalent_to(&DataType::array_of(DataType::Bool)));
        assert!(DataType::named("A").is_equivalent_to(&DataType::named("A")));
        assert!(!DataType::named("A").is_equivalent_to(&DataType::named("B")));
        assert!(!DataType::Int.is_equivalent_to(&DataType::Double));
    }

    #[test]
    fn accessors() {
        let arr = DataType::array_of(DataType::String);
        assert!(arr.is_array());
        assert_eq!(arr.name(), None);
        assert_eq!(DataType::named("Cat").name(), Some("Cat"));
        assert!(DataType::Error.is_error());
    }
}
