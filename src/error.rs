use crate::descriptor::TypeDescriptor;
use thiserror::Error;

/// Errors that can occur when casting values through keys or using a `TypeMap`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// A value failed the key's base descriptor or one of its extra capabilities
    #[error("Key {key} rejected value of type {actual}: Does not {}", .failed.requirement())]
    TypeMismatch {
        /// Display name of the rejecting key
        key: String,
        /// Short runtime type name of the rejected value
        actual: String,
        /// The first descriptor the value failed
        failed: TypeDescriptor,
    },

    /// The key registry was declared inconsistently
    #[error("Invalid key registry: {0}")]
    Configuration(String),

    /// A typed accessor found its variant bound to a different base type
    #[error("Type {expected} incorrect for {key}")]
    AccessorInvariant {
        /// Display name of the key
        key: String,
        /// The descriptor the accessor's value type requires
        expected: TypeDescriptor,
    },

    /// A consumer received an argument of a type it cannot accept
    #[error("Consumer expected argument of type {expected}, got {actual}")]
    ArgumentMismatch {
        /// Short type name the consumer accepts
        expected: String,
        /// Short type name of the argument it was given
        actual: String,
    },
}
