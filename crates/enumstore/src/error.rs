#![forbid(unsafe_code)]

//! Error types for registry mutations.

use thiserror::Error;

use crate::entity::EnumId;

/// Crate result alias.
pub type Result<T> = std::result::Result<T, EnumsError>;

/// Recoverable failures raised by registry mutations.
///
/// Both variants are raised synchronously to the immediate caller and leave
/// the registry unchanged.
#[derive(Debug, Error)]
pub enum EnumsError {
    /// A symbol points at an identifier absent from the seed set.
    #[error("symbol `{name}` does not resolve to any seed enum (id {id})")]
    SymbolNotInSeed {
        /// Symbol name being assigned.
        name: String,
        /// Identifier that failed to resolve.
        id: EnumId,
    },

    /// A replacement dataset drops or alters a seed entry.
    #[error("updated enums do not retain seed entry {id} (`{value}`)")]
    SeedNotRetained {
        /// Identifier of the missing seed entry.
        id: EnumId,
        /// Value of the missing seed entry.
        value: String,
    },
}
