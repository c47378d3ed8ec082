use thiserror::Error;

/// Result type for vmsim operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in vmsim
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A caller supplied a negative virtual address.
    ///
    /// Rejected before any translation arithmetic; signed division would
    /// silently yield a wrong page number.
    #[error("invalid virtual address {address}: addresses must be non-negative")]
    InvalidAddress {
        /// The rejected address.
        address: i64,
    },
}
