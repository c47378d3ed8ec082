//! Virtual address decomposition

use super::PageNumber;
use crate::error::{Error, Result};

/// Split a virtual address into its (page number, offset) pair.
///
/// The virtual address space is unbounded above: any non-negative address
/// maps to some page. Negative addresses are a caller error and are
/// rejected before any arithmetic happens.
pub fn translate(address: i64, page_size: usize) -> Result<(PageNumber, usize)> {
    if address < 0 {
        return Err(Error::InvalidAddress { address });
    }
    let address = address as u64;
    let page_size = page_size as u64;
    Ok((address / page_size, (address % page_size) as usize))
}
