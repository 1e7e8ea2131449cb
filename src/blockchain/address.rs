//! Address format validation.
//!
//! Checks shape only: a version character followed by 55 base32 characters.
//! Checksums are verified later, when an identity is converted to XDR.

use crate::blockchain::types::{StellarError, StellarResult};

/// Length of an encoded account or contract identity.
pub const ADDRESS_LEN: usize = 56;

fn has_shape(s: &str, version: u8) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == ADDRESS_LEN
        && bytes[0] == version
        && bytes[1..]
            .iter()
            .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(b))
}

/// `G...` account identity.
pub fn is_account_address(s: &str) -> bool {
    has_shape(s, b'G')
}

/// `C...` contract identity.
pub fn is_contract_address(s: &str) -> bool {
    has_shape(s, b'C')
}

pub fn is_valid_address(s: &str) -> bool {
    is_account_address(s) || is_contract_address(s)
}

/// Fail with `InvalidAddress` unless `s` is an account or contract identity.
///
/// Callers run this before touching the rate limiter or the network.
pub fn assert_valid_address(s: &str) -> StellarResult<()> {
    if is_valid_address(s) {
        Ok(())
    } else {
        Err(StellarError::InvalidAddress(s.to_string()))
    }
}
