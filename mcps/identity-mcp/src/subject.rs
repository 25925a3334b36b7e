//! Caller input validation for lookup subjects

use crate::api::client::LookupKind;
use crate::error::{IdentityError, IdentityResult};

const MAX_HANDLE_LEN: usize = 15;

/// Validate and canonicalize one subject.
///
/// Addresses must be `0x` followed by 40 hex digits. Handles are accepted
/// with or without the leading `@` and always returned with it.
pub fn normalize_subject(kind: LookupKind, raw: &str) -> IdentityResult<String> {
    match kind {
        LookupKind::Address => normalize_address(raw),
        LookupKind::Handle => normalize_handle(raw),
    }
}

pub fn normalize_address(raw: &str) -> IdentityResult<String> {
    let address = raw.trim();
    let valid = address.len() == 42
        && (address.starts_with("0x") || address.starts_with("0X"))
        && address[2..].chars().all(|c| c.is_ascii_hexdigit());

    if !valid {
        return Err(IdentityError::Validation(format!(
            "'{}' is not a valid address (expected 0x followed by 40 hex digits)",
            address
        )));
    }
    Ok(format!("0x{}", &address[2..]))
}

pub fn normalize_handle(raw: &str) -> IdentityResult<String> {
    let handle = raw.trim().trim_start_matches('@');
    let valid = !handle.is_empty()
        && handle.len() <= MAX_HANDLE_LEN
        && handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid {
        return Err(IdentityError::Validation(format!(
            "'{}' is not a valid Twitter handle",
            raw.trim()
        )));
    }
    Ok(format!("@{}", handle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_validation() {
        let addr = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";
        assert_eq!(normalize_address(&format!("  {} ", addr)).unwrap(), addr);
        assert!(normalize_address("0x1234").is_err());
        assert!(normalize_address("7E5F4552091A69125d5DfCb7b8C2659029395Bdf00").is_err());
        assert!(normalize_address("0xZZ5F4552091A69125d5DfCb7b8C2659029395Bdf").is_err());
    }

    #[test]
    fn test_handle_gets_leading_at() {
        assert_eq!(normalize_handle("vitalik").unwrap(), "@vitalik");
        assert_eq!(normalize_handle("@vitalik").unwrap(), "@vitalik");
        assert_eq!(normalize_handle(" @dev_01 ").unwrap(), "@dev_01");
    }

    #[test]
    fn test_bad_handles() {
        assert!(matches!(
            normalize_handle("@").unwrap_err(),
            IdentityError::Validation(_)
        ));
        assert!(normalize_handle("has space").is_err());
        assert!(normalize_handle("waytoolonghandle123").is_err());
    }

    #[test]
    fn test_dispatch_by_kind() {
        assert_eq!(normalize_subject(LookupKind::Handle, "bob").unwrap(), "@bob");
        assert!(normalize_subject(LookupKind::Address, "bob").is_err());
    }
}
