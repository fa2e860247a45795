/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains API and macros used by the verified-boot library for error
    handling.

--*/
#![cfg_attr(not(feature = "std"), no_std)]
use core::convert::From;
use core::num::{NonZeroU32, TryFromIntError};

/// Verified-boot error type.
///
/// A non-zero status word. Zero is reserved for success so that a raw status
/// read off the transport can be converted with `TryFrom<u32>`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VbootError(pub NonZeroU32);

/// Macro to define error constants ensuring uniqueness
///
/// This macro takes a list of (name, value, doc) tuples and generates
/// constant definitions for each error code.
#[macro_export]
macro_rules! define_error_constants {
    ($(($name:ident, $value:expr, $doc:expr)),* $(,)?) => {
        $(
            #[doc = $doc]
            pub const $name: VbootError = VbootError::new_const($value);
        )*

        #[cfg(test)]
        /// Returns a vector of all defined error constants for testing uniqueness
        pub fn all_constants() -> Vec<(& 'static str, u32)> {
            vec![
                $(
                    (stringify!($name), $value),
                )*
            ]
        }
    };
}

impl VbootError {
    /// Create a vboot error; intended to only be used from const contexts, as
    /// we don't want runtime panics if val is zero. The preferred way to get a
    /// VbootError from a u32 is to use `VbootError::try_from()` from the
    /// `TryFrom` trait impl.
    const fn new_const(val: u32) -> Self {
        match NonZeroU32::new(val) {
            Some(val) => Self(val),
            None => panic!("VbootError cannot be 0"),
        }
    }

    // Component ranges:
    //   0x0002_xxxx  TPM transport statuses
    //   0x0003_xxxx  rollback-index statuses
    define_error_constants![
        (TPM_IOERROR, 0x0002_0001, "TPM transport I/O failure"),
        (
            TPM_BAD_INDEX,
            0x0002_0002,
            "TPM Error: NV index is not defined"
        ),
        (
            TPM_MAX_NV_WRITES_EXCEEDED,
            0x0002_0003,
            "TPM Error: per-boot NV write limit exceeded"
        ),
        (
            TPM_AREA_LOCKED,
            0x0002_0004,
            "TPM Error: NV area is locked against writes"
        ),
        (
            TPM_BAD_LENGTH,
            0x0002_0005,
            "TPM Error: buffer length does not fit the NV space"
        ),
        (
            TPM_SPACE_ALREADY_DEFINED,
            0x0002_0006,
            "TPM Error: NV index is already defined"
        ),
        (
            TPM_DEACTIVATED,
            0x0002_0007,
            "TPM Error: command refused while deactivated"
        ),
        (
            TPM_SELF_TEST_FAILED,
            0x0002_0008,
            "TPM Error: self test reported failure"
        ),
        (
            ROLLBACK_MUST_REBOOT,
            0x0003_0001,
            "Rollback: TPM state corrected; the whole boot sequence must restart"
        ),
        (
            ROLLBACK_CORRUPTED_STATE,
            0x0003_0002,
            "Rollback Error: kernel versions space is corrupt or was redefined"
        ),
        (
            ROLLBACK_ALREADY_INITIALIZED,
            0x0003_0003,
            "Rollback Error: spaces exist but kernel recovery failed"
        ),
        (
            ROLLBACK_INTERNAL_INCONSISTENCY,
            0x0003_0004,
            "Rollback Error: backup version is ahead of the primary"
        ),
    ];
}

impl From<core::num::NonZeroU32> for crate::VbootError {
    fn from(val: core::num::NonZeroU32) -> Self {
        crate::VbootError(val)
    }
}

impl From<VbootError> for core::num::NonZeroU32 {
    fn from(val: VbootError) -> Self {
        val.0
    }
}

impl From<VbootError> for u32 {
    fn from(val: VbootError) -> Self {
        core::num::NonZeroU32::from(val).get()
    }
}

impl TryFrom<u32> for VbootError {
    type Error = TryFromIntError;
    fn try_from(val: u32) -> Result<Self, TryFromIntError> {
        match NonZeroU32::try_from(val) {
            Ok(val) => Ok(VbootError(val)),
            Err(err) => Err(err),
        }
    }
}

pub type VbootResult<T> = Result<T, VbootError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_try_from() {
        assert!(VbootError::try_from(0).is_err());
        assert_eq!(
            Ok(VbootError::TPM_BAD_INDEX),
            VbootError::try_from(0x0002_0002)
        );
    }

    #[test]
    fn test_error_constants_uniqueness() {
        let constants = VbootError::all_constants();
        let mut error_values = HashSet::new();
        let mut duplicates = Vec::new();

        for (name, value) in constants {
            if !error_values.insert(value) {
                duplicates.push((name, value));
            }
        }

        assert!(
            duplicates.is_empty(),
            "duplicate error codes: {duplicates:?}"
        );
    }
}
