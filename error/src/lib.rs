/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains API and macros used by the boot image libraries for error
    handling.

--*/
#![cfg_attr(not(feature = "std"), no_std)]
use core::convert::From;
use core::num::{NonZeroU32, TryFromIntError};

/// Boot Image Error Type
/// Derives debug, copy, clone, eq, and partial eq
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BootImageError(pub NonZeroU32);

/// Stage of image processing an error belongs to.
///
/// The stage is encoded in the upper 16 bits of every error code.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorStage {
    /// Bad magic, wrong size, unsupported version or unknown enum value
    Structural,

    /// Payload checksum mismatch
    Integrity,

    /// Signature invalid or could not be checked
    Authenticity,

    /// Input rejected while building or signing an image
    Build,

    /// Code outside of the known stage ranges
    Unknown,
}

impl ErrorStage {
    pub const fn name(&self) -> &'static str {
        match self {
            ErrorStage::Structural => "structural",
            ErrorStage::Integrity => "integrity",
            ErrorStage::Authenticity => "authenticity",
            ErrorStage::Build => "build",
            ErrorStage::Unknown => "unknown",
        }
    }
}

/// Macro to define error constants ensuring uniqueness
///
/// This macro takes a list of (name, value, doc) tuples and generates
/// constant definitions for each error code, plus a lookup from a code back
/// to its name.
#[macro_export]
macro_rules! define_error_constants {
    ($(($name:ident, $value:literal, $doc:expr)),* $(,)?) => {
        $(
            #[doc = $doc]
            pub const $name: BootImageError = BootImageError::new_const($value);
        )*

        /// Returns the constant name of this error, if it is a known code
        pub fn name(&self) -> Option<&'static str> {
            match self.0.get() {
                $(
                    $value => Some(stringify!($name)),
                )*
                _ => None,
            }
        }

        #[cfg(test)]
        /// Returns a vector of all defined error constants for testing uniqueness
        pub fn all_constants() -> Vec<(&'static str, u32)> {
            vec![
                $(
                    (stringify!($name), $value),
                )*
            ]
        }
    };
}

impl BootImageError {
    /// Create an error; intended to only be used from const contexts, as we don't want
    /// runtime panics if val is zero. The preferred way to get a BootImageError from a u32 is to
    /// use `BootImageError::try_from()` from the `TryFrom` trait impl.
    const fn new_const(val: u32) -> Self {
        match NonZeroU32::new(val) {
            Some(val) => Self(val),
            None => panic!("BootImageError cannot be 0"),
        }
    }

    /// Stage this error was raised in
    pub const fn stage(&self) -> ErrorStage {
        match self.0.get() >> 16 {
            0x0001 => ErrorStage::Structural,
            0x0002 => ErrorStage::Integrity,
            0x0003 => ErrorStage::Authenticity,
            0x0004 => ErrorStage::Build,
            _ => ErrorStage::Unknown,
        }
    }

    define_error_constants![
        (
            IMAGE_HEADER_TOO_SHORT,
            0x0001_0001,
            "Buffer is shorter than the image header (and envelope)"
        ),
        (
            IMAGE_HEADER_BAD_MAGIC,
            0x0001_0002,
            "Header magic does not match"
        ),
        (
            IMAGE_HEADER_UNSUPPORTED_VERSION,
            0x0001_0003,
            "Header major version is not supported"
        ),
        (
            IMAGE_HEADER_INVALID_BOOT_TYPE,
            0x0001_0004,
            "Header boot type is not a recognized value"
        ),
        (
            IMAGE_HEADER_SIZE_MISMATCH,
            0x0001_0005,
            "Header payload size does not match the bytes following the header"
        ),
        (
            IMAGE_CHECKSUM_MISMATCH,
            0x0002_0001,
            "Payload checksum does not match the header"
        ),
        (
            IMAGE_SIGNATURE_INVALID,
            0x0003_0001,
            "Signature does not match the image digest"
        ),
        (
            IMAGE_SIGNATURE_VERIFY_FAILURE,
            0x0003_0002,
            "Signature verification primitive failed"
        ),
        (
            IMAGE_DIGEST_FAILURE,
            0x0003_0003,
            "Image digest calculation failed"
        ),
        (
            IMAGE_PUB_KEY_INVALID,
            0x0003_0004,
            "Public key is not a valid curve point"
        ),
        (
            IMAGE_GEN_PAYLOAD_EMPTY,
            0x0004_0001,
            "Payload is empty"
        ),
        (
            IMAGE_GEN_PAYLOAD_TOO_LARGE,
            0x0004_0002,
            "Payload does not fit a 32-bit size"
        ),
        (
            IMAGE_GEN_SIGNING_FAILED,
            0x0004_0003,
            "Signing primitive failed"
        ),
    ];
}

impl From<core::num::NonZeroU32> for crate::BootImageError {
    fn from(val: core::num::NonZeroU32) -> Self {
        crate::BootImageError(val)
    }
}

impl From<BootImageError> for core::num::NonZeroU32 {
    fn from(val: BootImageError) -> Self {
        val.0
    }
}

impl From<BootImageError> for u32 {
    fn from(val: BootImageError) -> Self {
        core::num::NonZeroU32::from(val).get()
    }
}

impl TryFrom<u32> for BootImageError {
    type Error = TryFromIntError;
    fn try_from(val: u32) -> Result<Self, TryFromIntError> {
        match NonZeroU32::try_from(val) {
            Ok(val) => Ok(BootImageError(val)),
            Err(err) => Err(err),
        }
    }
}

impl core::fmt::Display for BootImageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let stage = self.stage().name();
        let code = self.0.get();
        match self.name() {
            Some(name) => write!(f, "{stage} error {name} (0x{code:08x})"),
            None => write!(f, "{stage} error 0x{code:08x}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BootImageError {}

pub type BootImageResult<T> = Result<T, BootImageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_try_from() {
        assert!(BootImageError::try_from(0).is_err());
        assert_eq!(
            Ok(BootImageError::IMAGE_HEADER_BAD_MAGIC),
            BootImageError::try_from(0x0001_0002)
        );
    }

    #[test]
    fn test_error_constants_uniqueness() {
        let constants = BootImageError::all_constants();
        let mut error_values = HashSet::new();
        let mut duplicates = Vec::new();

        for (name, value) in constants {
            if !error_values.insert(value) {
                duplicates.push((name, value));
            }
        }

        assert!(
            duplicates.is_empty(),
            "Found duplicate error codes: {:?}",
            duplicates
        );
    }

    #[test]
    fn test_stage() {
        assert_eq!(
            BootImageError::IMAGE_HEADER_SIZE_MISMATCH.stage(),
            ErrorStage::Structural
        );
        assert_eq!(
            BootImageError::IMAGE_CHECKSUM_MISMATCH.stage(),
            ErrorStage::Integrity
        );
        assert_eq!(
            BootImageError::IMAGE_SIGNATURE_INVALID.stage(),
            ErrorStage::Authenticity
        );
        assert_eq!(
            BootImageError::IMAGE_GEN_SIGNING_FAILED.stage(),
            ErrorStage::Build
        );
        assert_eq!(
            BootImageError::try_from(0x00ff_0001).unwrap().stage(),
            ErrorStage::Unknown
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            BootImageError::IMAGE_CHECKSUM_MISMATCH.to_string(),
            "integrity error IMAGE_CHECKSUM_MISMATCH (0x00020001)"
        );
        assert_eq!(
            BootImageError::try_from(0x0003_00ff).unwrap().to_string(),
            "authenticity error 0x000300ff"
        );
    }
}
