/*++

Licensed under the Apache-2.0 license.

File Name:

   lib.rs

Abstract:

    Boot Image Verification library.

--*/
#![cfg_attr(not(feature = "std"), no_std)]

mod verifier;

use bootimg_error::BootImageResult;
use bootimg_image_types::*;

pub use verifier::{ImageVerifier, Verification, VerificationState};

/// Verified image information
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ImageVerificationInfo {
    /// Boot type
    pub boot_type: BootType,

    /// Header format version
    pub version: u32,

    /// Load address
    pub load_addr: u32,

    /// Offset of the payload within the verified buffer
    pub payload_offset: usize,

    /// Length of the payload
    pub payload_size: u32,

    /// Digest of the signed image bytes
    pub digest: ImageDigest,
}

/// Image Verification Environment
///
/// Supplies the cryptographic primitives and the trusted key. Kept as a
/// trait so a bootloader can back it with hardware accelerators.
pub trait ImageVerificationEnv {
    /// Calculate SHA-256 Digest
    fn sha256_digest(&mut self, data: &[u8]) -> BootImageResult<ImageDigest>;

    /// Perform ECDSA P-256 Verification
    fn ecdsa256_verify(
        &mut self,
        digest: &ImageDigest,
        pub_key: &ImageEccPubKey,
        sig: &ImageEccSignature,
    ) -> BootImageResult<bool>;

    /// Get the trusted Vendor Public Key
    fn vendor_pub_key(&self) -> ImageEccPubKey;
}
