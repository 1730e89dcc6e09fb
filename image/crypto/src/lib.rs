/*++

Licensed under the Apache-2.0 license.

File Name:

   lib.rs

Abstract:

    File contains crypto utilities needed to generate and verify images.

--*/

mod rustcrypto;

#[cfg(any(test, feature = "placeholder-signer"))]
mod placeholder;

use std::path::Path;

use bootimg_image_gen::ImageGeneratorCrypto;
use bootimg_image_types::*;

#[cfg(any(test, feature = "placeholder-signer"))]
pub use placeholder::PlaceholderCrypto;
pub use rustcrypto::{ecc_pub_key_from_priv_key, RustCrypto, RustCryptoEnv, RustCryptoSha256Hasher};

/// Read ECC P-256 Public Key from PEM file
pub fn ecc_pub_key_from_pem(path: &Path) -> anyhow::Result<ImageEccPubKey> {
    RustCrypto::ecc_pub_key_from_pem(path)
}

/// Read ECC P-256 Private Key from PEM file
pub fn ecc_priv_key_from_pem(path: &Path) -> anyhow::Result<ImageEccPrivKey> {
    RustCrypto::ecc_priv_key_from_pem(path)
}
