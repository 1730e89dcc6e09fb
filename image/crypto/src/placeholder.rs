// Licensed under the Apache-2.0 license

use std::path::Path;

use anyhow::bail;
use bootimg_image_gen::ImageGeneratorCrypto;
use bootimg_image_types::*;

use crate::RustCryptoSha256Hasher;

/// Signer that emits an all-zero signature envelope.
///
/// Only compiled for tests and the `placeholder-signer` feature. Images it
/// signs must never pass verification.
#[derive(Default)]
pub struct PlaceholderCrypto {}

impl ImageGeneratorCrypto for PlaceholderCrypto {
    type Sha256Hasher = RustCryptoSha256Hasher;

    fn sha256_start(&self) -> Self::Sha256Hasher {
        crate::RustCrypto::default().sha256_start()
    }

    fn ecdsa256_sign(
        &self,
        _digest: &ImageDigest,
        _priv_key: &ImageEccPrivKey,
    ) -> anyhow::Result<ImageEccSignature> {
        log::warn!("Emitting placeholder signature");
        Ok(ImageEccSignature::default())
    }

    fn ecc_pub_key_from_pem(_path: &Path) -> anyhow::Result<ImageEccPubKey> {
        bail!("Placeholder crypto does not load keys")
    }

    fn ecc_priv_key_from_pem(_path: &Path) -> anyhow::Result<ImageEccPrivKey> {
        bail!("Placeholder crypto does not load keys")
    }
}
