/*++

Licensed under the Apache-2.0 license.

File Name:

   generator.rs

Abstract:

    Boot image generator and signer

--*/
use bootimg_error::{BootImageError, BootImageResult};
use bootimg_image_types::*;

use crate::*;

/// Image generator
pub struct ImageGenerator<Crypto: ImageGeneratorCrypto> {
    crypto: Crypto,
}

impl<Crypto: ImageGeneratorCrypto> ImageGenerator<Crypto> {
    /// Create an instance `ImageGenerator`
    pub fn new(crypto: Crypto) -> Self {
        Self { crypto }
    }

    /// Generate an unsigned image
    ///
    /// # Arguments
    ///
    /// * `payload` - Raw payload bytes
    /// * `config` - Image generator configuration
    ///
    /// # Returns
    ///
    /// * `BootImage` - Unsigned boot image
    pub fn generate(
        &self,
        payload: &[u8],
        config: &ImageGeneratorConfig,
    ) -> BootImageResult<BootImage> {
        build_with_config(payload, config)
    }

    /// Generate and sign an image in one step
    pub fn generate_signed(
        &self,
        payload: &[u8],
        config: &ImageGeneratorConfig,
        priv_key: &ImageEccPrivKey,
    ) -> BootImageResult<SignedBootImage> {
        let image = self.generate(payload, config)?;
        self.sign(&image.to_bytes(), priv_key)
    }

    /// Sign a serialized image
    ///
    /// The digest covers the whole image, header included, so the load
    /// address, boot type and version are bound to the signature.
    ///
    /// # Arguments
    ///
    /// * `image` - Unsigned image bytes (header and payload)
    /// * `priv_key` - Signing key
    ///
    /// # Returns
    ///
    /// * `SignedBootImage` - Image with the signature envelope attached
    pub fn sign(
        &self,
        image: &[u8],
        priv_key: &ImageEccPrivKey,
    ) -> BootImageResult<SignedBootImage> {
        self.sign_with_digest(image, priv_key).map(|(signed, _)| signed)
    }

    /// Sign a serialized image and return the digest that was signed
    pub fn sign_with_digest(
        &self,
        image: &[u8],
        priv_key: &ImageEccPrivKey,
    ) -> BootImageResult<(SignedBootImage, ImageDigest)> {
        let header = parse_header(image)?;

        let digest = self.image_digest(image)?;

        let signature = self
            .crypto
            .ecdsa256_sign(&digest, priv_key)
            .map_err(|err| {
                log::error!("Signing failed: {err:#}");
                BootImageError::IMAGE_GEN_SIGNING_FAILED
            })?;

        log::debug!("Signed image ({} bytes)", image.len());

        let signed = SignedBootImage {
            image: BootImage {
                header,
                payload: image[header.payload_range()].to_vec(),
            },
            signature,
        };
        Ok((signed, digest))
    }

    /// Calculate the digest that gets signed
    pub fn image_digest(&self, image: &[u8]) -> BootImageResult<ImageDigest> {
        self.crypto.sha256_digest(image).map_err(|err| {
            log::error!("Image digest failed: {err:#}");
            BootImageError::IMAGE_GEN_SIGNING_FAILED
        })
    }
}
