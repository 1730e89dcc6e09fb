/*++

Licensed under the Apache-2.0 license.

File Name:

   lib.rs

Abstract:

    File contains data structures for the Boot Image Generator.

--*/

mod generator;

pub use generator::ImageGenerator;

use bootimg_error::{BootImageError, BootImageResult};
use bootimg_image_types::*;
use std::path::Path;
use zerocopy::little_endian::U32;

pub trait ImageGeneratorHasher {
    type Output: Copy;

    fn update(&mut self, data: &[u8]);

    fn finish(self) -> Self::Output;
}

/// Image Generator Crypto Trait
///
/// Signing capability used by [`ImageGenerator`]. Implementations must
/// produce a real asymmetric signature.
pub trait ImageGeneratorCrypto {
    type Sha256Hasher: ImageGeneratorHasher<Output = ImageDigest>;

    fn sha256_start(&self) -> Self::Sha256Hasher;

    /// Calculate SHA-256 digest
    fn sha256_digest(&self, data: &[u8]) -> anyhow::Result<ImageDigest> {
        let mut hasher = self.sha256_start();
        hasher.update(data);
        Ok(hasher.finish())
    }

    /// Calculate ECDSA P-256 Signature over a prehashed digest
    fn ecdsa256_sign(
        &self,
        digest: &ImageDigest,
        priv_key: &ImageEccPrivKey,
    ) -> anyhow::Result<ImageEccSignature>;

    /// Read ECC P-256 Public Key from PEM file
    fn ecc_pub_key_from_pem(path: &Path) -> anyhow::Result<ImageEccPubKey>;

    /// Read ECC P-256 Private Key from PEM file
    fn ecc_priv_key_from_pem(path: &Path) -> anyhow::Result<ImageEccPrivKey>;
}

/// Image Generator Configuration
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ImageGeneratorConfig {
    /// Address the payload is loaded at
    pub load_addr: u32,

    /// Raw boot type tag, validated while building
    pub boot_type: u32,

    /// Header format version
    pub version: u32,
}

impl Default for ImageGeneratorConfig {
    fn default() -> Self {
        Self {
            load_addr: DEFAULT_LOAD_ADDR,
            boot_type: BootType::Primary.into(),
            version: BOOT_IMAGE_VERSION,
        }
    }
}

/// Build an unsigned boot image from a raw payload.
///
/// Pure and deterministic: the header records the exact payload size and
/// additive checksum.
pub fn build(payload: &[u8], load_addr: u32, boot_type: u32) -> BootImageResult<BootImage> {
    let config = ImageGeneratorConfig {
        load_addr,
        boot_type,
        ..Default::default()
    };
    build_with_config(payload, &config)
}

/// Build an unsigned boot image using an explicit configuration
pub fn build_with_config(
    payload: &[u8],
    config: &ImageGeneratorConfig,
) -> BootImageResult<BootImage> {
    if payload.is_empty() {
        return Err(BootImageError::IMAGE_GEN_PAYLOAD_EMPTY);
    }

    let payload_size = payload_size(payload.len())?;

    let boot_type = BootType::try_from(config.boot_type)?;

    if !SUPPORTED_VERSION_MAJORS.contains(&((config.version >> 16) as u16)) {
        return Err(BootImageError::IMAGE_HEADER_UNSUPPORTED_VERSION);
    }

    let header = BootImageHeader {
        magic: U32::new(BOOT_IMAGE_MAGIC),
        version: U32::new(config.version),
        boot_type: U32::new(boot_type.into()),
        load_addr: U32::new(config.load_addr),
        payload_size: U32::new(payload_size),
        checksum: U32::new(checksum(payload)),
    };

    log::info!(
        "Built {} image: payload {} bytes, load address 0x{:08X}, checksum 0x{:08X}",
        boot_type.name(),
        payload_size,
        config.load_addr,
        header.checksum.get()
    );

    Ok(BootImage {
        header,
        payload: payload.to_vec(),
    })
}

/// Payload length as the header's 32-bit size field
fn payload_size(len: usize) -> BootImageResult<u32> {
    u32::try_from(len).map_err(|_| BootImageError::IMAGE_GEN_PAYLOAD_TOO_LARGE)
}
