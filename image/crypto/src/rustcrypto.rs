/*++

Licensed under the Apache-2.0 license.

File Name:

   rustcrypto.rs

Abstract:

    ECDSA P-256 / SHA-256 signing and verification backed by RustCrypto.

--*/

use std::path::Path;

use anyhow::{anyhow, Context};

use bootimg_error::{BootImageError, BootImageResult};
use bootimg_image_gen::{ImageGeneratorCrypto, ImageGeneratorHasher};
use bootimg_image_types::*;
use bootimg_image_verify::ImageVerificationEnv;

use p256::{
    ecdsa::{
        signature::hazmat::{PrehashSigner, PrehashVerifier},
        Signature, SigningKey, VerifyingKey,
    },
    elliptic_curve::sec1::ToEncodedPoint,
    pkcs8::{DecodePrivateKey, DecodePublicKey},
    EncodedPoint, PublicKey, SecretKey,
};
use sha2::{Digest, Sha256};

#[derive(Default)]
pub struct RustCrypto {}

pub struct RustCryptoSha256Hasher(Sha256);

impl ImageGeneratorHasher for RustCryptoSha256Hasher {
    type Output = ImageDigest;

    fn update(&mut self, data: &[u8]) {
        self.0.update(data)
    }

    fn finish(self) -> Self::Output {
        self.0.finalize().into()
    }
}

impl ImageGeneratorCrypto for RustCrypto {
    type Sha256Hasher = RustCryptoSha256Hasher;

    fn sha256_start(&self) -> Self::Sha256Hasher {
        RustCryptoSha256Hasher(Sha256::default())
    }

    fn ecdsa256_sign(
        &self,
        digest: &ImageDigest,
        priv_key: &ImageEccPrivKey,
    ) -> anyhow::Result<ImageEccSignature> {
        let key = SigningKey::from_slice(&priv_key.0)?;
        let sig: Signature = key.sign_prehash(digest)?;
        let (r, s) = sig.split_bytes();

        let image_sig = ImageEccSignature {
            r: r.into(),
            s: s.into(),
        };
        Ok(image_sig)
    }

    fn ecc_pub_key_from_pem(path: &Path) -> anyhow::Result<ImageEccPubKey> {
        let key_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read public key PEM file {}", path.display()))?;

        let pub_key = PublicKey::from_public_key_pem(key_str.trim())
            .with_context(|| format!("Failed to parse public key PEM file {}", path.display()))?
            .to_encoded_point(false);

        let x = pub_key.x().ok_or(anyhow!("Error parsing x coordinate"))?;
        let y = pub_key.y().ok_or(anyhow!("Error parsing y coordinate"))?;

        let image_key = ImageEccPubKey {
            x: (*x).into(),
            y: (*y).into(),
        };
        Ok(image_key)
    }

    fn ecc_priv_key_from_pem(path: &Path) -> anyhow::Result<ImageEccPrivKey> {
        let key_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read private key PEM file {}", path.display()))?;

        // PKCS#8 first, then the SEC1 "EC PRIVATE KEY" form
        let key = SecretKey::from_pkcs8_pem(key_str.trim())
            .or_else(|_| SecretKey::from_sec1_pem(key_str.trim()))
            .with_context(|| format!("Failed to parse private key PEM file {}", path.display()))?;

        Ok(ImageEccPrivKey(key.to_bytes().into()))
    }
}

/// Derive the public key matching a private key
pub fn ecc_pub_key_from_priv_key(priv_key: &ImageEccPrivKey) -> anyhow::Result<ImageEccPubKey> {
    let key = SigningKey::from_slice(&priv_key.0)?;
    let point = key.verifying_key().to_encoded_point(false);
    let x = point.x().ok_or(anyhow!("Error parsing x coordinate"))?;
    let y = point.y().ok_or(anyhow!("Error parsing y coordinate"))?;
    Ok(ImageEccPubKey {
        x: (*x).into(),
        y: (*y).into(),
    })
}

fn verifying_key(pub_key: &ImageEccPubKey) -> BootImageResult<VerifyingKey> {
    let point = EncodedPoint::from_affine_coordinates(&pub_key.x.into(), &pub_key.y.into(), false);
    VerifyingKey::from_encoded_point(&point).map_err(|_| BootImageError::IMAGE_PUB_KEY_INVALID)
}

/// Software verification environment holding the trusted public key
pub struct RustCryptoEnv {
    pub_key: ImageEccPubKey,
}

impl RustCryptoEnv {
    /// Create an environment trusting `pub_key`
    ///
    /// Fails with `IMAGE_PUB_KEY_INVALID` if the key is not a point on P-256.
    pub fn new(pub_key: ImageEccPubKey) -> BootImageResult<Self> {
        verifying_key(&pub_key)?;
        Ok(Self { pub_key })
    }
}

impl ImageVerificationEnv for RustCryptoEnv {
    fn sha256_digest(&mut self, data: &[u8]) -> BootImageResult<ImageDigest> {
        Ok(Sha256::digest(data).into())
    }

    fn ecdsa256_verify(
        &mut self,
        digest: &ImageDigest,
        pub_key: &ImageEccPubKey,
        sig: &ImageEccSignature,
    ) -> BootImageResult<bool> {
        let key = verifying_key(pub_key)?;

        // Zero or out-of-range scalars are not a signature at all
        let Ok(sig) = Signature::from_scalars(sig.r, sig.s) else {
            return Ok(false);
        };

        Ok(key.verify_prehash(digest, &sig).is_ok())
    }

    fn vendor_pub_key(&self) -> ImageEccPubKey {
        self.pub_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootimg_image_fake_keys::*;
    use std::io::Write;

    struct TmpFile(std::path::PathBuf);

    impl TmpFile {
        fn new(name: &str, contents: &str) -> Self {
            let path = std::env::temp_dir().join(format!(
                "bootimg-crypto-{}-{}",
                std::process::id(),
                name
            ));
            let mut file = std::fs::File::create(&path).unwrap();
            file.write_all(contents.as_bytes()).unwrap();
            Self(path)
        }
    }

    impl Drop for TmpFile {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    #[test]
    fn test_sha256_known_answer() {
        let crypto = RustCrypto::default();
        let digest = crypto.sha256_digest(b"abc").unwrap();
        assert_eq!(
            digest,
            [
                0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde, 0x5d, 0xae,
                0x22, 0x23, 0xb0, 0x03, 0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c, 0xb4, 0x10, 0xff, 0x61,
                0xf2, 0x00, 0x15, 0xad
            ]
        );
        let mut env = RustCryptoEnv::new(VENDOR_KEY_0_PUBLIC).unwrap();
        assert_eq!(env.sha256_digest(b"abc").unwrap(), digest);
    }

    #[test]
    fn test_sign_verify() {
        let crypto = RustCrypto::default();
        let digest = crypto.sha256_digest(b"payload").unwrap();
        let sig = crypto.ecdsa256_sign(&digest, &VENDOR_KEY_0_PRIVATE).unwrap();

        let mut env = RustCryptoEnv::new(VENDOR_KEY_0_PUBLIC).unwrap();
        assert_eq!(
            env.ecdsa256_verify(&digest, &VENDOR_KEY_0_PUBLIC, &sig),
            Ok(true)
        );

        // Wrong key
        assert_eq!(
            env.ecdsa256_verify(&digest, &VENDOR_KEY_1_PUBLIC, &sig),
            Ok(false)
        );

        // Wrong digest
        let other = crypto.sha256_digest(b"payload!").unwrap();
        assert_eq!(
            env.ecdsa256_verify(&other, &VENDOR_KEY_0_PUBLIC, &sig),
            Ok(false)
        );

        // Zeroed signature
        assert_eq!(
            env.ecdsa256_verify(&digest, &VENDOR_KEY_0_PUBLIC, &ImageEccSignature::default()),
            Ok(false)
        );
    }

    #[test]
    fn test_sign_is_deterministic() {
        let crypto = RustCrypto::default();
        let digest = crypto.sha256_digest(b"payload").unwrap();
        let a = crypto.ecdsa256_sign(&digest, &VENDOR_KEY_0_PRIVATE).unwrap();
        let b = crypto.ecdsa256_sign(&digest, &VENDOR_KEY_0_PRIVATE).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sign_invalid_key() {
        let crypto = RustCrypto::default();
        let digest = crypto.sha256_digest(b"payload").unwrap();
        assert!(crypto
            .ecdsa256_sign(&digest, &ImageEccPrivKey::default())
            .is_err());
    }

    #[test]
    fn test_invalid_pub_key() {
        assert_eq!(
            RustCryptoEnv::new(ImageEccPubKey::default()).err(),
            Some(BootImageError::IMAGE_PUB_KEY_INVALID)
        );
    }

    #[test]
    fn test_pub_key_from_priv_key() {
        assert_eq!(
            ecc_pub_key_from_priv_key(&VENDOR_KEY_0_PRIVATE).unwrap(),
            VENDOR_KEY_0_PUBLIC
        );
        assert_eq!(
            ecc_pub_key_from_priv_key(&VENDOR_KEY_1_PRIVATE).unwrap(),
            VENDOR_KEY_1_PUBLIC
        );
    }

    #[test]
    fn test_keys_from_pem() {
        let priv_pem = TmpFile::new("priv.pem", VENDOR_KEY_0_PRIVATE_PEM);
        let pub_pem = TmpFile::new("pub.pem", VENDOR_KEY_0_PUBLIC_PEM);

        let priv_key = RustCrypto::ecc_priv_key_from_pem(&priv_pem.0).unwrap();
        assert_eq!(priv_key.0, VENDOR_KEY_0_PRIVATE.0);

        let pub_key = RustCrypto::ecc_pub_key_from_pem(&pub_pem.0).unwrap();
        assert_eq!(pub_key, VENDOR_KEY_0_PUBLIC);
    }

    #[test]
    fn test_keys_from_pem_errors() {
        let missing = std::env::temp_dir().join("bootimg-crypto-does-not-exist.pem");
        let err = RustCrypto::ecc_priv_key_from_pem(&missing).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read private key PEM file"));

        let garbage = TmpFile::new("garbage.pem", "not a key");
        let err = RustCrypto::ecc_pub_key_from_pem(&garbage.0).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse public key PEM file"));
    }
}
