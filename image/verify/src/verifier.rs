/*++

Licensed under the Apache-2.0 license.

File Name:

    verifier.rs

Abstract:

    This file is the main implementation of the Boot Image Verifier.

--*/

use crate::*;
use bootimg_error::BootImageError;
use zerocopy::FromBytes;

/// Verifier state
///
/// `Start -> HeaderParsed -> ChecksumChecked -> SignatureChecked -> Accepted`,
/// with a transition to `Rejected` out of every non-terminal state.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum VerificationState {
    /// Nothing checked yet
    Start,

    /// Header structure is valid
    HeaderParsed(BootImageHeader),

    /// Payload checksum matches
    ChecksumChecked(BootImageHeader),

    /// Signature over the digest is valid
    SignatureChecked(BootImageHeader, ImageDigest),

    /// Image is intact and authentic
    Accepted(ImageVerificationInfo),

    /// Image failed a check
    Rejected(BootImageError),
}

impl VerificationState {
    pub fn name(&self) -> &'static str {
        match self {
            VerificationState::Start => "Start",
            VerificationState::HeaderParsed(_) => "HeaderParsed",
            VerificationState::ChecksumChecked(_) => "ChecksumChecked",
            VerificationState::SignatureChecked(_, _) => "SignatureChecked",
            VerificationState::Accepted(_) => "Accepted",
            VerificationState::Rejected(_) => "Rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            VerificationState::Accepted(_) | VerificationState::Rejected(_)
        )
    }
}

/// Image Verifier
pub struct ImageVerifier<Env: ImageVerificationEnv> {
    /// Verification Environment
    env: Env,
}

impl<Env: ImageVerificationEnv> ImageVerifier<Env> {
    /// Create a new instance `ImageVerifier`
    ///
    /// # Arguments
    ///
    /// * `env` - Environment
    pub fn new(env: Env) -> Self {
        Self { env }
    }

    /// Verify a signed boot image
    ///
    /// # Arguments
    ///
    /// * `image` - Signed image (header, payload and signature envelope)
    ///
    /// # Returns
    ///
    /// * `ImageVerificationInfo` - Image verification information on success
    pub fn verify(&mut self, image: &[u8]) -> BootImageResult<ImageVerificationInfo> {
        let mut verification = self.start(image);
        loop {
            match *verification.step() {
                VerificationState::Accepted(info) => return Ok(info),
                VerificationState::Rejected(err) => return Err(err),
                _ => {}
            }
        }
    }

    /// Begin a stepwise verification of `image`
    ///
    /// The returned [`Verification`] starts in `Start` and is bound to
    /// `image` for its whole life.
    pub fn start<'a>(&'a mut self, image: &'a [u8]) -> Verification<'a, Env> {
        Verification {
            env: &mut self.env,
            image,
            state: VerificationState::Start,
        }
    }
}

/// A single verification in progress
///
/// The current state is private. Every state other than `Start` is
/// produced by a check run against the bound image.
pub struct Verification<'a, Env: ImageVerificationEnv> {
    env: &'a mut Env,
    image: &'a [u8],
    state: VerificationState,
}

impl<Env: ImageVerificationEnv> Verification<'_, Env> {
    /// Current state
    pub fn state(&self) -> &VerificationState {
        &self.state
    }

    /// Perform a single state transition
    ///
    /// Terminal states are left unchanged.
    pub fn step(&mut self) -> &VerificationState {
        let prev = self.state;
        let next = match prev {
            VerificationState::Start => self.parse(),
            VerificationState::HeaderParsed(header) => self.verify_checksum(header),
            VerificationState::ChecksumChecked(header) => self.verify_signature(header),
            VerificationState::SignatureChecked(header, digest) => Self::accept(header, digest),
            _ => return &self.state,
        };

        match next {
            VerificationState::Rejected(err) => {
                log::warn!("{} -> Rejected: {}", prev.name(), err)
            }
            _ => log::debug!("{} -> {}", prev.name(), next.name()),
        }

        self.state = next;
        &self.state
    }

    /// Parse the header and split off the signature envelope
    fn parse(&self) -> VerificationState {
        match parse_signed_header(self.image) {
            Ok(signed) => VerificationState::HeaderParsed(signed.header),
            Err(err) => VerificationState::Rejected(err),
        }
    }

    /// Verify the payload checksum
    fn verify_checksum(&self, header: BootImageHeader) -> VerificationState {
        let Some(payload) = self.image.get(header.payload_range()) else {
            return VerificationState::Rejected(BootImageError::IMAGE_HEADER_TOO_SHORT);
        };

        if !bootimg_image_types::verify_checksum(&header, payload) {
            return VerificationState::Rejected(BootImageError::IMAGE_CHECKSUM_MISMATCH);
        }

        VerificationState::ChecksumChecked(header)
    }

    /// Verify the signature over the image digest
    fn verify_signature(&mut self, header: BootImageHeader) -> VerificationState {
        match self.check_signature(header) {
            Ok(digest) => VerificationState::SignatureChecked(header, digest),
            Err(err) => VerificationState::Rejected(err),
        }
    }

    fn check_signature(&mut self, header: BootImageHeader) -> BootImageResult<ImageDigest> {
        let signed = self
            .image
            .get(..header.image_size())
            .ok_or(BootImageError::IMAGE_HEADER_TOO_SHORT)?;

        let envelope = self
            .image
            .get(header.image_size()..)
            .ok_or(BootImageError::IMAGE_HEADER_TOO_SHORT)?;

        let sig = ImageEccSignature::read_from_bytes(envelope)
            .map_err(|_| BootImageError::IMAGE_SIGNATURE_INVALID)?;

        let digest = self.env.sha256_digest(signed).map_err(|err| {
            log::error!("Image digest failed: {err}");
            BootImageError::IMAGE_DIGEST_FAILURE
        })?;

        let pub_key = self.env.vendor_pub_key();

        let result = self
            .env
            .ecdsa256_verify(&digest, &pub_key, &sig)
            .map_err(|err| {
                log::error!("Signature verification failed: {err}");
                BootImageError::IMAGE_SIGNATURE_VERIFY_FAILURE
            })?;

        if !result {
            return Err(BootImageError::IMAGE_SIGNATURE_INVALID);
        }

        Ok(digest)
    }

    fn accept(header: BootImageHeader, digest: ImageDigest) -> VerificationState {
        match header.boot_type() {
            Ok(boot_type) => VerificationState::Accepted(ImageVerificationInfo {
                boot_type,
                version: header.version.get(),
                load_addr: header.load_addr.get(),
                payload_offset: BOOT_IMAGE_HEADER_BYTE_SIZE,
                payload_size: header.payload_size.get(),
                digest,
            }),
            Err(err) => VerificationState::Rejected(err),
        }
    }
}
