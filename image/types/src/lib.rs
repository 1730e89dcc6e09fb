/*++

Licensed under the Apache-2.0 license.

File Name:

   lib.rs

Abstract:

    File contains data structures and the header layout for the boot image
    container. This crate is the single source of truth for the layout and
    is shared by the image generator and the image verifier.

--*/

#![cfg_attr(not(feature = "std"), no_std)]

use core::ops::Range;

use bootimg_error::{BootImageError, BootImageResult};
use memoffset::span_of;
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// "BOOT" when read as little-endian bytes
pub const BOOT_IMAGE_MAGIC: u32 = 0x544F_4F42;
pub const BOOT_IMAGE_VERSION_MAJOR: u16 = 1;
pub const BOOT_IMAGE_VERSION_MINOR: u16 = 0;
pub const BOOT_IMAGE_VERSION: u32 =
    make_version(BOOT_IMAGE_VERSION_MAJOR, BOOT_IMAGE_VERSION_MINOR);
pub const SUPPORTED_VERSION_MAJORS: [u16; 1] = [BOOT_IMAGE_VERSION_MAJOR];
pub const BOOT_IMAGE_HEADER_BYTE_SIZE: usize = core::mem::size_of::<BootImageHeader>();
pub const DEFAULT_LOAD_ADDR: u32 = 0x8000;
pub const ECC256_SCALAR_BYTE_SIZE: usize = 32;
pub const SHA256_DIGEST_BYTE_SIZE: usize = 32;
pub const SIGNATURE_BYTE_SIZE: usize = core::mem::size_of::<ImageEccSignature>();
pub const MAX_PAYLOAD_BYTE_SIZE: u64 = u32::MAX as u64;

pub type ImageScalar = [u8; ECC256_SCALAR_BYTE_SIZE];
pub type ImageDigest = [u8; SHA256_DIGEST_BYTE_SIZE];

/// Packs a major/minor pair into the header version field
pub const fn make_version(major: u16, minor: u16) -> u32 {
    ((major as u32) << 16) | minor as u32
}

/// Length of the signature envelope appended by a given format major
/// version, or `None` if the major version is unknown.
pub const fn signature_byte_size(major: u16) -> Option<usize> {
    match major {
        1 => Some(SIGNATURE_BYTE_SIZE),
        _ => None,
    }
}

/// ECDSA P-256 public key, big-endian affine coordinates
#[repr(C)]
#[derive(
    IntoBytes, FromBytes, Immutable, KnownLayout, Default, Debug, Copy, Clone, Eq, PartialEq,
)]
pub struct ImageEccPubKey {
    /// X Coordinate
    pub x: ImageScalar,

    /// Y Coordinate
    pub y: ImageScalar,
}

/// ECDSA P-256 signature as stored in the signature envelope
#[repr(C)]
#[derive(
    IntoBytes, FromBytes, Immutable, KnownLayout, Default, Debug, Copy, Clone, Eq, PartialEq,
)]
pub struct ImageEccSignature {
    /// Random point
    pub r: ImageScalar,

    /// Proof
    pub s: ImageScalar,
}

/// ECDSA P-256 private scalar. Wiped when dropped.
#[derive(Default, Clone, Zeroize, ZeroizeOnDrop)]
pub struct ImageEccPrivKey(pub ImageScalar);

impl core::fmt::Debug for ImageEccPrivKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("ImageEccPrivKey(..)")
    }
}

/// Boot type carried in the header
#[repr(u32)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BootType {
    /// Primary operating system
    Primary = 0,

    /// Secondary operating system
    Secondary = 1,

    /// Maintenance mode
    Maintenance = 2,

    /// Hardware diagnostics
    Diagnostic = 3,
}

impl BootType {
    pub const fn name(&self) -> &'static str {
        match self {
            BootType::Primary => "primary",
            BootType::Secondary => "secondary",
            BootType::Maintenance => "maintenance",
            BootType::Diagnostic => "diagnostic",
        }
    }
}

impl From<BootType> for u32 {
    /// Converts to this type from the input type.
    fn from(value: BootType) -> Self {
        value as u32
    }
}

impl TryFrom<u32> for BootType {
    type Error = BootImageError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BootType::Primary),
            1 => Ok(BootType::Secondary),
            2 => Ok(BootType::Maintenance),
            3 => Ok(BootType::Diagnostic),
            _ => Err(BootImageError::IMAGE_HEADER_INVALID_BOOT_TYPE),
        }
    }
}

/// Boot image header. All fields are little-endian on the wire.
#[repr(C)]
#[derive(
    IntoBytes, FromBytes, Immutable, KnownLayout, Default, Debug, Copy, Clone, Eq, PartialEq,
)]
pub struct BootImageHeader {
    /// Magic
    pub magic: U32,

    /// Format version, major in the upper 16 bits
    pub version: U32,

    /// Boot type tag
    pub boot_type: U32,

    /// Address the payload is placed at before execution
    pub load_addr: U32,

    /// Payload size in bytes
    pub payload_size: U32,

    /// Additive checksum of the payload
    pub checksum: U32,
}

impl BootImageHeader {
    pub fn version_major(&self) -> u16 {
        (self.version.get() >> 16) as u16
    }

    pub fn version_minor(&self) -> u16 {
        self.version.get() as u16
    }

    /// Decoded boot type
    pub fn boot_type(&self) -> BootImageResult<BootType> {
        BootType::try_from(self.boot_type.get())
    }

    /// Range of the payload within an image buffer
    pub fn payload_range(&self) -> Range<usize> {
        BOOT_IMAGE_HEADER_BYTE_SIZE..self.image_size()
    }

    /// Size of the unsigned image (header and payload)
    pub fn image_size(&self) -> usize {
        BOOT_IMAGE_HEADER_BYTE_SIZE + self.payload_size.get() as usize
    }

    /// Returns the `Range<u32>` containing the version field
    pub fn version_range() -> Range<u32> {
        let span = span_of!(BootImageHeader, version);
        span.start as u32..span.end as u32
    }

    /// Returns the `Range<u32>` containing the load address field
    pub fn load_addr_range() -> Range<u32> {
        let span = span_of!(BootImageHeader, load_addr);
        span.start as u32..span.end as u32
    }

    /// Returns the `Range<u32>` containing the checksum field
    pub fn checksum_range() -> Range<u32> {
        let span = span_of!(BootImageHeader, checksum);
        span.start as u32..span.end as u32
    }

    /// Checks magic, version and boot type, the fields that can be
    /// validated without knowing the buffer length.
    fn validate_fields(&self) -> BootImageResult<()> {
        if self.magic.get() != BOOT_IMAGE_MAGIC {
            return Err(BootImageError::IMAGE_HEADER_BAD_MAGIC);
        }

        if !SUPPORTED_VERSION_MAJORS.contains(&self.version_major()) {
            return Err(BootImageError::IMAGE_HEADER_UNSUPPORTED_VERSION);
        }

        self.boot_type()?;

        Ok(())
    }
}

/// Calculate the additive payload checksum (sum of bytes modulo 2^32)
pub fn checksum(payload: &[u8]) -> u32 {
    payload
        .iter()
        .fold(0u32, |sum, byte| sum.wrapping_add(u32::from(*byte)))
}

/// Returns true if `payload` matches the checksum recorded in `header`.
///
/// Detects accidental corruption only.
pub fn verify_checksum(header: &BootImageHeader, payload: &[u8]) -> bool {
    checksum(payload) == header.checksum.get()
}

/// Parse and validate the header of an unsigned image.
///
/// `bytes` must contain exactly the header followed by the payload. The
/// checksum is not verified.
pub fn parse_header(bytes: &[u8]) -> BootImageResult<BootImageHeader> {
    let (header, payload) = BootImageHeader::read_from_prefix(bytes)
        .map_err(|_| BootImageError::IMAGE_HEADER_TOO_SHORT)?;

    header.validate_fields()?;

    if header.payload_size.get() as usize != payload.len() {
        return Err(BootImageError::IMAGE_HEADER_SIZE_MISMATCH);
    }

    Ok(header)
}

/// A signed image buffer split at the signature envelope
#[derive(Debug, Copy, Clone)]
pub struct SignedImageRef<'a> {
    /// Validated header
    pub header: BootImageHeader,

    /// Header and payload, the bytes covered by the signature
    pub image: &'a [u8],

    /// Trailing signature envelope
    pub signature: &'a [u8],
}

impl<'a> SignedImageRef<'a> {
    pub fn payload(&self) -> &'a [u8] {
        &self.image[BOOT_IMAGE_HEADER_BYTE_SIZE..]
    }
}

/// Parse and validate the header of a signed image.
///
/// The envelope length follows from the header's major version, so the
/// split point is computed without scanning the buffer.
pub fn parse_signed_header(bytes: &[u8]) -> BootImageResult<SignedImageRef<'_>> {
    let (header, _) = BootImageHeader::read_from_prefix(bytes)
        .map_err(|_| BootImageError::IMAGE_HEADER_TOO_SHORT)?;

    header.validate_fields()?;

    let sig_len = signature_byte_size(header.version_major())
        .ok_or(BootImageError::IMAGE_HEADER_UNSUPPORTED_VERSION)?;

    if bytes.len() < BOOT_IMAGE_HEADER_BYTE_SIZE + sig_len {
        return Err(BootImageError::IMAGE_HEADER_TOO_SHORT);
    }

    let (image, signature) = bytes.split_at(bytes.len() - sig_len);
    let header = parse_header(image)?;

    Ok(SignedImageRef {
        header,
        image,
        signature,
    })
}

/// Boot image: header followed by the payload
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct BootImage {
    /// Header
    pub header: BootImageHeader,

    /// Payload
    pub payload: Vec<u8>,
}

#[cfg(feature = "std")]
impl BootImage {
    /// Serialized image bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.size());
        bytes.extend_from_slice(self.header.as_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Size of the serialized image
    pub fn size(&self) -> usize {
        BOOT_IMAGE_HEADER_BYTE_SIZE + self.payload.len()
    }
}

/// Boot image followed by its signature envelope
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct SignedBootImage {
    /// Signed image
    pub image: BootImage,

    /// Signature over the SHA-256 digest of the image bytes
    pub signature: ImageEccSignature,
}

#[cfg(feature = "std")]
impl SignedBootImage {
    /// Serialized signed image bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.image.to_bytes();
        bytes.extend_from_slice(self.signature.as_bytes());
        bytes
    }

    /// Size of the serialized signed image
    pub fn size(&self) -> usize {
        self.image.size() + SIGNATURE_BYTE_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(fields: [u32; 6]) -> Vec<u8> {
        fields.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn image(payload: &[u8]) -> Vec<u8> {
        let mut bytes = header_bytes([
            BOOT_IMAGE_MAGIC,
            BOOT_IMAGE_VERSION,
            0,
            0x8000,
            payload.len() as u32,
            checksum(payload),
        ]);
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn test_header_layout() {
        assert_eq!(BOOT_IMAGE_HEADER_BYTE_SIZE, 24);
        assert_eq!(SIGNATURE_BYTE_SIZE, 64);
        assert_eq!(BootImageHeader::version_range(), 4..8);
        assert_eq!(BootImageHeader::load_addr_range(), 12..16);
        assert_eq!(BootImageHeader::checksum_range(), 20..24);
        assert_eq!(&BOOT_IMAGE_MAGIC.to_le_bytes(), b"BOOT");
    }

    #[test]
    fn test_checksum() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[0x01, 0x02, 0x03, 0x04]), 0x0000_000A);
        assert_eq!(checksum(&[0xff; 4]), 0x3fc);
    }

    #[test]
    fn test_parse_header() {
        let bytes = image(&[0x01, 0x02, 0x03, 0x04]);
        let header = parse_header(&bytes).unwrap();
        assert_eq!(header.magic.get(), BOOT_IMAGE_MAGIC);
        assert_eq!(header.version_major(), 1);
        assert_eq!(header.version_minor(), 0);
        assert_eq!(header.boot_type(), Ok(BootType::Primary));
        assert_eq!(header.load_addr.get(), 0x8000);
        assert_eq!(header.payload_size.get(), 4);
        assert_eq!(header.checksum.get(), 0x0A);
        assert_eq!(header.payload_range(), 24..28);
        assert!(verify_checksum(&header, &bytes[header.payload_range()]));
    }

    #[test]
    fn test_parse_header_too_short() {
        let bytes = image(&[0x01]);
        assert_eq!(
            parse_header(&bytes[..BOOT_IMAGE_HEADER_BYTE_SIZE - 1]),
            Err(BootImageError::IMAGE_HEADER_TOO_SHORT)
        );
        assert_eq!(
            parse_header(&[]),
            Err(BootImageError::IMAGE_HEADER_TOO_SHORT)
        );
    }

    #[test]
    fn test_parse_header_bad_magic() {
        let mut bytes = image(&[0x01]);
        bytes[0] ^= 0x01;
        assert_eq!(
            parse_header(&bytes),
            Err(BootImageError::IMAGE_HEADER_BAD_MAGIC)
        );
    }

    #[test]
    fn test_parse_header_version() {
        let mut bytes = image(&[0x01]);
        bytes[4..8].copy_from_slice(&make_version(2, 0).to_le_bytes());
        assert_eq!(
            parse_header(&bytes),
            Err(BootImageError::IMAGE_HEADER_UNSUPPORTED_VERSION)
        );

        // Minor revisions are accepted
        bytes[4..8].copy_from_slice(&make_version(1, 7).to_le_bytes());
        let header = parse_header(&bytes).unwrap();
        assert_eq!(header.version_minor(), 7);
    }

    #[test]
    fn test_parse_header_boot_type() {
        let mut bytes = image(&[0x01]);
        for boot_type in 0..4u32 {
            bytes[8..12].copy_from_slice(&boot_type.to_le_bytes());
            let header = parse_header(&bytes).unwrap();
            assert_eq!(u32::from(header.boot_type().unwrap()), boot_type);
        }
        bytes[8..12].copy_from_slice(&4u32.to_le_bytes());
        assert_eq!(
            parse_header(&bytes),
            Err(BootImageError::IMAGE_HEADER_INVALID_BOOT_TYPE)
        );
    }

    #[test]
    fn test_parse_header_size_mismatch() {
        let mut bytes = image(&[0x01, 0x02]);
        bytes.push(0);
        assert_eq!(
            parse_header(&bytes),
            Err(BootImageError::IMAGE_HEADER_SIZE_MISMATCH)
        );
        bytes.truncate(BOOT_IMAGE_HEADER_BYTE_SIZE + 1);
        assert_eq!(
            parse_header(&bytes),
            Err(BootImageError::IMAGE_HEADER_SIZE_MISMATCH)
        );
    }

    #[test]
    fn test_parse_header_check_order() {
        // Magic is checked before the version, the version before the size
        let mut bytes = image(&[0x01]);
        bytes[0] = 0;
        bytes[4..8].copy_from_slice(&make_version(9, 0).to_le_bytes());
        bytes.push(0);
        assert_eq!(
            parse_header(&bytes),
            Err(BootImageError::IMAGE_HEADER_BAD_MAGIC)
        );
        bytes[..4].copy_from_slice(&BOOT_IMAGE_MAGIC.to_le_bytes());
        assert_eq!(
            parse_header(&bytes),
            Err(BootImageError::IMAGE_HEADER_UNSUPPORTED_VERSION)
        );
    }

    #[test]
    fn test_checksum_detects_bit_flips() {
        let payload = [0x10, 0x32, 0x54, 0x76, 0x98];
        let bytes = image(&payload);
        let header = parse_header(&bytes).unwrap();
        for byte in 0..payload.len() {
            for bit in 0..8 {
                let mut corrupted = payload;
                corrupted[byte] ^= 1 << bit;
                assert!(!verify_checksum(&header, &corrupted));
            }
        }
    }

    #[test]
    fn test_parse_signed_header() {
        let mut bytes = image(&[0x01, 0x02, 0x03]);
        bytes.extend_from_slice(&[0xAA; SIGNATURE_BYTE_SIZE]);
        let signed = parse_signed_header(&bytes).unwrap();
        assert_eq!(signed.header.payload_size.get(), 3);
        assert_eq!(signed.image.len(), BOOT_IMAGE_HEADER_BYTE_SIZE + 3);
        assert_eq!(signed.payload(), &[0x01, 0x02, 0x03]);
        assert_eq!(signed.signature, &[0xAA; SIGNATURE_BYTE_SIZE]);

        // Unsigned images are too short once the envelope is accounted for
        let unsigned = image(&[0x01]);
        assert_eq!(
            parse_signed_header(&unsigned).err(),
            Some(BootImageError::IMAGE_HEADER_TOO_SHORT)
        );

        // An envelope of the wrong length shifts the split point
        bytes.pop();
        assert_eq!(
            parse_signed_header(&bytes).err(),
            Some(BootImageError::IMAGE_HEADER_SIZE_MISMATCH)
        );
    }

    #[test]
    fn test_boot_image_to_bytes() {
        let payload = vec![0x01, 0x02, 0x03, 0x04];
        let image = BootImage {
            header: parse_header(&image(&payload)).unwrap(),
            payload,
        };
        let signed = SignedBootImage {
            image: image.clone(),
            signature: ImageEccSignature {
                r: [0x11; 32],
                s: [0x22; 32],
            },
        };
        let bytes = signed.to_bytes();
        assert_eq!(bytes.len(), signed.size());
        assert_eq!(&bytes[..image.size()], image.to_bytes().as_slice());
        assert_eq!(&bytes[image.size()..image.size() + 32], &[0x11; 32]);
        assert_eq!(&bytes[image.size() + 32..], &[0x22; 32]);
    }
}
