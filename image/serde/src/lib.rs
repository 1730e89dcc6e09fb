/*++

Licensed under the Apache-2.0 license.

File Name:

   lib.rs

Abstract:

    Boot Image serialization routines.

--*/
use bootimg_image_types::*;
use std::io::Write;
use zerocopy::IntoBytes;

/// Boot Image Writer
pub struct BootImageWriter<W: Write> {
    writer: W,
}

impl<W: Write> BootImageWriter<W> {
    /// Create an instance of `BootImageWriter`
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write an unsigned Boot Image
    pub fn write(&mut self, image: &BootImage) -> anyhow::Result<()> {
        self.writer.write_all(image.header.as_bytes())?;
        self.writer.write_all(&image.payload)?;
        Ok(())
    }

    /// Write a Boot Image followed by its signature envelope
    pub fn write_signed(&mut self, image: &SignedBootImage) -> anyhow::Result<()> {
        self.write(&image.image)?;
        self.writer.write_all(image.signature.as_bytes())?;
        Ok(())
    }

    /// Flush and return the underlying writer
    pub fn finish(mut self) -> anyhow::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
