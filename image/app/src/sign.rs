/*++

Licensed under the Apache-2.0 license.

File Name:

    sign.rs

Abstract:

    File contains implementation of the Boot Image signing command.

--*/

use anyhow::{anyhow, Context};
use bootimg_image_crypto::RustCrypto as Crypto;
use bootimg_image_gen::{ImageGenerator, ImageGeneratorCrypto};
use bootimg_image_serde::BootImageWriter;
use bootimg_image_types::SIGNATURE_BYTE_SIZE;
use clap::ArgMatches;
use std::path::PathBuf;

use crate::config::{config_dir, load_key_config};

/// Run the command
pub(crate) fn run_cmd(args: &ArgMatches) -> anyhow::Result<()> {
    let image_path: &PathBuf = args
        .get_one::<PathBuf>("image")
        .with_context(|| "image arg not specified")?;

    let out_path: &PathBuf = args
        .get_one::<PathBuf>("out")
        .with_context(|| "out arg not specified")?;

    let key_path = match (
        args.get_one::<PathBuf>("key"),
        args.get_one::<PathBuf>("key-config"),
    ) {
        (Some(key), _) => key.clone(),
        (None, Some(config_path)) => {
            load_key_config(config_path)?.priv_key_path(&config_dir(config_path))?
        }
        (None, None) => return Err(anyhow!("key or key-config arg not specified")),
    };

    let priv_key = Crypto::ecc_priv_key_from_pem(&key_path)?;

    let image = std::fs::read(image_path)
        .with_context(|| format!("Failed to read image {}", image_path.display()))?;

    let generator = ImageGenerator::new(Crypto::default());

    let (signed, digest) = generator
        .sign_with_digest(&image, &priv_key)
        .with_context(|| format!("Failed to sign image {}", image_path.display()))?;

    println!("Image hash (SHA-256): {}", hex::encode(digest));

    let out_file = std::fs::File::create(out_path)
        .with_context(|| format!("Failed to create file {}", out_path.display()))?;

    let mut writer = BootImageWriter::new(out_file);
    writer.write_signed(&signed)?;
    writer.finish()?;

    println!("Signed image created: {}", out_path.display());
    println!("  Original size: {} bytes", image.len());
    println!("  Signature size: {} bytes", SIGNATURE_BYTE_SIZE);
    println!("  Total size: {} bytes", signed.size());

    Ok(())
}
