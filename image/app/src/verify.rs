/*++

Licensed under the Apache-2.0 license.

File Name:

    verify.rs

Abstract:

    File contains implementation of the Boot Image verification command.

--*/

use anyhow::{anyhow, Context};
use bootimg_image_crypto::{RustCrypto as Crypto, RustCryptoEnv};
use bootimg_image_gen::ImageGeneratorCrypto;
use bootimg_image_verify::{ImageVerifier, VerificationState};
use clap::ArgMatches;
use std::path::PathBuf;

use crate::config::{config_dir, load_key_config};

/// Run the command
pub(crate) fn run_cmd(args: &ArgMatches) -> anyhow::Result<()> {
    let image_path: &PathBuf = args
        .get_one::<PathBuf>("image")
        .with_context(|| "image arg not specified")?;

    let key_path = match (
        args.get_one::<PathBuf>("pub-key"),
        args.get_one::<PathBuf>("key-config"),
    ) {
        (Some(key), _) => key.clone(),
        (None, Some(config_path)) => {
            load_key_config(config_path)?.pub_key_path(&config_dir(config_path))?
        }
        (None, None) => return Err(anyhow!("pub-key or key-config arg not specified")),
    };

    let pub_key = Crypto::ecc_pub_key_from_pem(&key_path)?;

    let image = std::fs::read(image_path)
        .with_context(|| format!("Failed to read image {}", image_path.display()))?;

    let env = RustCryptoEnv::new(pub_key)
        .with_context(|| format!("Invalid public key {}", key_path.display()))?;
    let mut verifier = ImageVerifier::new(env);
    let mut verification = verifier.start(&image);

    let mut reached = verification.state().name();
    while !verification.state().is_terminal() {
        let state = verification.step();
        if !state.is_terminal() {
            reached = state.name();
        }
    }

    let state = *verification.state();
    let last = state.name();
    match state {
        VerificationState::Accepted(info) => {
            println!("Image verified: {}", image_path.display());
            println!("  State: {last}");
            println!("  Boot type: {}", info.boot_type.name());
            println!("  Load address: 0x{:08X}", info.load_addr);
            println!("  Payload size: {} bytes", info.payload_size);
            println!("  Image hash (SHA-256): {}", hex::encode(info.digest));
            Ok(())
        }
        VerificationState::Rejected(err) => Err(anyhow!(
            "Image {} rejected after {}: {}",
            image_path.display(),
            reached,
            err
        )),
        _ => unreachable!(),
    }
}
