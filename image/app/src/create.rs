/*++

Licensed under the Apache-2.0 license.

File Name:

    create.rs

Abstract:

    File contains implementation of the Boot Image creation command.

--*/

use anyhow::Context;
use bootimg_image_gen::build;
use bootimg_image_serde::BootImageWriter;
use clap::ArgMatches;
use std::path::PathBuf;

/// Run the command
pub(crate) fn run_cmd(args: &ArgMatches) -> anyhow::Result<()> {
    let payload_path: &PathBuf = args
        .get_one::<PathBuf>("payload")
        .with_context(|| "payload arg not specified")?;

    let load_addr: &u32 = args
        .get_one::<u32>("load-addr")
        .with_context(|| "load-addr arg not specified")?;

    let boot_type: &u32 = args
        .get_one::<u32>("boot-type")
        .with_context(|| "boot-type arg not specified")?;

    let out_path: &PathBuf = args
        .get_one::<PathBuf>("out")
        .with_context(|| "out arg not specified")?;

    let payload = std::fs::read(payload_path)
        .with_context(|| format!("Failed to read payload {}", payload_path.display()))?;

    let image = build(&payload, *load_addr, *boot_type)
        .with_context(|| format!("Failed to build image from {}", payload_path.display()))?;

    let out_file = std::fs::File::create(out_path)
        .with_context(|| format!("Failed to create file {}", out_path.display()))?;

    let mut writer = BootImageWriter::new(out_file);
    writer.write(&image)?;
    writer.finish()?;

    println!("Boot image created: {}", out_path.display());
    println!("  Kernel size: {} bytes", image.payload.len());
    println!("  Load address: 0x{:08X}", image.header.load_addr.get());
    println!("  Checksum: 0x{:08X}", image.header.checksum.get());

    Ok(())
}
