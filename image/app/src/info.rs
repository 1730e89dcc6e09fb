/*++

Licensed under the Apache-2.0 license.

File Name:

    info.rs

Abstract:

    File contains implementation of the Boot Image header dump command.

--*/

use anyhow::Context;
use bootimg_image_types::{parse_header, parse_signed_header, verify_checksum, BootImageHeader};
use clap::ArgMatches;
use std::path::PathBuf;

/// Run the command
pub(crate) fn run_cmd(args: &ArgMatches) -> anyhow::Result<()> {
    let image_path: &PathBuf = args
        .get_one::<PathBuf>("image")
        .with_context(|| "image arg not specified")?;

    let image = std::fs::read(image_path)
        .with_context(|| format!("Failed to read image {}", image_path.display()))?;

    let context = || format!("Failed to parse image {}", image_path.display());

    if args.get_flag("signed") {
        let signed = parse_signed_header(&image).with_context(context)?;
        print_header(&signed.header, verify_checksum(&signed.header, signed.payload()));
        println!("  Signature: {}", hex::encode(signed.signature));
    } else {
        let header = parse_header(&image).with_context(context)?;
        print_header(&header, verify_checksum(&header, &image[header.payload_range()]));
    }

    Ok(())
}

fn print_header(header: &BootImageHeader, checksum_ok: bool) {
    let boot_type = header.boot_type().map(|t| t.name()).unwrap_or("unknown");
    println!("Magic: 0x{:08X}", header.magic.get());
    println!(
        "Version: {}.{}",
        header.version_major(),
        header.version_minor()
    );
    println!("Boot type: {} ({})", header.boot_type.get(), boot_type);
    println!("Load address: 0x{:08X}", header.load_addr.get());
    println!("Payload size: {} bytes", header.payload_size.get());
    println!(
        "Checksum: 0x{:08X} ({})",
        header.checksum.get(),
        if checksum_ok { "ok" } else { "mismatch" }
    );
}
