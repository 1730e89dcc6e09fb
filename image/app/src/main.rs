/*++

Licensed under the Apache-2.0 license.

File Name:

   main.rs

Abstract:

    Main entry point of the Boot Imaging application

--*/
use std::path::PathBuf;

use clap::{arg, value_parser, ArgAction, Command};
use log::LevelFilter;
use simple_logger::SimpleLogger;

mod config;
mod create;
mod info;
mod sign;
mod verify;

/// Parse a 32-bit value given in decimal or `0x` prefixed hex
fn parse_u32(value: &str) -> Result<u32, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse::<u32>(),
    };
    parsed.map_err(|err| format!("invalid 32-bit value {value:?}: {err}"))
}

/// Entry point
fn main() {
    let sub_cmds = vec![
        Command::new("create")
            .about("Create a new boot image from a payload")
            .arg(
                arg!(--"payload" <FILE> "Payload (kernel) binary")
                    .required(true)
                    .value_parser(value_parser!(PathBuf)),
            )
            .arg(
                arg!(--"load-addr" <U32> "Load address")
                    .required(false)
                    .default_value("0x8000")
                    .value_parser(parse_u32),
            )
            .arg(
                arg!(--"boot-type" <U32> "Boot type: 0=Primary, 1=Secondary, 2=Maintenance, 3=Diagnostic")
                    .required(false)
                    .default_value("0")
                    .value_parser(parse_u32),
            )
            .arg(
                arg!(--"out" <FILE> "Output file")
                    .required(true)
                    .value_parser(value_parser!(PathBuf)),
            ),
        Command::new("sign")
            .about("Sign a boot image")
            .arg(
                arg!(--"image" <FILE> "Unsigned boot image")
                    .required(true)
                    .value_parser(value_parser!(PathBuf)),
            )
            .arg(
                arg!(--"key" <FILE> "P-256 private key (PEM)")
                    .required_unless_present("key-config")
                    .value_parser(value_parser!(PathBuf)),
            )
            .arg(
                arg!(--"key-config" <FILE> "Key Configuration file")
                    .conflicts_with("key")
                    .value_parser(value_parser!(PathBuf)),
            )
            .arg(
                arg!(--"out" <FILE> "Output file")
                    .required(true)
                    .value_parser(value_parser!(PathBuf)),
            ),
        Command::new("verify")
            .about("Verify a signed boot image")
            .arg(
                arg!(--"image" <FILE> "Signed boot image")
                    .required(true)
                    .value_parser(value_parser!(PathBuf)),
            )
            .arg(
                arg!(--"pub-key" <FILE> "P-256 public key (PEM)")
                    .required_unless_present("key-config")
                    .value_parser(value_parser!(PathBuf)),
            )
            .arg(
                arg!(--"key-config" <FILE> "Key Configuration file")
                    .conflicts_with("pub-key")
                    .value_parser(value_parser!(PathBuf)),
            ),
        Command::new("info")
            .about("Print the header of a boot image")
            .arg(
                arg!(--"image" <FILE> "Boot image")
                    .required(true)
                    .value_parser(value_parser!(PathBuf)),
            )
            .arg(
                arg!(--"signed" "Image carries a signature envelope")
                    .action(ArgAction::SetTrue),
            ),
    ];

    let cmd = Command::new("bootimg")
        .arg_required_else_help(true)
        .arg(
            arg!(-v --verbose "Enable debug logging")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommands(sub_cmds)
        .about("Boot image creation, signing and verification tools")
        .get_matches();

    let verbose = match cmd.subcommand() {
        Some((_, args)) => args.get_flag("verbose"),
        None => cmd.get_flag("verbose"),
    };
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let _ = SimpleLogger::new().with_level(level).init();

    let result = match cmd.subcommand() {
        Some(("create", args)) => create::run_cmd(args),
        Some(("sign", args)) => sign::run_cmd(args),
        Some(("verify", args)) => verify::run_cmd(args),
        Some(("info", args)) => info::run_cmd(args),
        _ => unreachable!(),
    };

    result.unwrap_or_else(|e| {
        log::error!("Error: {e:#}");
        std::process::exit(1);
    });
}
