// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! advmesh-dump - Decode captured advertisement PDUs
//!
//! Shows the header, source address, AD structure chain and mesh value of
//! each PDU, and optionally the packet as it would be relayed by this node.

use advmesh::packet::MAX_PACKET_LEN;
use advmesh::{take_ownership, AddressType, AdvPacket, DeviceAddress, StaticIdentity};
use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use std::io::{self, BufRead};

/// Decode captured advertisement PDUs
#[derive(Parser, Debug)]
#[command(name = "advmesh-dump")]
#[command(version = "0.1.0")]
#[command(about = "Decode advertisement PDUs (hex) and show their mesh contents")]
struct Args {
    /// PDUs as hex strings (read one per line from stdin if omitted)
    pdus: Vec<String>,

    /// Relay each packet as this node: strip foreign AD structures and stamp
    /// the local address
    #[arg(short = 'o', long)]
    take_ownership: bool,

    /// Local address used with --take-ownership (e.g. C6:05:04:03:02:01)
    #[arg(short = 'a', long, requires = "take_ownership")]
    local_addr: Option<DeviceAddress>,

    /// Local address is a random address
    #[arg(long, requires = "local_addr")]
    random: bool,

    /// Output format: pretty, json
    #[arg(short, long, default_value = "pretty")]
    format: OutputFormat,

    /// Quiet mode - one line per PDU
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "p" => Ok(OutputFormat::Pretty),
            "json" | "j" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// What one PDU decoded to
struct Dump {
    raw: Vec<u8>,
    packet: AdvPacket,
    relayed: Option<Relayed>,
}

/// Packet after ownership transfer
struct Relayed {
    packet: AdvPacket,
    error: Option<advmesh::Error>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let identity = local_identity(args)?;

    let inputs: Vec<String> = if args.pdus.is_empty() {
        io::stdin()
            .lock()
            .lines()
            .collect::<io::Result<_>>()
            .context("reading PDUs from stdin")?
    } else {
        args.pdus.clone()
    };

    let inputs: Vec<&str> = inputs
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();
    log::debug!("decoding {} PDU(s)", inputs.len());

    let mut failed = 0;
    for (i, input) in inputs.iter().enumerate() {
        match dump_one(input, identity.as_ref()) {
            Ok(dump) => match args.format {
                OutputFormat::Pretty => print_pretty(i + 1, &dump, args),
                OutputFormat::Json => print_json(&dump),
            },
            Err(e) => {
                failed += 1;
                eprintln!("{} PDU {}: {:#}", "!!".red().bold(), i + 1, e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} PDU(s) could not be decoded", failed, inputs.len());
    }
    Ok(())
}

fn local_identity(args: &Args) -> Result<Option<StaticIdentity>> {
    if !args.take_ownership {
        return Ok(None);
    }

    let Some(mut address) = args.local_addr else {
        bail!("--take-ownership needs --local-addr");
    };
    if args.random {
        address.addr_type = AddressType::Random;
    }
    Ok(Some(StaticIdentity::new(address)))
}

fn dump_one(input: &str, identity: Option<&StaticIdentity>) -> Result<Dump> {
    let raw = parse_hex(input)?;
    let packet = AdvPacket::decode(&raw).with_context(|| format!("decoding {}", input))?;

    let relayed = identity.map(|identity| {
        let mut relayed = packet;
        let error = take_ownership(&mut relayed, identity).err();
        if let Some(e) = error {
            log::warn!("ownership transfer incomplete: {}", e);
        }
        Relayed {
            packet: relayed,
            error,
        }
    });

    Ok(Dump {
        raw,
        packet,
        relayed,
    })
}

/// Parse hex bytes, ignoring an optional `0x` prefix and `:`, `-` or
/// whitespace separators
fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let input = input.strip_prefix("0x").unwrap_or(input);
    let digits: Vec<u8> = input
        .bytes()
        .filter(|b| !matches!(b, b':' | b'-' | b' ' | b'\t'))
        .collect();

    if digits.len() % 2 != 0 {
        bail!("odd number of hex digits in {:?}", input);
    }
    if digits.len() / 2 > MAX_PACKET_LEN {
        log::warn!(
            "{} bytes given, only the first packet is decoded",
            digits.len() / 2
        );
    }

    digits
        .chunks(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair)?;
            u8::from_str_radix(text, 16).with_context(|| format!("invalid hex byte {:?}", text))
        })
        .collect()
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn print_pretty(index: usize, dump: &Dump, args: &Args) {
    let packet = &dump.packet;
    let app = packet.app_data();

    if args.quiet {
        let value = match app {
            Some(app) => format!(
                "{} v{} {}",
                app.handle(),
                app.version(),
                hex(app.data())
            ),
            None => "-".to_string(),
        };
        println!(
            "[{}] {} {:?} {}{}",
            index,
            packet.source_address(),
            packet.header.pdu_type,
            value,
            if packet.has_foreign_structures() {
                " +foreign"
            } else {
                ""
            }
        );
        return;
    }

    println!("{} {}", format!("[{}]", index).yellow(), hex(&dump.raw).dimmed());
    print_packet(packet);

    if let Some(relayed) = &dump.relayed {
        println!("    {}", "Relayed as:".cyan().bold());
        match relayed.error {
            Some(e) => println!("      Result: {}", e.to_string().red()),
            None => println!("      Result: {}", "ok".green()),
        }
        print_packet(&relayed.packet);
        let mut out = [0u8; MAX_PACKET_LEN];
        match relayed.packet.encode(&mut out) {
            Ok(len) => println!("      On air: {}", hex(&out[..len])),
            Err(e) => println!("      On air: {}", e.to_string().red()),
        }
    }
    println!();
}

fn print_packet(packet: &AdvPacket) {
    println!(
        "      PDU: {:?}  Length: {}  Address: {} ({:?})",
        packet.header.pdu_type,
        packet.header.length,
        packet.source_address().to_string().green(),
        packet.header.addr_type
    );

    let mut chain = packet.ad_structures();
    for ad in chain.by_ref() {
        let Some(ad_type) = ad.ad_type else {
            println!("        {} @{:<2} {}", "F".blue(), ad.offset, "empty".dimmed());
            continue;
        };
        let tag = if ad.is_mesh() { "M".green() } else { "F".blue() };
        println!(
            "        {} @{:<2} type 0x{:02X} {}",
            tag,
            ad.offset,
            ad_type,
            hex(ad.data).dimmed()
        );
    }
    if chain.truncated() {
        println!("        {}", "truncated AD structure".yellow());
    }

    match packet.try_app_data() {
        Ok(app) => println!(
            "      Mesh: handle {}  version {}  data {} ({} B @{})",
            app.handle().to_string().cyan(),
            app.version(),
            hex(app.data()),
            app.data().len(),
            app.offset()
        ),
        Err(e) => println!("      Mesh: {}", e.to_string().dimmed()),
    }
    if packet.has_foreign_structures() {
        println!("      {}", "Foreign AD structures present".yellow());
    }
}

fn print_json(dump: &Dump) {
    print!("{{\"raw\":\"{}\",", hex(&dump.raw));
    print!("\"packet\":");
    print_packet_json(&dump.packet);
    if let Some(relayed) = &dump.relayed {
        print!(",\"relayed\":");
        print_packet_json(&relayed.packet);
        match relayed.error {
            Some(e) => print!(",\"relay_error\":\"{}\"", e),
            None => print!(",\"relay_error\":null"),
        }
    }
    println!("}}");
}

fn print_packet_json(packet: &AdvPacket) {
    print!(
        "{{\"pdu_type\":\"{:?}\",\"length\":{},\"address\":\"{}\",\"address_type\":\"{:?}\",",
        packet.header.pdu_type,
        packet.header.length,
        packet.source_address(),
        packet.header.addr_type
    );

    print!("\"ad_structures\":[");
    for (i, ad) in packet.ad_structures().enumerate() {
        if i > 0 {
            print!(",");
        }
        let ad_type = match ad.ad_type {
            Some(ad_type) => ad_type.to_string(),
            None => "null".to_string(),
        };
        print!(
            "{{\"offset\":{},\"type\":{},\"data\":\"{}\"}}",
            ad.offset,
            ad_type,
            hex(ad.data)
        );
    }
    print!("],");

    match packet.app_data() {
        Some(app) => print!(
            "\"mesh\":{{\"handle\":{},\"version\":{},\"data\":\"{}\",\"offset\":{}}},",
            u16::from(app.handle()),
            app.version(),
            hex(app.data()),
            app.offset()
        ),
        None => print!("\"mesh\":null,"),
    }
    print!("\"foreign\":{}}}", packet.has_foreign_structures());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_separators() {
        assert_eq!(parse_hex("0x0a:0B-0c 0d").unwrap(), vec![0x0A, 0x0B, 0x0C, 0x0D]);
        assert!(parse_hex("abc").is_err());
        assert!(parse_hex("zz").is_err());
    }

    #[test]
    fn test_dump_with_ownership() {
        let identity = StaticIdentity::new(DeviceAddress::new([1; 6], AddressType::Public));
        // ADV_IND with flags before a mesh structure carrying one byte
        let pdu = "401200aabbccddeeff020106" // header, address, flags
            .to_string()
            + "0816e4fe0100020063"; // mesh: handle 1, version 2, data 0x63

        let dump = dump_one(&pdu, Some(&identity)).unwrap();
        assert!(dump.packet.has_foreign_structures());

        let relayed = dump.relayed.unwrap();
        assert!(relayed.error.is_none());
        assert_eq!(relayed.packet.app_data().unwrap().offset(), 0);
        assert_eq!(relayed.packet.app_data().unwrap().data(), &[0x63]);
    }

    #[test]
    fn test_address_flags_need_take_ownership() {
        let address_only = ["advmesh-dump", "-a", "C6:05:04:03:02:01", "00"];
        assert!(Args::try_parse_from(address_only).is_err());
        assert!(Args::try_parse_from(["advmesh-dump", "--random", "00"]).is_err());
        assert!(Args::try_parse_from(["advmesh-dump", "-o", "--random", "00"]).is_err());
    }

    #[test]
    fn test_take_ownership_needs_address() {
        let args = Args::parse_from(["advmesh-dump", "--take-ownership", "00"]);
        assert!(local_identity(&args).is_err());

        let args = Args::parse_from([
            "advmesh-dump",
            "-o",
            "-a",
            "C6:05:04:03:02:01",
            "--random",
        ]);
        let identity = local_identity(&args).unwrap().unwrap();
        use advmesh::LocalIdentity;
        assert_eq!(
            identity.local_address().unwrap().addr_type,
            AddressType::Random
        );
    }
}
