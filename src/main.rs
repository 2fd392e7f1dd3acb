//! Cafe CLI - Command-line tool for Wii U BFRES archives.
//!
//! This is the main entry point for the Cafe command-line application.

use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cafe::bfres::{GroupKind, ResourceNode, SubResource, GROUP_COUNT};
use cafe::prelude::*;

/// Cafe - Wii U BFRES inspection and texture export tool
#[derive(Parser)]
#[command(name = "cafe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the header of a BFRES archive
    Info {
        /// Path to the BFRES file
        #[arg(short, long, env = "CAFE_INPUT")]
        input: PathBuf,

        /// Print the header as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the resources of a BFRES archive
    List {
        /// Path to the BFRES file
        #[arg(short, long, env = "CAFE_INPUT")]
        input: PathBuf,

        /// Filter pattern for resource names (glob-style)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Export textures to DDS files
    Export {
        /// Path to the BFRES file
        #[arg(short, long, env = "CAFE_INPUT")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, env = "CAFE_OUTPUT")]
        output: PathBuf,

        /// Filter pattern for texture names (glob-style)
        #[arg(short, long)]
        filter: Option<String>,

        /// Copy the stored surface bytes without untiling
        #[arg(long)]
        raw: bool,
    },

    /// Edit header fields and write the archive to a new file
    SetHeader {
        /// Path to the BFRES file
        #[arg(short, long, env = "CAFE_INPUT")]
        input: PathBuf,

        /// Output BFRES file
        #[arg(short, long)]
        output: PathBuf,

        /// New data alignment
        #[arg(long, value_parser = parse_u32)]
        alignment: Option<u32>,

        /// New total file length
        #[arg(long, value_parser = parse_u32)]
        length: Option<u32>,

        /// New byte order ("Big Endian" or "Little Endian")
        #[arg(long, value_parser = parse_endian)]
        endian: Option<Endian>,

        /// Group item count as SLOT=COUNT (repeatable)
        #[arg(long = "group-count", value_parser = parse_group_count)]
        group_counts: Vec<(usize, u16)>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false)
                .without_time()
                .compact(),
        )
        .with(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to install the log subscriber")?;

    match cli.command {
        Commands::Info { input, json } => {
            cmd_info(&input, json)?;
        }
        Commands::List { input, filter } => {
            cmd_list(&input, filter.as_deref())?;
        }
        Commands::Export {
            input,
            output,
            filter,
            raw,
        } => {
            cmd_export(&input, &output, filter.as_deref(), raw)?;
        }
        Commands::SetHeader {
            input,
            output,
            alignment,
            length,
            endian,
            group_counts,
        } => {
            let edits = HeaderEdits {
                alignment,
                length,
                endian,
                group_counts,
            };
            cmd_set_header(&input, &output, &edits)?;
        }
    }

    Ok(())
}

fn open(path: &Path) -> Result<BfresFile> {
    BfresFile::open(path).with_context(|| format!("Failed to open BFRES archive {}", path.display()))
}

fn compile_filter(filter: Option<&str>) -> Result<Option<Pattern>> {
    filter
        .map(|pattern| Pattern::new(pattern).context("Invalid filter pattern"))
        .transpose()
}

fn is_selected(filter: Option<&Pattern>, name: &str) -> bool {
    filter.map_or(true, |pattern| pattern.matches(name))
}

fn cmd_info(input: &Path, json: bool) -> Result<()> {
    let file = open(input)?;
    let header = file.header();

    if json {
        let groups: Vec<_> = file
            .archive()
            .groups()
            .iter()
            .map(|group| {
                serde_json::json!({
                    "kind": group.kind,
                    "label": group.kind.label(),
                    "entries": group.len(),
                })
            })
            .collect();
        let document = serde_json::json!({
            "name": file.name(),
            "header": header,
            "groups": groups,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    let (major, minor, micro, build) = header.version_parts();
    println!("Name:                {}", file.name());
    println!("Version:             {major}.{minor}.{micro}.{build}");
    println!("Endianness:          {}", header.endian.label());
    println!("Header length:       0x{:X}", header.header_length);
    println!("File length:         0x{:X}", header.length);
    println!("Alignment:           0x{:X}", header.alignment);
    println!("File name offset:    0x{:X}", header.file_name_offset);
    println!("String table length: 0x{:X}", header.string_table_length);
    println!("String table offset: 0x{:X}", header.string_table_offset);
    for kind in GroupKind::ALL {
        let offset = header.group_offsets[kind.index()];
        if offset != 0 {
            println!(
                "  [{:>2}] {:<32} offset 0x{:X}, {} entries",
                kind.index(),
                kind.label(),
                offset,
                header.group_count(kind)
            );
        }
    }
    println!("User pointer:        0x{:X}", header.user_pointer);

    Ok(())
}

fn describe(node: &ResourceNode) -> String {
    match &node.resource {
        SubResource::Model(model) => format!(
            "{} shapes, {} materials, {} vertices",
            model.shape_count, model.material_count, model.total_vertices
        ),
        SubResource::Texture(texture) => {
            let format = texture
                .format_descriptor()
                .map_or_else(|_| format!("format 0x{:X}", texture.format), |f| f.name.to_string());
            format!(
                "{}x{}, {} mips, {}, tile mode {}",
                texture.width, texture.height, texture.mip_count, format, texture.tile_mode
            )
        }
        SubResource::Embedded(file) => format!("{} bytes", file.size),
        SubResource::Other { magic } => String::from_utf8_lossy(magic).into_owned(),
    }
}

fn cmd_list(input: &Path, filter: Option<&str>) -> Result<()> {
    let file = open(input)?;
    let filter = compile_filter(filter)?;

    let mut count = 0;
    for group in file.archive().groups() {
        let nodes: Vec<_> = group
            .nodes
            .iter()
            .filter(|node| is_selected(filter.as_ref(), &node.name))
            .collect();
        if nodes.is_empty() {
            continue;
        }

        println!("{} ({})", group.kind, nodes.len());
        for node in nodes {
            println!("  {:<40} 0x{:08X}  {}", node.name, node.offset, describe(node));
            count += 1;
        }
    }

    println!("\nTotal: {} resources", count);

    Ok(())
}

fn cmd_export(input: &Path, output: &Path, filter: Option<&str>, raw: bool) -> Result<()> {
    let file = open(input)?;
    let filter = compile_filter(filter)?;

    let names: Vec<&str> = file
        .textures()
        .map(|(name, _)| name)
        .filter(|name| is_selected(filter.as_ref(), name))
        .collect();
    info!("Exporting {} textures to {}", names.len(), output.display());

    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))?;

    let untiler: &dyn Untiler = if raw { &Verbatim } else { &LinearCopy };
    let pb = ProgressBar::new(names.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let mut exported = 0;
    let mut errors = 0;

    for name in &names {
        let path = output.join(format!("{}.dds", name.replace(['/', '\\'], "_")));
        match export_texture(&file, name, &path, untiler) {
            Ok(()) => exported += 1,
            Err(e) => {
                pb.suspend(|| warn!("Error exporting {}: {}", name, e));
                errors += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message("Done");
    info!(
        "Exported {} textures in {:?} ({} errors)",
        exported,
        start.elapsed(),
        errors
    );

    Ok(())
}

/// Header fields requested on the command line.
struct HeaderEdits {
    alignment: Option<u32>,
    length: Option<u32>,
    endian: Option<Endian>,
    group_counts: Vec<(usize, u16)>,
}

impl HeaderEdits {
    fn apply(&self, header: &mut BfresHeader) {
        if let Some(alignment) = self.alignment {
            header.alignment = alignment;
        }
        if let Some(length) = self.length {
            header.length = length;
        }
        if let Some(endian) = self.endian {
            header.endian = endian;
        }
        for &(slot, count) in &self.group_counts {
            header.group_counts[slot] = count;
        }
    }
}

fn cmd_set_header(input: &Path, output: &Path, edits: &HeaderEdits) -> Result<()> {
    let mut file = open(input)?;

    let mut header = file.header().clone();
    edits.apply(&mut header);
    if &header == file.header() {
        warn!("No header fields changed");
    }

    file.set_header(header)
        .context("Edited header does not describe a readable archive")?;
    file.save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("Header written to {}", output.display());
    Ok(())
}

/// Parse a decimal or `0x`-prefixed hexadecimal number.
fn parse_u32(value: &str) -> Result<u32> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.with_context(|| format!("invalid number {value:?}"))
}

fn parse_endian(value: &str) -> Result<Endian> {
    if let Some(endian) = Endian::from_label(value) {
        return Ok(endian);
    }
    match value.to_ascii_lowercase().as_str() {
        "big" | "be" => Ok(Endian::Big),
        "little" | "le" => Ok(Endian::Little),
        _ => {
            let labels: Vec<_> = Endian::labels().iter().map(|(_, label)| *label).collect();
            bail!("unknown byte order {value:?}, expected one of {labels:?}")
        }
    }
}

fn parse_group_count(value: &str) -> Result<(usize, u16)> {
    let (slot, count) = value
        .split_once('=')
        .context("expected SLOT=COUNT")?;
    let slot: usize = slot.trim().parse().context("invalid group slot")?;
    if slot >= GROUP_COUNT {
        bail!("group slot {slot} out of range 0..{GROUP_COUNT}");
    }
    let count = parse_u32(count.trim())?;
    let count = u16::try_from(count).context("group count does not fit in 16 bits")?;
    Ok((slot, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_u32("0x2000").unwrap(), 0x2000);
        assert_eq!(parse_u32("512").unwrap(), 512);
        assert!(parse_u32("0xZZ").is_err());
    }

    #[test]
    fn test_parse_endian() {
        assert_eq!(parse_endian("Little Endian").unwrap(), Endian::Little);
        assert_eq!(parse_endian("big").unwrap(), Endian::Big);
        assert!(parse_endian("middle").is_err());
    }

    #[test]
    fn test_parse_group_count() {
        assert_eq!(parse_group_count("1=3").unwrap(), (1, 3));
        assert_eq!(parse_group_count("11=0x10").unwrap(), (11, 16));
        assert!(parse_group_count("12=1").is_err());
        assert!(parse_group_count("1").is_err());
        assert!(parse_group_count("1=70000").is_err());
    }

    #[test]
    fn test_header_edits() {
        let mut header = BfresHeader {
            magic: *BfresHeader::MAGIC,
            version: 0x0304_0004,
            endian: Endian::Big,
            header_length: 0x10,
            length: 0x100,
            alignment: 0x2000,
            file_name_offset: 0,
            string_table_length: 0,
            string_table_offset: 0,
            group_offsets: [0; GROUP_COUNT],
            group_counts: [0; GROUP_COUNT],
            user_pointer: 0,
        };
        HeaderEdits {
            alignment: Some(0x1000),
            length: None,
            endian: Some(Endian::Little),
            group_counts: vec![(1, 4)],
        }
        .apply(&mut header);

        assert_eq!(header.alignment, 0x1000);
        assert_eq!(header.length, 0x100);
        assert_eq!(header.endian, Endian::Little);
        assert_eq!(header.group_counts[1], 4);
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "cafe",
            "-v",
            "set-header",
            "-i",
            "in.bfres",
            "-o",
            "out.bfres",
            "--group-count",
            "1=2",
            "--group-count",
            "0=1",
            "--endian",
            "Little Endian",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        let Commands::SetHeader {
            group_counts,
            endian,
            ..
        } = cli.command
        else {
            panic!("expected set-header");
        };
        assert_eq!(group_counts, vec![(1, 2), (0, 1)]);
        assert_eq!(endian, Some(Endian::Little));
    }
}
