// Command line interface for detools.
//
// Subcommands keep the underscore names of the classic tool:
// create_patch, apply_patch, apply_patch_in_place and patch_info.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueHint};
use log::{debug, info};

use crate::compress::Compression;
use crate::create::CreateOptions;
use crate::error::{Error, Result};
use crate::format::PatchType;
use crate::info::format_patch_info;
use crate::io::{apply_patch_file, apply_patch_in_place_file, create_patch_file, patch_info_file};

// ---------------------------------------------------------------------------
// Byte size parsing (supports k, M, G and KiB, MiB, GiB suffixes)
// ---------------------------------------------------------------------------

fn parse_byte_size(s: &str) -> std::result::Result<usize, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty size string".into());
    }
    let lower = s.to_ascii_lowercase();
    let (num_part, multiplier) = [
        ("kib", 1u64 << 10),
        ("mib", 1 << 20),
        ("gib", 1 << 30),
        ("k", 1 << 10),
        ("m", 1 << 20),
        ("g", 1 << 30),
    ]
    .iter()
    .find_map(|&(suffix, multiplier)| {
        lower
            .strip_suffix(suffix)
            .map(|num| (num.trim().to_string(), multiplier))
    })
    .unwrap_or((lower.clone(), 1));

    let size = if let Ok(num) = num_part.parse::<u64>() {
        num.checked_mul(multiplier)
            .ok_or_else(|| format!("size overflow: '{s}'"))?
    } else {
        let num: f64 = num_part
            .parse()
            .map_err(|e| format!("invalid size '{s}': {e}"))?;
        let size = num * multiplier as f64;
        if !size.is_finite() || size < 0.0 || size > u64::MAX as f64 {
            return Err(format!("invalid size '{s}'"));
        }
        size.round() as u64
    };
    usize::try_from(size).map_err(|_| format!("size overflow: '{s}'"))
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Binary delta encoding utility.
#[derive(Parser, Debug)]
#[command(
    name = "detools",
    version,
    about = "Binary delta encoding utility",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Print debug logs and error details.
    #[arg(short = 'd', long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Create a patch.
    #[command(name = "create_patch")]
    CreatePatch(CreatePatchArgs),
    /// Apply given normal patch.
    #[command(name = "apply_patch")]
    ApplyPatch(ApplyPatchArgs),
    /// Apply given in-place patch.
    #[command(name = "apply_patch_in_place")]
    ApplyPatchInPlace(ApplyPatchInPlaceArgs),
    /// Display given patch's information.
    #[command(name = "patch_info")]
    PatchInfo(PatchInfoArgs),
}

#[derive(Args, Debug)]
struct CreatePatchArgs {
    /// Patch type (normal or in-place).
    #[arg(short = 't', long = "type", default_value = "normal")]
    patch_type: String,

    /// Compression algorithm (crle, lzma or none).
    #[arg(short = 'c', long, default_value = "lzma")]
    compression: String,

    /// Memory size, in-place patches only (supports k/M/G suffix).
    #[arg(long = "memory-size", value_parser = parse_byte_size)]
    memory_size: Option<usize>,

    /// Segment size, in-place patches only (supports k/M/G suffix).
    #[arg(long = "segment-size", value_parser = parse_byte_size)]
    segment_size: Option<usize>,

    /// Minimum shift size, in-place patches only. Defaults to two segments.
    #[arg(long = "minimum-shift-size", value_parser = parse_byte_size)]
    minimum_shift_size: Option<usize>,

    /// From file.
    #[arg(value_hint = ValueHint::FilePath)]
    fromfile: PathBuf,

    /// To file.
    #[arg(value_hint = ValueHint::FilePath)]
    tofile: PathBuf,

    /// Created patch file.
    #[arg(value_hint = ValueHint::FilePath)]
    patchfile: PathBuf,
}

#[derive(Args, Debug)]
struct ApplyPatchArgs {
    /// From file.
    #[arg(value_hint = ValueHint::FilePath)]
    fromfile: PathBuf,

    /// Patch file.
    #[arg(value_hint = ValueHint::FilePath)]
    patchfile: PathBuf,

    /// Created to file.
    #[arg(value_hint = ValueHint::FilePath)]
    tofile: PathBuf,
}

#[derive(Args, Debug)]
struct ApplyPatchInPlaceArgs {
    /// Memory file, holding the from data and rewritten with the to data.
    #[arg(value_hint = ValueHint::FilePath)]
    memfile: PathBuf,

    /// Patch file.
    #[arg(value_hint = ValueHint::FilePath)]
    patchfile: PathBuf,
}

#[derive(Args, Debug)]
struct PatchInfoArgs {
    /// Print sizes without units.
    #[arg(long = "no-human")]
    no_human: bool,

    /// Print the information as JSON.
    #[arg(long)]
    json: bool,

    /// Patch file.
    #[arg(value_hint = ValueHint::FilePath)]
    patchfile: PathBuf,
}

// ---------------------------------------------------------------------------
// Resolved options
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Command {
    CreatePatch {
        from_file: PathBuf,
        to_file: PathBuf,
        patch_file: PathBuf,
        create: CreateOptions,
    },
    ApplyPatch {
        from_file: PathBuf,
        patch_file: PathBuf,
        to_file: PathBuf,
    },
    ApplyPatchInPlace {
        memory_file: PathBuf,
        patch_file: PathBuf,
    },
    PatchInfo {
        patch_file: PathBuf,
        human: bool,
        json: bool,
    },
}

#[derive(Debug)]
struct Options {
    command: Command,
    debug: bool,
}

/// Turn parsed arguments into options, validating the string-valued
/// settings with the library's own parsers.
fn resolve_options(cli: Cli) -> Result<Options> {
    let command = match cli.command {
        Cmd::CreatePatch(args) => {
            let patch_type: PatchType = args.patch_type.parse()?;
            let compression: Compression = args.compression.parse()?;
            Command::CreatePatch {
                from_file: args.fromfile,
                to_file: args.tofile,
                patch_file: args.patchfile,
                create: CreateOptions {
                    patch_type,
                    compression,
                    memory_size: args.memory_size,
                    segment_size: args.segment_size,
                    minimum_shift_size: args.minimum_shift_size,
                },
            }
        }
        Cmd::ApplyPatch(args) => Command::ApplyPatch {
            from_file: args.fromfile,
            patch_file: args.patchfile,
            to_file: args.tofile,
        },
        Cmd::ApplyPatchInPlace(args) => Command::ApplyPatchInPlace {
            memory_file: args.memfile,
            patch_file: args.patchfile,
        },
        Cmd::PatchInfo(args) => Command::PatchInfo {
            patch_file: args.patchfile,
            human: !args.no_human,
            json: args.json,
        },
    };

    Ok(Options {
        command,
        debug: cli.debug,
    })
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("detools".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn execute(command: &Command) -> Result<()> {
    match command {
        Command::CreatePatch {
            from_file,
            to_file,
            patch_file,
            create,
        } => {
            let stats = create_patch_file(from_file, to_file, patch_file, create)?;
            info!(
                "{} -> {}: patch of {} bytes",
                stats.from_size, stats.to_size, stats.patch_size
            );
            if let Some(digest) = stats.patch_sha256 {
                debug!("patch sha256: {}", hex(&digest));
            }
        }
        Command::ApplyPatch {
            from_file,
            patch_file,
            to_file,
        } => {
            let stats = apply_patch_file(from_file, patch_file, to_file)?;
            info!("wrote {} bytes to {}", stats.to_size, to_file.display());
            if let Some(digest) = stats.to_sha256 {
                debug!("to sha256: {}", hex(&digest));
            }
        }
        Command::ApplyPatchInPlace {
            memory_file,
            patch_file,
        } => {
            let stats = apply_patch_in_place_file(memory_file, patch_file)?;
            info!(
                "rewrote {} from {} to {} bytes",
                memory_file.display(),
                stats.from_size,
                stats.to_size
            );
            if let Some(digest) = stats.to_sha256 {
                debug!("to sha256: {}", hex(&digest));
            }
        }
        Command::PatchInfo {
            patch_file,
            human,
            json,
        } => {
            let info = patch_info_file(patch_file)?;
            if *json {
                println!("{:#}", info.to_json());
            } else {
                print!("{}", format_patch_info(&info, *human));
            }
        }
    }
    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn fail(e: &Error, debug: bool) -> ! {
    eprintln!("error: {e}");
    if debug {
        eprintln!("{e:?}");
    }
    process::exit(1);
}

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let level = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let debug = cli.debug;
    let opts = match resolve_options(cli) {
        Ok(opts) => opts,
        Err(e) => fail(&e, debug),
    };
    if let Err(e) = execute(&opts.command) {
        fail(&e, opts.debug);
    }
    process::exit(0);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
