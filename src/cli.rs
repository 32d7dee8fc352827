// Command-line front end for snapshot delta files.
//
// Snapshots are raw little-endian i32 word files; deltas are `Frame` files.

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::delta::config::{self, BlockSizes, MAX_OFFSET_BLOCK_SIZE, MAX_VALUE_BLOCK_SIZE};
use crate::delta::unpack::DeltaPairs;
use crate::frame::{FRAME_VERSION, Frame};
use crate::io::{self as fio, PackOptions};

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Sparse bit-packed snapshot delta codec.
#[derive(Parser, Debug)]
#[command(
    name = "snapdelta",
    version,
    about = "Sparse snapshot delta encoder/decoder",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Pack a snapshot against a baseline into a delta frame.
    Pack(PackArgs),
    /// Rebuild a snapshot from a baseline and a delta frame.
    Unpack(UnpackArgs),
    /// Print the header and changed words of a delta frame.
    Inspect(InspectArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct BlockArgs {
    /// Named block-size profile (compact, default, wide).
    #[arg(long, conflicts_with_all = ["offset_block", "value_block"])]
    profile: Option<String>,

    /// Block size for index gaps.
    #[arg(long = "offset-block", value_parser = clap::value_parser!(u32).range(1..=MAX_OFFSET_BLOCK_SIZE as i64))]
    offset_block: Option<u32>,

    /// Block size for value differences.
    #[arg(long = "value-block", value_parser = clap::value_parser!(u32).range(1..=MAX_VALUE_BLOCK_SIZE as i64))]
    value_block: Option<u32>,
}

#[derive(Args, Debug)]
struct PackArgs {
    /// Baseline snapshot.
    #[arg(long, short = 'b', value_hint = ValueHint::FilePath)]
    baseline: PathBuf,

    /// Current snapshot.
    #[arg(value_hint = ValueHint::FilePath)]
    current: PathBuf,

    /// Output delta frame.
    #[arg(value_hint = ValueHint::FilePath)]
    output: PathBuf,

    #[command(flatten)]
    blocks: BlockArgs,

    /// Do not store an Adler-32 of the current snapshot.
    #[arg(long = "no-checksum")]
    no_checksum: bool,
}

#[derive(Args, Debug)]
struct UnpackArgs {
    /// Baseline snapshot.
    #[arg(long, short = 'b', value_hint = ValueHint::FilePath)]
    baseline: PathBuf,

    /// Input delta frame.
    #[arg(value_hint = ValueHint::FilePath)]
    delta: PathBuf,

    /// Output snapshot.
    #[arg(value_hint = ValueHint::FilePath)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Delta frame to inspect.
    #[arg(value_hint = ValueHint::FilePath)]
    delta: PathBuf,

    /// Print at most this many changed words.
    #[arg(long, default_value_t = 64)]
    limit: usize,
}

struct Options {
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn resolve_sizes(args: &BlockArgs) -> Result<BlockSizes, String> {
    if let Some(name) = &args.profile {
        return config::profile(name)
            .map(|p| p.sizes)
            .ok_or_else(|| format!("unknown profile '{name}'"));
    }
    BlockSizes::new(
        args.offset_block.unwrap_or(config::DEFAULT_OFFSET_BLOCK_SIZE),
        args.value_block.unwrap_or(config::DEFAULT_VALUE_BLOCK_SIZE),
    )
    .map_err(|e| e.to_string())
}

fn check_output(path: &Path, opts: &Options) -> bool {
    if path.exists() && !opts.force {
        eprintln!(
            "snapdelta: output file exists, use -f to overwrite: {}",
            path.display()
        );
        return false;
    }
    true
}

fn emit_json(json: serde_json::Value) {
    eprintln!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_pack(args: &PackArgs, opts: &Options) -> i32 {
    let sizes = match resolve_sizes(&args.blocks) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("snapdelta: {e}");
            return 1;
        }
    };
    if !check_output(&args.output, opts) {
        return 1;
    }

    let pack_opts = PackOptions {
        sizes,
        checksum: !args.no_checksum,
    };
    let stats = match fio::pack_file(&args.baseline, &args.current, &args.output, pack_opts) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("snapdelta: pack error: {e}");
            return 1;
        }
    };

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "snapdelta: pack: {} of {} words changed, {} bits, {} bytes",
            stats.changed, stats.words, stats.bits, stats.delta_size
        );
    }
    if opts.json_output {
        emit_json(serde_json::json!({
            "command": "pack",
            "words": stats.words,
            "changed": stats.changed,
            "bits": stats.bits,
            "delta_size": stats.delta_size,
            "offset_block": sizes.offset(),
            "value_block": sizes.value(),
        }));
    }
    0
}

fn cmd_unpack(args: &UnpackArgs, opts: &Options) -> i32 {
    if !check_output(&args.output, opts) {
        return 1;
    }
    let stats = match fio::unpack_file(&args.baseline, &args.delta, &args.output) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("snapdelta: unpack error: {e}");
            return 1;
        }
    };

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "snapdelta: unpack: {} words, delta {} bytes, checksum {}",
            stats.words,
            stats.delta_size,
            if stats.verified { "verified" } else { "absent" }
        );
    }
    if opts.json_output {
        emit_json(serde_json::json!({
            "command": "unpack",
            "words": stats.words,
            "delta_size": stats.delta_size,
            "output_size": stats.output_size,
            "verified": stats.verified,
        }));
    }
    0
}

fn cmd_inspect(args: &InspectArgs, opts: &Options) -> i32 {
    let frame: Frame = match fio::read_frame(&args.delta) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("snapdelta: {}: {e}", args.delta.display());
            return 1;
        }
    };
    let pairs = match DeltaPairs::new(
        frame.payload.as_words(),
        frame.payload.bit_len(),
        frame.sizes,
    ) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("snapdelta: {e}");
            return 1;
        }
    };

    println!("frame version:        {FRAME_VERSION}");
    println!("word count:           {}", frame.word_count);
    println!("bit count:            {}", frame.payload.bit_len());
    println!("offset block size:    {}", frame.sizes.offset());
    println!("value block size:     {}", frame.sizes.value());
    match frame.checksum {
        Some(c) => println!("adler32:              {c:#010X}"),
        None => println!("adler32:              none"),
    }

    println!("  index        delta");
    let mut changed = 0usize;
    for pair in pairs {
        let pair = match pair {
            Ok(p) => p,
            Err(e) => {
                eprintln!("snapdelta: corrupt delta after {changed} pairs: {e}");
                return 1;
            }
        };
        if changed < args.limit {
            println!("  {:>10}  {:>+11}", pair.index, pair.delta);
        }
        changed += 1;
    }
    if changed > args.limit {
        println!("  ... {} more", changed - args.limit);
    }
    println!("changed words:        {changed}");

    if opts.json_output {
        emit_json(serde_json::json!({
            "command": "inspect",
            "words": frame.word_count,
            "bits": frame.payload.bit_len(),
            "changed": changed,
            "checksum": frame.checksum,
        }));
    }
    0
}

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("snapdelta version {version} (Rust)");

    let adler32 = cfg!(feature = "adler32") as u8;
    let parallel = cfg!(feature = "parallel") as u8;
    eprintln!("ADLER32_SIMD={adler32}");
    eprintln!("PARALLEL={parallel}");
    eprintln!("FRAME_VERSION={FRAME_VERSION}");
    eprintln!("DEFAULT_OFFSET_BLOCK_SIZE={}", config::DEFAULT_OFFSET_BLOCK_SIZE);
    eprintln!("DEFAULT_VALUE_BLOCK_SIZE={}", config::DEFAULT_VALUE_BLOCK_SIZE);
    for p in config::PROFILES {
        eprintln!(
            "PROFILE_{}={},{}",
            p.name.to_uppercase(),
            p.sizes.offset(),
            p.sizes.value()
        );
    }
    0
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("snapdelta".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv)
        && let Cmd::Pack(args) = &cli.command
    {
        let _ = resolve_sizes(&args.blocks);
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();

    let default_filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let opts = Options {
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose,
        json_output: cli.json_output,
    };

    let exit_code = match &cli.command {
        Cmd::Pack(args) => cmd_pack(args, &opts),
        Cmd::Unpack(args) => cmd_unpack(args, &opts),
        Cmd::Inspect(args) => cmd_inspect(args, &opts),
        Cmd::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let argv: Vec<String> = std::iter::once("snapdelta".to_string())
            .chain(args.iter().map(|s| s.to_string()))
            .collect();
        Cli::try_parse_from(argv).expect("cli parse failed")
    }

    #[test]
    fn pack_with_explicit_blocks() {
        let cli = parse(&[
            "pack",
            "-b",
            "base.bin",
            "cur.bin",
            "out.sdlt",
            "--offset-block",
            "3",
            "--value-block",
            "12",
        ]);
        let Cmd::Pack(args) = cli.command else {
            panic!("expected pack");
        };
        assert_eq!(resolve_sizes(&args.blocks), Ok(BlockSizes::new(3, 12).unwrap()));
        assert!(!args.no_checksum);
    }

    #[test]
    fn pack_with_profile() {
        let cli = parse(&["pack", "-b", "a", "b", "c", "--profile", "wide"]);
        let Cmd::Pack(args) = cli.command else {
            panic!("expected pack");
        };
        assert_eq!(resolve_sizes(&args.blocks), Ok(config::WIDE.sizes));
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let cli = parse(&["pack", "-b", "a", "b", "c", "--profile", "huge"]);
        let Cmd::Pack(args) = cli.command else {
            panic!("expected pack");
        };
        assert!(resolve_sizes(&args.blocks).is_err());
    }

    #[test]
    fn block_sizes_out_of_range_fail_to_parse() {
        let argv = ["snapdelta", "pack", "-b", "a", "b", "c", "--offset-block", "33"];
        assert!(Cli::try_parse_from(argv).is_err());
        let argv = ["snapdelta", "pack", "-b", "a", "b", "c", "--value-block", "0"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn global_flags() {
        let cli = parse(&["-f", "-vv", "--json", "unpack", "-b", "a", "d", "o"]);
        assert!(cli.force);
        assert_eq!(cli.verbose, 2);
        assert!(cli.json_output);
    }

    #[test]
    fn fuzz_parse_tolerates_garbage() {
        let args: Vec<String> = ["pack", "--profile", "", "--", "-b"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        fuzz_try_parse_args(&args);
        fuzz_try_parse_args(&[]);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let argv = ["snapdelta", "-q", "-v", "config"];
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
