use std::{
    fs::File,
    io::{BufReader, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every parameter's value at one frame.
    Eval(EvalArgs),
    /// Print per-parameter value tables over a frame range.
    Table(TableArgs),
}

#[derive(Parser, Debug)]
struct EvalArgs {
    /// Input JSON with `descriptor`, `keyframes` and optional `placed_frame`.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Absolute frame.
    #[arg(long, allow_negative_numbers = true)]
    frame: i64,
}

#[derive(Parser, Debug)]
struct TableArgs {
    /// Input JSON with `descriptor`, `keyframes` and optional `placed_frame`.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// First absolute frame.
    #[arg(long, allow_negative_numbers = true)]
    begin: i64,

    /// Frames after `begin`; the range is inclusive, so `count + 1` rows are printed.
    #[arg(long)]
    count: u32,
}

#[derive(serde::Deserialize, Debug)]
struct ParamsFile {
    descriptor: Vec<reel::ParameterTypeDescriptor>,
    #[serde(default)]
    keyframes: reel::KeyframeMap,
    #[serde(default)]
    placed_frame: reel::Frame,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Eval(args) => cmd_eval(args),
        Command::Table(args) => cmd_table(args),
    }
}

fn read_params(path: &Path) -> anyhow::Result<(reel::TypeDescriptor, ParamsFile)> {
    let f = File::open(path).with_context(|| format!("open parameters '{}'", path.display()))?;
    let mut file: ParamsFile = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse parameters JSON '{}'", path.display()))?;
    let descriptor =
        reel::TypeDescriptor::from_properties(std::mem::take(&mut file.descriptor))
            .context("validate parameter declarations")?;
    for name in file.keyframes.keys() {
        if descriptor.get(name).is_none() {
            tracing::warn!(param = %name, "keyframes for undeclared parameter are ignored");
        }
    }
    Ok((descriptor, file))
}

fn cmd_eval(args: EvalArgs) -> anyhow::Result<()> {
    let (descriptor, file) = read_params(&args.in_path)?;
    let values = reel::values_at(args.frame, file.placed_frame, &descriptor, &file.keyframes)
        .with_context(|| format!("evaluate parameters at frame {}", args.frame))?;
    print_json(&values)
}

fn cmd_table(args: TableArgs) -> anyhow::Result<()> {
    let (descriptor, file) = read_params(&args.in_path)?;
    let tables = reel::values_over_range(
        &descriptor,
        &file.keyframes,
        file.placed_frame,
        args.begin,
        args.count,
    )
    .with_context(|| format!("evaluate {} frames from {}", args.count, args.begin))?;
    print_json(&tables)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value).context("write JSON to stdout")?;
    writeln!(out).context("write JSON to stdout")?;
    Ok(())
}
