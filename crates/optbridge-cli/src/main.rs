use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use optbridge_config::{init_tracing, load_for_project, OptbridgeConfig};
use optbridge_driver::{CatalogLine, Patcher};
use optbridge_jasm::{parse_class, write_class, ClassFile};
use optbridge_patch::{eliminate_cast, patch_empty_variant, Catalog, SynthesisContext};
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "optbridge",
    version,
    about = "Patch the erased bridges of a compiled option library"
)]
struct Cli {
    /// Project root; relative config paths resolve against it
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
    /// Config file (defaults to `$OPTBRIDGE_CONFIG` or `<root>/optbridge.toml`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Patch the whole library in place through the configured assembler
    Run(RunArgs),
    /// Remove the argument cast from one `Some` class's bridge
    EliminateCast(EliminateCastArgs),
    /// List the interface methods the empty class needs bridges for
    Catalog(CatalogArgs),
    /// Add the specialised interfaces and their bridges to the empty class
    PatchEmpty(PatchEmptyArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct EliminateCastArgs {
    /// Disassembled class
    input: PathBuf,
    /// Method whose bridge is rewritten (defaults to the configured one)
    #[arg(long)]
    method: Option<String>,
    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct CatalogArgs {
    /// Disassembled generic and specialised interfaces
    #[arg(required = true)]
    interfaces: Vec<PathBuf>,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct PatchEmptyArgs {
    /// Disassembled empty class
    input: PathBuf,
    /// Disassembled generic and specialised interfaces
    #[arg(long = "interface", required = true)]
    interfaces: Vec<PathBuf>,
    /// Source line of the empty class's declaration
    #[arg(long)]
    line: u32,
    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    let config = load_config(&cli.root, cli.config.as_deref())?;
    init_tracing(&config.logging);
    let layout = &config.library;

    match cli.command {
        Command::Run(args) => {
            let patcher = Patcher::from_config(&config, &cli.root)?;
            let report = patcher.run()?;
            print_output(&report, args.json)?;
        }
        Command::EliminateCast(args) => {
            let class = read_class(&args.input)?;
            let method = args.method.as_deref().unwrap_or(layout.cast_method.as_str());
            let patched = eliminate_cast(&class, method)
                .with_context(|| format!("failed to patch {}", args.input.display()))?;
            write_output(args.output.as_deref(), &write_class(&patched))?;
        }
        Command::Catalog(args) => {
            let catalog = read_catalog(&args.interfaces, &config)?;
            print_output(&CatalogLine::from_catalog(&catalog), args.json)?;
        }
        Command::PatchEmpty(args) => {
            let catalog = read_catalog(&args.interfaces, &config)?;
            let bridges = catalog.synthesize(&SynthesisContext {
                layout,
                line: args.line,
            })?;
            let class = read_class(&args.input)?;
            let patched = patch_empty_variant(&class, &bridges, layout)
                .with_context(|| format!("failed to patch {}", args.input.display()))?;
            tracing::info!(bridges = bridges.len(), "patched empty class");
            write_output(args.output.as_deref(), &write_class(&patched))?;
        }
    }
    Ok(0)
}

fn load_config(root: &Path, explicit: Option<&Path>) -> Result<OptbridgeConfig> {
    match explicit {
        Some(path) => Ok(OptbridgeConfig::load_from_path(path)
            .with_context(|| format!("failed to load {}", path.display()))?
            .resolve_paths(root)),
        None => {
            let (config, _path) = load_for_project(root)?;
            Ok(config)
        }
    }
}

fn read_class(path: &Path) -> Result<ClassFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_class(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn read_catalog(paths: &[PathBuf], config: &OptbridgeConfig) -> Result<Catalog> {
    let interfaces = paths
        .iter()
        .map(|path| read_class(path))
        .collect::<Result<Vec<_>>>()?;
    Ok(Catalog::collect(&interfaces, &config.library)?)
}

fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

trait Render {
    fn render(&self) -> String;
}

impl Render for optbridge_driver::PatchReport {
    fn render(&self) -> String {
        self.to_string()
    }
}

impl Render for Vec<CatalogLine> {
    fn render(&self) -> String {
        self.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn print_output<T: Serialize + Render>(value: &T, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(value)?;
        println!("{out}");
    } else {
        println!("{}", value.render());
    }
    Ok(())
}
