//! dmx2gltf - convert DMX model/animation files to glTF 2.0.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use dmx_gltf::codec::{AttributeValue, DmxDocument};
use dmx_gltf::gltf::{self, ExportOptions, DEFAULT_SCALE};
use dmx_gltf::dme::DagNode;
use dmx_gltf::DmElement;

#[derive(Parser)]
#[command(name = "dmx2gltf")]
#[command(about = "Convert DMX model and animation files to glTF 2.0")]
#[command(version)]
struct Cli {
    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert .dmx files next to their inputs
    Convert(ConvertArgs),

    /// Show header and element statistics
    Info {
        /// Input .dmx file
        input: PathBuf,
    },

    /// Print the raw element graph
    Dump {
        /// Input .dmx file
        input: PathBuf,
    },
}

#[derive(Args)]
struct ConvertArgs {
    /// Input files; non-.dmx files are skipped
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Uniform scale applied to positions and translations
    #[arg(short, long, default_value_t = DEFAULT_SCALE)]
    scale: f32,

    /// Write binary .glb instead of .gltf + .bin
    #[arg(long)]
    glb: bool,

    /// Output directory (defaults to each input's directory)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Convert(args) => cmd_convert(&args),
        Commands::Info { input } => cmd_info(&input),
        Commands::Dump { input } => cmd_dump(&input),
    }
}

// ============================================================================
// convert
// ============================================================================

fn is_dmx(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("dmx"))
}

fn output_path(input: &Path, args: &ConvertArgs) -> PathBuf {
    let ext = if args.glb { "glb" } else { "gltf" };
    let out = input.with_extension(ext);
    match (&args.output, out.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => out,
    }
}

fn convert_one(input: &Path, args: &ConvertArgs) -> Result<PathBuf> {
    let title = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let options = ExportOptions::default().with_scale(args.scale).with_title(title);

    let element = dmx_gltf::load(input).with_context(|| format!("failed to read {}", input.display()))?;
    let doc = gltf::convert(&element, &options).with_context(|| format!("failed to convert {}", input.display()))?;

    let out = output_path(input, args);
    doc.save(&out).with_context(|| format!("failed to write {}", out.display()))?;
    Ok(out)
}

fn cmd_convert(args: &ConvertArgs) -> Result<()> {
    let (inputs, skipped): (Vec<&PathBuf>, Vec<&PathBuf>) = args.inputs.iter().partition(|p| is_dmx(p));
    for path in &skipped {
        warn!("skipping {} (not a .dmx file)", path.display());
    }
    if let Some(dir) = &args.output {
        std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let failed = inputs
        .par_iter()
        .filter(|input| {
            info!("converting {}", input.display());
            match convert_one(input, args) {
                Ok(out) => {
                    info!("saved {}", out.display());
                    false
                }
                Err(e) => {
                    error!("{:#}", e);
                    true
                }
            }
        })
        .count();

    info!("{} converted, {} failed, {} skipped", inputs.len() - failed, failed, skipped.len());
    if failed > 0 {
        anyhow::bail!("{} of {} files failed", failed, inputs.len());
    }
    Ok(())
}

// ============================================================================
// info / dump
// ============================================================================

fn open(path: &Path) -> Result<DmxDocument> {
    dmx_gltf::open(path).with_context(|| format!("failed to read {}", path.display()))
}

fn cmd_info(path: &Path) -> Result<()> {
    let doc = open(path)?;

    println!("File: {}", path.display());
    println!("Header: {}", doc.header);
    println!("Strings: {}", doc.strings.len());
    println!("Elements: {}", doc.elements.len());

    let mut types: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, element) in doc.elements.iter() {
        *types.entry(&*element.type_name).or_default() += 1;
    }
    println!();
    println!("Types:");
    for (name, count) in &types {
        println!("  {:<28} {}", name, count);
    }

    match DmElement::from_document(&doc) {
        Ok(root) => {
            println!();
            println!("Root: {:?}", root.name);
            if let Some(model) = &root.model {
                println!("  Model:    {} ({} joints)", model.name(), model.joint_names.len());
                print_meshes(model.children());
            }
            if let Some(skeleton) = &root.skeleton {
                println!("  Skeleton: {}", skeleton.name());
            }
            if let Some(list) = &root.animation_list {
                for clip in &list.animations {
                    println!("  Clip:     {} ({} channels)", clip.name, clip.channels.len());
                }
            }
        }
        Err(e) => println!("\nNot a model file: {}", e),
    }
    Ok(())
}

fn print_meshes(children: &[DagNode]) {
    for child in children {
        let dag = child.dag();
        let mesh = match child {
            DagNode::Mesh(mesh) => Some(mesh),
            _ => dag.mesh(),
        };
        if let Some(mesh) = mesh {
            let polygons: usize = mesh.face_sets.iter().map(|fs| fs.polygon_count()).sum();
            println!(
                "  Mesh:     {} ({} vertices, {} polygons, {} face sets)",
                dag.name,
                mesh.current_state.vertex_count(),
                polygons,
                mesh.face_sets.len()
            );
        }
        print_meshes(&dag.children);
    }
}

fn summarize(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Element(Some(id)) => id.to_string(),
        AttributeValue::Element(None) => "null".to_string(),
        AttributeValue::String(s) => format!("{:?}", s),
        AttributeValue::Binary(b) => format!("<{} bytes>", b.len()),
        AttributeValue::ElementArray(ids) => {
            let items: Vec<String> = ids
                .iter()
                .map(|id| id.map_or_else(|| "null".to_string(), |id| id.to_string()))
                .collect();
            format!("[{}]", items.join(", "))
        }
        v if v.is_array() => format!("{}[{}]", v.type_name(), v.array_len().unwrap_or(0)),
        v => format!("{:?}", v),
    }
}

fn cmd_dump(path: &Path) -> Result<()> {
    let doc = open(path)?;
    println!("{}", doc.header);

    for (id, element) in doc.elements.iter() {
        println!();
        println!("{} {} {:?} {}", id, element.type_name, element.name, element.id);
        for attr in &element.attributes {
            println!("  {} = {}", attr.name, summarize(&attr.value));
        }
    }
    Ok(())
}
