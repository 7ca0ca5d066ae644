//! ply-tool - PLY mesh inspection and conversion
//!
//! Prints headers, validates meshes and converts between ASCII and binary PLY.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nether_ply::{PlyOptions, PropertyType, export_mesh, import_mesh, read_header_from_path};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ply-tool")]
#[command(about = "Inspect, validate and convert PLY meshes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the header of a PLY file
    Info {
        /// Input PLY file
        input: PathBuf,
    },

    /// Import a PLY file and report what it contains
    Check {
        /// Input PLY file
        input: PathBuf,

        /// Weld nearby vertices before reporting
        #[arg(long)]
        merge: bool,
    },

    /// Re-export a PLY file
    Convert {
        /// Input PLY file
        input: PathBuf,

        /// Output PLY file (default: <input>.converted.ply)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Options file with an [options] table
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write ASCII instead of binary
        #[arg(long)]
        ascii: bool,

        /// Write vertex normals
        #[arg(long)]
        normals: bool,

        /// Skip UVs
        #[arg(long)]
        no_uvs: bool,

        /// Skip vertex colors
        #[arg(long)]
        no_colors: bool,

        /// Weld nearby vertices on import
        #[arg(long)]
        merge: bool,

        /// Scale applied to positions
        #[arg(long)]
        scale: Option<f32>,
    },
}

/// Optional TOML settings for `convert`
#[derive(Debug, Default, Deserialize)]
struct ToolConfig {
    #[serde(default)]
    options: PlyOptions,
}

fn load_config(path: &Path) -> Result<ToolConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { input } => {
            let header = read_header_from_path(&input)
                .with_context(|| format!("Failed to read header: {}", input.display()))?;

            println!("format: {} {}", header.format.name(), header.version);
            for comment in &header.comments {
                println!("comment: {comment}");
            }
            for element in &header.elements {
                println!("element {} ({} records)", element.name, element.count);
                for property in &element.properties {
                    let kind = match property.ty {
                        PropertyType::Scalar(_) => "scalar",
                        PropertyType::List { .. } => "list",
                    };
                    println!("  {} {} [{}]", property.ty, property.name, kind);
                }
            }
        }

        Commands::Check { input, merge } => {
            let options = PlyOptions {
                merge_verts_on_import: merge,
                ..Default::default()
            };
            let mesh = import_mesh(&input, &options)
                .with_context(|| format!("Failed to import: {}", input.display()))?;

            println!("vertices: {}", mesh.vertex_count());
            println!("faces: {}", mesh.faces.len());
            println!("edges: {}", mesh.edges.len());
            println!("normals: {}", mesh.normals.is_some());
            println!("colors: {}", mesh.colors.is_some());
            println!("uvs: {}", mesh.uvs.is_some());
            tracing::info!("{:?} is valid", input);
        }

        Commands::Convert {
            input,
            output,
            config,
            ascii,
            normals,
            no_uvs,
            no_colors,
            merge,
            scale,
        } => {
            let mut options = match &config {
                Some(path) => load_config(path)?.options,
                None => PlyOptions::default(),
            };
            options.ascii_format |= ascii;
            options.export_normals |= normals;
            options.export_uvs &= !no_uvs;
            options.export_colors &= !no_colors;
            options.merge_verts_on_import |= merge;
            if let Some(scale) = scale {
                options.global_scale = scale;
            }

            let output = output.unwrap_or_else(|| input.with_extension("converted.ply"));
            tracing::info!("Converting {:?} -> {:?}", input, output);

            let mesh = import_mesh(&input, &options)
                .with_context(|| format!("Failed to import: {}", input.display()))?;
            export_mesh(&output, &mesh, &options)
                .with_context(|| format!("Failed to export: {}", output.display()))?;
            tracing::info!("Done!");
        }
    }

    Ok(())
}
