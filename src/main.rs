//! portal-cells: inspect portal-cell level files
//!
//! Usage:
//!   portal-cells info level.ron                   # Networks, cells and portals
//!   portal-cells locate level.ron 12 1.5 4        # Cell containing a point
//!   portal-cells visible level.ron 5 3 5 --yaw 90 # Cells seen from a point
//!   portal-cells compress level.ron level.bin     # Re-save brotli-compressed

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use portal_cells::world::{load_level_file, save_level_file, LoadedLevel};
use portal_cells::{Camera, NodeRef, Vec3};

#[derive(Parser)]
#[command(name = "portal-cells")]
#[command(version, about = "Inspect portal-cell level files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print networks, cells and portals
    Info {
        file: PathBuf,
    },
    /// Print the cell containing a point
    #[command(allow_negative_numbers = true)]
    Locate {
        file: PathBuf,
        x: f32,
        y: f32,
        z: f32,
    },
    /// Print the cells visible from a point and the portal clip rectangles
    #[command(allow_negative_numbers = true)]
    Visible {
        file: PathBuf,
        x: f32,
        y: f32,
        z: f32,
        /// Heading in degrees, 0 looks down +Z, 90 down +X
        #[arg(long, default_value_t = 0.0)]
        yaw: f32,
        /// Pitch in degrees, positive looks up
        #[arg(long, default_value_t = 0.0)]
        pitch: f32,
        /// Vertical field of view in degrees
        #[arg(long, default_value_t = 90.0)]
        fov: f32,
    },
    /// Re-save a level file brotli-compressed
    Compress {
        input: PathBuf,
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { file } => info_cmd(&file),
        Commands::Locate { file, x, y, z } => locate_cmd(&file, Vec3::new(x, y, z)),
        Commands::Visible { file, x, y, z, yaw, pitch, fov } => {
            let camera = Camera::new(Vec3::new(x, y, z), yaw.to_radians(), pitch.to_radians())
                .with_lens(fov.to_radians(), 1.0, 0.1);
            visible_cmd(&file, &camera)
        }
        Commands::Compress { input, output } => compress_cmd(&input, &output),
    }
}

/// Load and instantiate a level file
fn open(path: &Path) -> Result<LoadedLevel> {
    let file = load_level_file(path).with_context(|| format!("Failed to load {}", path.display()))?;
    file.instantiate()
        .with_context(|| format!("Failed to build level from {}", path.display()))
}

fn info_cmd(path: &Path) -> Result<()> {
    let loaded = open(path)?;
    let level = &loaded.level;
    println!("level {}: {} networks, {} cells, {} portals",
        level.id(), level.networks().len(), level.cell_count(), level.portal_count());

    for network in level.networks() {
        println!("  network {}", network.id());
        for cell in network.cells() {
            let bounds = cell.bounds().map(|b| format!("{:?} .. {:?}", b.min, b.max));
            println!("    {} portals={} bounds={}",
                cell.id(), cell.portal_count(), bounds.as_deref().unwrap_or("none"));
        }
        for portal in network.portals() {
            let [a, b] = portal.cells();
            println!("    {} joins cells #{} and #{}", portal.id(), a, b);
        }
    }

    for id in &loaded.entities {
        if let Some(tracker) = level.descendant(*id) {
            let cells: Vec<String> = tracker
                .containing()
                .iter()
                .filter_map(|c| level.cell(*c))
                .map(|c| c.id().to_string())
                .collect();
            println!("  entity {} in [{}]", tracker.body().name, cells.join(", "));
        }
    }
    if let Some(position) = loaded.player_position {
        match loaded.player_cell.and_then(|c| level.cell(c)) {
            Some(cell) => println!("  player start {:?} in {}", position, cell.id()),
            None => println!("  player start {:?} outside every cell", position),
        }
    }
    Ok(())
}

fn locate_cmd(path: &Path, point: Vec3) -> Result<()> {
    let loaded = open(path)?;
    match loaded.level.locate(point, None).and_then(|c| loaded.level.cell(c)) {
        Some(cell) => println!("{}", cell.id()),
        None => println!("outside"),
    }
    Ok(())
}

fn visible_cmd(path: &Path, camera: &Camera) -> Result<()> {
    let loaded = open(path)?;
    let level = &loaded.level;
    let current = level
        .locate(camera.position, None)
        .with_context(|| format!("Camera position {:?} is outside every cell", camera.position))?;

    for node in level.visible_nodes(current, camera) {
        match node {
            NodeRef::Level => println!("level {}", level.id()),
            NodeRef::Network(n) => {
                if let Some(network) = level.network(n) {
                    println!("network {}", network.id());
                }
            }
            NodeRef::Cell(c) => {
                if let Some(cell) = level.cell(c) {
                    println!("  {}", cell.id());
                }
            }
        }
    }
    for entry in level.frustum_parameters(current, camera) {
        let f = entry.frustum;
        println!("  through {}: left={:.4} right={:.4} bottom={:.4} top={:.4}",
            entry.portal, f.left, f.right, f.bottom, f.top);
    }
    Ok(())
}

fn compress_cmd(input: &Path, output: &Path) -> Result<()> {
    let file = load_level_file(input).with_context(|| format!("Failed to load {}", input.display()))?;
    save_level_file(&file, output).with_context(|| format!("Failed to save {}", output.display()))?;
    info!("wrote {}", output.display());
    Ok(())
}
