//! Level file loading and saving
//!
//! Uses RON (Rusty Object Notation) for human-readable level files.
//! Supports both compressed (brotli) and uncompressed RON files.
//! - Reading: Auto-detects format by checking for valid RON start
//! - Writing: Always uses brotli compression

use std::fs;
use std::io::Cursor;
use std::path::Path;

use log::{debug, error};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use super::{BuildError, CellRef, Geometry, Level, NamedNode, Renderable};
use crate::math::Vec3;
use crate::settings::{limits, TrackingSettings};
use crate::tracking::{Body, TrackerId, TrackingError};

/// Initial placement of a tracked entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityPlacement {
    pub name: String,
    pub position: Vec3,
    pub renderable: Renderable,
}

/// On-disk description of one level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelFile {
    pub nodes: Vec<NamedNode>,
    #[serde(default)]
    pub initial_player_position: Option<Vec3>,
    #[serde(default)]
    pub entities: Vec<EntityPlacement>,
    #[serde(default)]
    pub settings: TrackingSettings,
}

/// A level file turned into a live level
#[derive(Debug)]
pub struct LoadedLevel {
    pub level: Level,
    /// Trackers of `LevelFile::entities`, in file order
    pub entities: Vec<TrackerId>,
    pub player_position: Option<Vec3>,
    /// Cell holding the player start, if it lies inside the graph
    pub player_cell: Option<CellRef>,
}

/// Error type for level file loading
#[derive(Debug, Error)]
pub enum LevelFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("Compression error: {0}")]
    Compression(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Build error: {0}")]
    Build(#[from] BuildError),
    #[error("Entity error: {0}")]
    Entity(#[from] TrackingError),
}

impl LevelFile {
    /// Build the graph and attach every placed entity
    pub fn instantiate(self) -> Result<LoadedLevel, LevelFileError> {
        let mut level = Level::build_with_settings(self.nodes, self.settings)?;

        let mut entities = Vec::with_capacity(self.entities.len());
        for placement in self.entities {
            let body = Body::new(placement.name, placement.renderable, placement.position);
            entities.push(level.attach_descendant(body)?);
        }

        let player_cell = self.initial_player_position.and_then(|p| level.locate(p, None));
        debug!(
            "instantiated level {}: {} networks, {} entities",
            level.id(), level.networks().len(), entities.len()
        );

        Ok(LoadedLevel {
            level,
            entities,
            player_position: self.initial_player_position,
            player_cell,
        })
    }
}

/// Check if a float is valid (not NaN or Inf)
fn is_valid_float(f: f32) -> bool {
    f.is_finite() && f.abs() <= limits::MAX_COORD
}

fn is_valid_point(v: Vec3) -> bool {
    is_valid_float(v.x) && is_valid_float(v.y) && is_valid_float(v.z)
}

fn validate_name(name: &str, context: &str) -> Result<(), String> {
    if name.len() > limits::MAX_NAME_LEN {
        return Err(format!("{}: name too long ({} > {})", context, name.len(), limits::MAX_NAME_LEN));
    }
    Ok(())
}

fn validate_geometry(geometry: &Geometry, context: &str) -> Result<(), String> {
    if geometry.triangles.len() > limits::MAX_TRIANGLES_PER_NODE {
        return Err(format!("{}: too many triangles ({} > {})",
            context, geometry.triangles.len(), limits::MAX_TRIANGLES_PER_NODE));
    }
    for (i, tri) in geometry.triangles.iter().enumerate() {
        if !tri.vertices().into_iter().all(is_valid_point) {
            return Err(format!("{} triangle[{}]: invalid coordinates", context, i));
        }
    }
    Ok(())
}

fn validate_renderable(renderable: &Renderable, context: &str) -> Result<(), String> {
    match renderable {
        Renderable::Geometry(g) => validate_geometry(g, context),
        Renderable::Composite(parts) => {
            for (i, part) in parts.iter().enumerate() {
                validate_geometry(part, &format!("{} part[{}]", context, i))?;
            }
            Ok(())
        }
    }
}

/// Validate a level file before building anything from it
pub fn validate_level_file(file: &LevelFile) -> Result<(), LevelFileError> {
    if file.nodes.len() > limits::MAX_NODES {
        return Err(LevelFileError::Validation(format!(
            "too many nodes ({} > {})", file.nodes.len(), limits::MAX_NODES
        )));
    }
    if file.entities.len() > limits::MAX_ENTITIES {
        return Err(LevelFileError::Validation(format!(
            "too many entities ({} > {})", file.entities.len(), limits::MAX_ENTITIES
        )));
    }
    if file.settings.initial_pool_capacity > limits::MAX_POOL_CAPACITY {
        return Err(LevelFileError::Validation(format!(
            "initial pool capacity too large ({} > {})",
            file.settings.initial_pool_capacity, limits::MAX_POOL_CAPACITY
        )));
    }
    if let Some(p) = file.initial_player_position {
        if !is_valid_point(p) {
            return Err(LevelFileError::Validation(format!(
                "invalid player position ({}, {}, {})", p.x, p.y, p.z
            )));
        }
    }

    for (i, node) in file.nodes.iter().enumerate() {
        let context = format!("node[{}]", i);
        validate_name(&node.name, &context).map_err(LevelFileError::Validation)?;
        if let Some(geometry) = &node.geometry {
            validate_geometry(geometry, &format!("{} {:?}", context, node.name))
                .map_err(LevelFileError::Validation)?;
        }
    }

    for (i, entity) in file.entities.iter().enumerate() {
        let context = format!("entity[{}]", i);
        validate_name(&entity.name, &context).map_err(LevelFileError::Validation)?;
        if !is_valid_point(entity.position) {
            return Err(LevelFileError::Validation(format!("{}: invalid position", context)));
        }
        validate_renderable(&entity.renderable, &context).map_err(LevelFileError::Validation)?;
    }

    Ok(())
}

/// Bounds are skipped by serde; rebuild them after parsing
fn recalculate_bounds(file: &mut LevelFile) {
    for node in &mut file.nodes {
        if let Some(geometry) = node.geometry.as_mut() {
            geometry.recalculate_bounds();
        }
    }
    for entity in &mut file.entities {
        entity.renderable.recalculate_bounds();
    }
}

/// Log where in the text a RON error points
fn log_parse_error(source: &str, contents: &str, e: &ron::error::SpannedError) {
    error!("RON parse error in {}: {}", source, e);
    let pos = e.position;
    let lines: Vec<&str> = contents.lines().collect();
    let line_idx = pos.line.saturating_sub(1);
    if let Some(line) = lines.get(line_idx) {
        error!("  Line {}: {}", pos.line, line);
        if pos.col > 0 && pos.col <= line.len() {
            let start = pos.col.saturating_sub(20);
            let end = (pos.col + 30).min(line.len());
            if let Some(context) = line.get(start..end) {
                error!("  Context: ...{}...", context);
            }
        }
    }
}

/// Load a level file (supports both compressed and uncompressed)
pub fn load_level_file<P: AsRef<Path>>(path: P) -> Result<LevelFile, LevelFileError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    decode_level_data(&bytes, &path.display().to_string())
}

/// Parse level data from bytes
pub fn parse_level_data(bytes: &[u8]) -> Result<LevelFile, LevelFileError> {
    decode_level_data(bytes, "<memory>")
}

fn decode_level_data(bytes: &[u8], source: &str) -> Result<LevelFile, LevelFileError> {
    // Detect format: RON files start with '(' or whitespace, brotli is binary
    let is_plain_ron = bytes.first().map(|&b| b == b'(' || b == b' ' || b == b'\n' || b == b'\r' || b == b'\t').unwrap_or(false);

    let contents = if is_plain_ron {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| LevelFileError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid UTF-8: {}", e)
            )))?
    } else {
        // Brotli compressed - decompress first
        let mut decompressed = Vec::new();
        brotli::BrotliDecompress(&mut Cursor::new(bytes), &mut decompressed)
            .map_err(|e| LevelFileError::Compression(format!("brotli decompression failed: {}", e)))?;
        String::from_utf8(decompressed)
            .map_err(|e| LevelFileError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid UTF-8 after decompression: {}", e)
            )))?
    };

    let mut file: LevelFile = match ron::from_str(&contents) {
        Ok(f) => f,
        Err(e) => {
            log_parse_error(source, &contents, &e);
            return Err(e.into());
        }
    };

    // Validate level to prevent malicious files
    validate_level_file(&file)?;
    recalculate_bounds(&mut file);
    Ok(file)
}

/// Load a level file from a RON string (for embedded levels or testing)
pub fn level_file_from_str(s: &str) -> Result<LevelFile, LevelFileError> {
    let mut file: LevelFile = ron::from_str(s)?;
    validate_level_file(&file)?;
    recalculate_bounds(&mut file);
    Ok(file)
}

/// Serialize a level file to pretty RON text
pub fn serialize_level_file(file: &LevelFile) -> Result<String, LevelFileError> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());
    Ok(ron::ser::to_string_pretty(file, config)?)
}

/// Save a level file as compressed RON (brotli)
pub fn save_level_file<P: AsRef<Path>>(file: &LevelFile, path: P) -> Result<(), LevelFileError> {
    let ron_string = serialize_level_file(file)?;

    // Compress with brotli (quality 6, window 22 - good balance of speed/ratio)
    let mut compressed = Vec::new();
    brotli::BrotliCompress(&mut Cursor::new(ron_string.as_bytes()), &mut compressed, &brotli::enc::BrotliEncoderParams {
        quality: 6,
        lgwin: 22,
        ..Default::default()
    }).map_err(|e| LevelFileError::Compression(format!("brotli compression failed: {}", e)))?;

    fs::write(path, compressed)?;
    Ok(())
}
