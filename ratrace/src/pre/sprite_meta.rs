use crate::core::behavior::{AnimKind, Animations};
use anyhow::Context;
use helpers::general::InputValueError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::Path;

/// Position of a single sprite inside the sprite sheet.
///
/// * `col`, `row` - Cell indices inside the sheet
/// * `x`, `y` - (px) Top left corner of the cell
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SpriteInfo {
    #[serde(default)]
    pub index: u32,
    pub col: u32,
    pub row: u32,
    pub x: u32,
    pub y: u32,
    #[serde(default)]
    pub original_file: String,
    #[serde(default)]
    pub original_rotation: f64,
    #[serde(default)]
    pub directions: Vec<String>,
}

/// * `cell_size` - (px) Edge length of the square sprite cells
/// * `columns`, `rows` - Number of cells in the sheet
/// * `sprites` - Sprite name -> cell position
/// * `animations` - Animation name -> ordered sprite names
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SpriteSheetMeta {
    pub cell_size: u32,
    pub columns: u32,
    pub rows: u32,
    pub sprites: HashMap<String, SpriteInfo>,
    #[serde(default)]
    pub animations: Animations,
}

impl SpriteSheetMeta {
    /// validate checks that all cells lie inside the sheet and that every animation frame refers
    /// to a known sprite.
    pub fn validate(&self) -> Result<(), InputValueError> {
        if self.cell_size == 0 {
            return Err(InputValueError::new("cell_size must be positive"));
        }

        let sheet_w = self.columns * self.cell_size;
        let sheet_h = self.rows * self.cell_size;

        for (name, info) in self.sprites.iter() {
            if info.x + self.cell_size > sheet_w || info.y + self.cell_size > sheet_h {
                return Err(InputValueError::new(format!(
                    "sprite {} at ({}, {}) exceeds the {}x{} sheet",
                    name, info.x, info.y, sheet_w, sheet_h
                )));
            }
        }

        for (anim_name, frames) in self.animations.iter() {
            if let Some(frame) = frames.iter().find(|f| !self.sprites.contains_key(*f)) {
                return Err(InputValueError::new(format!(
                    "animation {} refers to unknown sprite {}",
                    anim_name, frame
                )));
            }
        }
        Ok(())
    }
}

/// read_sprite_meta reads and validates the sprite sheet metadata JSON file.
pub fn read_sprite_meta(filepath: &Path) -> anyhow::Result<SpriteSheetMeta> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open sprite sheet metadata {}!",
            filepath.display()
        ))?;
    let meta: SpriteSheetMeta = serde_json::from_reader(&fh).context(format!(
        "Failed to parse sprite sheet metadata {}!",
        filepath.display()
    ))?;
    meta.validate().context(format!(
        "Invalid sprite sheet metadata {}!",
        filepath.display()
    ))?;
    Ok(meta)
}

/// Frame counts of the built-in animation table.
const DEFAULT_FRAME_COUNTS: [(AnimKind, usize); 4] = [
    (AnimKind::Walk, 8),
    (AnimKind::Sniff, 4),
    (AnimKind::Groom, 6),
    (AnimKind::Turn, 6),
];

/// default_animations returns an animation table with placeholder sprite names (`walk_00`, ...).
/// It keeps the frame timing of all behaviors when no sprite sheet is loaded.
pub fn default_animations() -> Animations {
    DEFAULT_FRAME_COUNTS
        .iter()
        .map(|(kind, no_frames)| {
            (
                kind.name().to_owned(),
                (0..*no_frames)
                    .map(|i| format!("{}_{:02}", kind.name(), i))
                    .collect(),
            )
        })
        .collect()
}
