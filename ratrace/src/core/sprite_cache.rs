use crate::core::behavior::Animations;
use crate::core::color::hsl_to_rgb;
use crate::core::rat::{FurColor, VEST_SATURATION};
use crate::pre::sprite_meta::{read_sprite_meta, SpriteSheetMeta};
use anyhow::Context;
use helpers::general::InputValueError;
use image::RgbaImage;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

/// Pixels with a lower alpha value are left untouched.
const ALPHA_THRESHOLD: u8 = 128;
/// Mask pixels with a red channel above this value belong to the vest.
const VEST_MASK_THRESHOLD: u8 = 128;

/// SpriteSheet holds the greyscale sprite sheet together with the vest mask of the same size.
#[derive(Debug, Clone)]
pub struct SpriteSheet {
    meta: SpriteSheetMeta,
    sheet: RgbaImage,
    vest_mask: RgbaImage,
}

impl SpriteSheet {
    pub fn new(
        meta: SpriteSheetMeta,
        sheet: RgbaImage,
        vest_mask: RgbaImage,
    ) -> Result<SpriteSheet, InputValueError> {
        if sheet.dimensions() != vest_mask.dimensions() {
            return Err(InputValueError::new(format!(
                "sprite sheet ({:?}) and vest mask ({:?}) differ in size",
                sheet.dimensions(),
                vest_mask.dimensions()
            )));
        }
        Ok(SpriteSheet {
            meta,
            sheet,
            vest_mask,
        })
    }

    /// load reads the metadata JSON file and both PNG images.
    pub fn load(meta_path: &Path, grey_path: &Path, mask_path: &Path) -> anyhow::Result<SpriteSheet> {
        let meta = read_sprite_meta(meta_path)?;
        let sheet = image::open(grey_path)
            .context(format!("Failed to load sprite sheet {}!", grey_path.display()))?
            .to_rgba8();
        let vest_mask = image::open(mask_path)
            .context(format!("Failed to load vest mask {}!", mask_path.display()))?
            .to_rgba8();

        tracing::info!(
            "Loaded sprite sheet with {} sprites and {} animations",
            meta.sprites.len(),
            meta.animations.len()
        );
        Ok(SpriteSheet::new(meta, sheet, vest_mask)?)
    }

    pub fn get_animations(&self) -> &Animations {
        &self.meta.animations
    }

    pub fn get_cell_size(&self) -> u32 {
        self.meta.cell_size
    }

    /// cut_cell copies the cell of a sprite out of an image, None if the sprite is unknown or its
    /// cell does not lie inside the image.
    fn cut_cell(&self, image: &RgbaImage, sprite_name: &str) -> Option<RgbaImage> {
        let info = self.meta.sprites.get(sprite_name)?;
        let cell_size = self.meta.cell_size;

        if info.x + cell_size > image.width() || info.y + cell_size > image.height() {
            return None;
        }
        Some(image::imageops::crop_imm(image, info.x, info.y, cell_size, cell_size).to_image())
    }
}

// sprite name, vest hue bits, fur (hue, sat, light) bits
type CacheKey = (String, Option<u64>, Option<[u64; 3]>);

/// SpriteRecolorCache tints the greyscale sprites per rat. Recolored sprites are computed once
/// per (sprite, vest hue, fur color) and kept for the lifetime of the cache.
#[derive(Debug)]
pub struct SpriteRecolorCache {
    sprite_sheet: SpriteSheet,
    recolored: HashMap<CacheKey, Rc<RgbaImage>>,
}

impl SpriteRecolorCache {
    pub fn new(sprite_sheet: SpriteSheet) -> SpriteRecolorCache {
        SpriteRecolorCache {
            sprite_sheet,
            recolored: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.recolored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recolored.is_empty()
    }

    /// recolor returns the sprite tinted with the vest hue and the fur color, None if there is
    /// nothing to draw for the sprite name. Vest pixels get hsl(vest_hue, 0.85, grey), fur pixels
    /// hsl(fur.hue, fur.sat, min(1, grey * fur.light)); a missing hue or fur color keeps the
    /// corresponding pixels grey.
    pub fn recolor(
        &mut self,
        sprite_name: &str,
        vest_hue: Option<f64>,
        fur_color: Option<&FurColor>,
    ) -> Option<Rc<RgbaImage>> {
        let key: CacheKey = (
            sprite_name.to_owned(),
            vest_hue.map(f64::to_bits),
            fur_color.map(|fur| [fur.hue.to_bits(), fur.sat.to_bits(), fur.light.to_bits()]),
        );

        if let Some(sprite) = self.recolored.get(&key) {
            return Some(Rc::clone(sprite));
        }

        let mut sprite = self
            .sprite_sheet
            .cut_cell(&self.sprite_sheet.sheet, sprite_name)?;
        let mask = self
            .sprite_sheet
            .cut_cell(&self.sprite_sheet.vest_mask, sprite_name)?;

        for (pixel, mask_pixel) in sprite.pixels_mut().zip(mask.pixels()) {
            if pixel[3] < ALPHA_THRESHOLD {
                continue;
            }

            let grey = pixel[0] as f64 / 255.0;
            let is_vest = mask_pixel[0] > VEST_MASK_THRESHOLD;

            let rgb = match (is_vest, vest_hue, fur_color) {
                (true, Some(hue), _) => hsl_to_rgb(hue, VEST_SATURATION, grey),
                (false, _, Some(fur)) => {
                    hsl_to_rgb(fur.hue, fur.sat, (grey * fur.light).min(1.0))
                }
                _ => continue,
            };
            pixel[0] = rgb.r;
            pixel[1] = rgb.g;
            pixel[2] = rgb.b;
        }

        tracing::trace!(
            sprite = sprite_name,
            ?vest_hue,
            fur = fur_color.map(|fur| fur.name),
            "Recolored sprite"
        );

        let sprite = Rc::new(sprite);
        self.recolored.insert(key, Rc::clone(&sprite));
        Some(sprite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pre::sprite_meta::SpriteInfo;
    use image::Rgba;

    const CELL: u32 = 4;

    fn sprite_info(col: u32) -> SpriteInfo {
        SpriteInfo {
            index: col,
            col,
            row: 0,
            x: col * CELL,
            y: 0,
            original_file: String::new(),
            original_rotation: 0.0,
            directions: Vec::new(),
        }
    }

    fn meta() -> SpriteSheetMeta {
        let mut sprites = HashMap::new();
        sprites.insert("walk_0".to_owned(), sprite_info(0));
        sprites.insert("walk_1".to_owned(), sprite_info(1));
        let mut animations = Animations::new();
        animations.insert(
            "walk".to_owned(),
            vec!["walk_0".to_owned(), "walk_1".to_owned()],
        );
        SpriteSheetMeta {
            cell_size: CELL,
            columns: 2,
            rows: 1,
            sprites,
            animations,
        }
    }

    /// Row 0 is transparent, the left half of the remaining rows is vest, the rest fur. All
    /// opaque pixels are mid grey.
    fn sprite_sheet() -> SpriteSheet {
        let sheet = RgbaImage::from_fn(2 * CELL, CELL, |_, y| {
            if y == 0 {
                Rgba([128, 128, 128, 0])
            } else {
                Rgba([128, 128, 128, 255])
            }
        });
        let mask = RgbaImage::from_fn(2 * CELL, CELL, |x, _| {
            if x % CELL < CELL / 2 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        });
        SpriteSheet::new(meta(), sheet, mask).unwrap()
    }

    const BROWN: FurColor = FurColor {
        hue: 25.0,
        sat: 0.6,
        light: 0.8,
        name: "brown",
    };

    #[test]
    fn vest_and_fur_are_tinted_separately() {
        let mut cache = SpriteRecolorCache::new(sprite_sheet());
        let sprite = cache.recolor("walk_0", Some(120.0), Some(&BROWN)).unwrap();
        let grey = 128.0 / 255.0;

        let vest = hsl_to_rgb(120.0, VEST_SATURATION, grey);
        let fur = hsl_to_rgb(25.0, 0.6, grey * 0.8);
        assert_eq!(*sprite.get_pixel(0, 1), Rgba([vest.r, vest.g, vest.b, 255]));
        assert_eq!(*sprite.get_pixel(3, 2), Rgba([fur.r, fur.g, fur.b, 255]));
    }

    #[test]
    fn transparent_pixels_stay_untouched() {
        let mut cache = SpriteRecolorCache::new(sprite_sheet());
        let sprite = cache.recolor("walk_1", Some(0.0), Some(&BROWN)).unwrap();
        for x in 0..CELL {
            assert_eq!(*sprite.get_pixel(x, 0), Rgba([128, 128, 128, 0]));
        }
    }

    #[test]
    fn missing_colors_keep_the_grey_sprite() {
        let mut cache = SpriteRecolorCache::new(sprite_sheet());
        let sprite = cache.recolor("walk_0", None, None).unwrap();
        assert!(sprite.pixels().all(|p| p[0] == 128 && p[1] == 128 && p[2] == 128));

        let fur_only = cache.recolor("walk_0", None, Some(&BROWN)).unwrap();
        assert_eq!(*fur_only.get_pixel(0, 1), Rgba([128, 128, 128, 255]));
        assert_ne!(*fur_only.get_pixel(3, 1), Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn fur_lightness_is_clamped() {
        let white = FurColor {
            hue: 0.0,
            sat: 0.0,
            light: 2.0,
            name: "white",
        };
        let mut cache = SpriteRecolorCache::new(sprite_sheet());
        let sprite = cache.recolor("walk_0", None, Some(&white)).unwrap();
        assert_eq!(*sprite.get_pixel(3, 1), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn results_are_memoized_per_key() {
        let mut cache = SpriteRecolorCache::new(sprite_sheet());
        let first = cache.recolor("walk_0", Some(180.0), Some(&BROWN)).unwrap();
        let second = cache.recolor("walk_0", Some(180.0), Some(&BROWN)).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        let other_hue = cache.recolor("walk_0", Some(210.0), Some(&BROWN)).unwrap();
        let other_sprite = cache.recolor("walk_1", Some(180.0), Some(&BROWN)).unwrap();
        let no_fur = cache.recolor("walk_0", Some(180.0), None).unwrap();
        assert!(!Rc::ptr_eq(&first, &other_hue));
        assert!(!Rc::ptr_eq(&first, &other_sprite));
        assert!(!Rc::ptr_eq(&first, &no_fur));
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn unknown_sprite_draws_nothing() {
        let mut cache = SpriteRecolorCache::new(sprite_sheet());
        assert!(cache.recolor("groom_0", Some(0.0), None).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn sheet_and_mask_sizes_must_match() {
        let sheet = RgbaImage::new(8, 4);
        let mask = RgbaImage::new(4, 4);
        assert!(SpriteSheet::new(meta(), sheet, mask).is_err());
    }

    #[test]
    fn loads_sheet_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let meta_path = dir.path().join("spritesheet_meta.json");
        let grey_path = dir.path().join("spritesheet_grey.png");
        let mask_path = dir.path().join("spritesheet_vest_mask.png");

        std::fs::write(&meta_path, serde_json::to_string(&meta()).unwrap()).unwrap();
        let sheet = sprite_sheet();
        sheet.sheet.save(&grey_path).unwrap();
        sheet.vest_mask.save(&mask_path).unwrap();

        let loaded = SpriteSheet::load(&meta_path, &grey_path, &mask_path).unwrap();
        assert_eq!(loaded.get_cell_size(), CELL);
        assert_eq!(loaded.get_animations()["walk"].len(), 2);
        assert_eq!(loaded.sheet, sheet.sheet);
    }
}
