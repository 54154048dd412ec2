//! Sprite-sheet manifest ingestion.
//!
//! Parses a packer-emitted JSON manifest and installs one [`View`] per
//! named frame over a single shared base resource. Frame rectangles are
//! kept in atlas pixel space; the manifest's export scale is reflected in
//! the base resource's pixel density instead of rescaling the geometry.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::cache::Registry;
use crate::foundation::core::{Point, Rect, rect_xywh};
use crate::foundation::error::{TexviewError, TexviewResult};
use crate::resource::BaseResource;
use crate::view::{View, ViewOpts, rotate};

/// Rectangle as emitted by sprite packers: origin plus size.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct SheetRect {
    /// Left edge in atlas pixels.
    pub x: f64,
    /// Top edge in atlas pixels.
    pub y: f64,
    /// Width in pixels.
    pub w: f64,
    /// Height in pixels.
    pub h: f64,
}

impl SheetRect {
    fn rect(self) -> Rect {
        rect_xywh(self.x, self.y, self.w, self.h)
    }
}

/// Width/height pair (`sourceSize`).
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct SheetSize {
    /// Width in pixels.
    pub w: f64,
    /// Height in pixels.
    pub h: f64,
}

/// Normalized pivot point (`pivot`).
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct SheetPoint {
    /// Horizontal component, 0..1.
    pub x: f64,
    /// Vertical component, 0..1.
    pub y: f64,
}

/// One packed frame entry.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetFrame {
    /// Packed rectangle inside the atlas. For rotated entries the packer
    /// records the unrotated size; the occupied atlas region swaps it.
    pub frame: SheetRect,
    /// The packer stored the sub-image quarter-turned.
    #[serde(default)]
    pub rotated: bool,
    /// Transparent borders were trimmed off before packing.
    #[serde(default)]
    pub trimmed: bool,
    /// Visible-region offset inside the original image (trimmed entries).
    #[serde(default)]
    pub sprite_source_size: Option<SheetRect>,
    /// Original untrimmed image size.
    #[serde(default)]
    pub source_size: Option<SheetSize>,
    /// Default anchor for consumers of this frame.
    #[serde(default)]
    pub pivot: Option<SheetPoint>,
}

/// Manifest metadata.
#[derive(Clone, Debug, Deserialize)]
pub struct SheetMeta {
    /// Atlas image locator.
    #[serde(default)]
    pub image: Option<String>,
    /// Packer export scale; numbers and numeric strings are both accepted.
    #[serde(default = "default_scale", deserialize_with = "scale_from_repr")]
    pub scale: f64,
}

impl Default for SheetMeta {
    fn default() -> Self {
        Self {
            image: None,
            scale: 1.0,
        }
    }
}

fn default_scale() -> f64 {
    1.0
}

fn scale_from_repr<'de, D>(d: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(f64),
        Str(String),
    }

    match Repr::deserialize(d)? {
        Repr::Num(v) => Ok(v),
        Repr::Str(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid sheet scale \"{s}\""))),
    }
}

/// Parsed sprite-sheet manifest.
#[derive(Clone, Debug, Deserialize)]
pub struct SheetManifest {
    /// Frame entries keyed by sprite name, ordered for deterministic
    /// installation.
    pub frames: BTreeMap<String, SheetFrame>,
    /// Export metadata.
    #[serde(default)]
    pub meta: SheetMeta,
}

impl SheetManifest {
    /// Parse a packer-emitted JSON manifest.
    pub fn parse(json: &str) -> TexviewResult<SheetManifest> {
        serde_json::from_str(json)
            .map_err(|e| TexviewError::configuration(format!("malformed sheet manifest: {e}")))
    }

    /// Install every frame as a view over `base`, registered in `registry`
    /// under its frame name. Returns the views in name order.
    ///
    /// An export scale other than `1.0` is written into the base resource's
    /// resolution unless the resource already carries a non-default density.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn install(
        &self,
        registry: &Registry,
        base: &BaseResource,
    ) -> TexviewResult<Vec<View>> {
        if self.meta.scale != 1.0 && base.resolution() == 1.0 {
            base.set_resolution(self.meta.scale);
        }

        let mut views = Vec::with_capacity(self.frames.len());
        for (name, entry) in &self.frames {
            let packed = entry.frame;
            let frame = if entry.rotated {
                rect_xywh(packed.x, packed.y, packed.h, packed.w)
            } else {
                packed.rect()
            };

            let (orig, trim) = if entry.trimmed {
                let source = entry.source_size.ok_or_else(|| {
                    TexviewError::configuration(format!(
                        "frame '{name}' is trimmed but has no sourceSize"
                    ))
                })?;
                let visible = entry.sprite_source_size.ok_or_else(|| {
                    TexviewError::configuration(format!(
                        "frame '{name}' is trimmed but has no spriteSourceSize"
                    ))
                })?;
                (rect_xywh(0.0, 0.0, source.w, source.h), Some(visible.rect()))
            } else if let Some(source) = entry.source_size {
                (rect_xywh(0.0, 0.0, source.w, source.h), None)
            } else {
                (rect_xywh(0.0, 0.0, packed.w, packed.h), None)
            };

            let view = View::new(
                base,
                ViewOpts {
                    frame: Some(frame),
                    orig: Some(orig),
                    trim,
                    rotation: if entry.rotated {
                        rotate::QUARTER
                    } else {
                        rotate::UPRIGHT
                    },
                    anchor: entry
                        .pivot
                        .map_or(Point::ZERO, |p| Point::new(p.x, p.y)),
                },
            )?;
            registry.register(&view, name);
            views.push(view);
        }
        Ok(views)
    }
}

#[cfg(test)]
#[path = "../tests/unit/sheet.rs"]
mod tests;
