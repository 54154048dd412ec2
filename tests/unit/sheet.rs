use super::*;
use crate::source::BufferSource;

const MANIFEST: &str = r#"{
    "frames": {
        "hero": {
            "frame": { "x": 0, "y": 0, "w": 32, "h": 48 }
        },
        "tree": {
            "frame": { "x": 32, "y": 0, "w": 40, "h": 24 },
            "rotated": true,
            "trimmed": true,
            "spriteSourceSize": { "x": 4, "y": 6, "w": 40, "h": 24 },
            "sourceSize": { "w": 48, "h": 36 },
            "pivot": { "x": 0.5, "y": 1.0 }
        }
    },
    "meta": { "image": "level@1x.png", "scale": "1" }
}"#;

#[test]
fn parses_and_installs_frames() {
    let manifest = SheetManifest::parse(MANIFEST).unwrap();
    assert_eq!(manifest.meta.scale, 1.0);
    assert_eq!(manifest.meta.image.as_deref(), Some("level@1x.png"));

    let registry = Registry::new();
    let base = BaseResource::new(BufferSource::solid(64, 64, [0, 0, 0, 255]));
    let views = manifest.install(&registry, &base).unwrap();
    assert_eq!(views.len(), 2);

    let hero = registry.lookup("hero").unwrap();
    assert_eq!(hero.frame(), rect_xywh(0.0, 0.0, 32.0, 48.0));
    assert_eq!(hero.rotation(), rotate::UPRIGHT);
    assert!(hero.valid());

    // Rotated entries occupy a swapped rectangle in the atlas.
    let tree = registry.lookup("tree").unwrap();
    assert_eq!(tree.frame(), rect_xywh(32.0, 0.0, 24.0, 40.0));
    assert_eq!(tree.rotation(), rotate::QUARTER);
    assert_eq!(tree.trim(), Some(rect_xywh(4.0, 6.0, 40.0, 24.0)));
    assert_eq!(tree.width(), 48.0);
    assert_eq!(tree.height(), 36.0);
    assert_eq!(tree.default_anchor(), Point::new(0.5, 1.0));
}

#[test]
fn export_scale_lands_in_the_base_resolution() {
    let json = r#"{
        "frames": { "dot": { "frame": { "x": 0, "y": 0, "w": 2, "h": 2 } } },
        "meta": { "scale": 2 }
    }"#;
    let manifest = SheetManifest::parse(json).unwrap();
    let registry = Registry::new();
    let base = BaseResource::new(BufferSource::solid(8, 8, [0, 0, 0, 255]));
    manifest.install(&registry, &base).unwrap();
    assert_eq!(base.resolution(), 2.0);
    assert_eq!(registry.lookup("dot").unwrap().resolution(), 2.0);
}

#[test]
fn trimmed_frames_require_their_source_sizes() {
    let json = r#"{
        "frames": {
            "bad": { "frame": { "x": 0, "y": 0, "w": 2, "h": 2 }, "trimmed": true }
        }
    }"#;
    let manifest = SheetManifest::parse(json).unwrap();
    let registry = Registry::new();
    let base = BaseResource::new(BufferSource::solid(8, 8, [0, 0, 0, 255]));
    let err = manifest.install(&registry, &base).unwrap_err();
    assert!(err.to_string().contains("sourceSize"));
}

#[test]
fn oversized_frames_surface_bounds_errors() {
    let json = r#"{
        "frames": { "big": { "frame": { "x": 0, "y": 0, "w": 99, "h": 2 } } }
    }"#;
    let manifest = SheetManifest::parse(json).unwrap();
    let registry = Registry::new();
    let base = BaseResource::new(BufferSource::solid(8, 8, [0, 0, 0, 255]));
    let err = manifest.install(&registry, &base).unwrap_err();
    assert!(matches!(&err, TexviewError::Bounds(_)));
}

#[test]
fn malformed_json_is_a_configuration_error() {
    let err = SheetManifest::parse("{").unwrap_err();
    assert!(matches!(&err, TexviewError::Configuration(_)));
}
