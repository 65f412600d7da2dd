//! Texture assets: decoding from disk, sampling settings, content-addressed registry.
//!
//! Textures are identified by a hash of their pixels. The renderer consumes
//! textures by handle, never by raw file paths.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Content-addressed asset ID computed from the decoded pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

/// How texture coordinates outside `[0, 1]` are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    #[default]
    Repeat,
    MirroredRepeat,
    ClampToEdge,
}

/// Sampling and placement of a texture on a surface.
///
/// The UV transform is `uv * repeat + offset`; a negative repeat mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureSettings {
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub repeat: Vec2,
    pub offset: Vec2,
    /// Flip rows at load time so that `v = 0` addresses the bottom of the image.
    pub flip_y: bool,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            wrap_s: WrapMode::Repeat,
            wrap_t: WrapMode::Repeat,
            repeat: Vec2::ONE,
            offset: Vec2::new(0.5, 0.0),
            flip_y: false,
        }
    }
}

impl TextureSettings {
    /// Same settings, mirrored horizontally.
    pub fn mirrored(self) -> Self {
        Self {
            repeat: Vec2::new(-self.repeat.x, self.repeat.y),
            ..self
        }
    }
}

/// Decoded RGBA8 texture.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    pub settings: TextureSettings,
}

impl Texture {
    /// Two-color checkerboard, used when a texture file cannot be loaded.
    pub fn checker(name: impl Into<String>, size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let size = size.max(1);
        let cell = (size / cells.max(1)).max(1);
        let mut rgba = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let color = if ((x / cell) + (y / cell)) % 2 == 0 { a } else { b };
                rgba.extend_from_slice(&color);
            }
        }
        Self {
            name: name.into(),
            width: size,
            height: size,
            rgba,
            settings: TextureSettings::default(),
        }
    }

    /// Bytes per pixel row.
    pub fn stride(&self) -> u32 {
        self.width * 4
    }
}

/// Errors from loading texture assets.
#[derive(Debug, thiserror::Error)]
pub enum AssetLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("texture {path} has zero size")]
    Empty { path: PathBuf },
}

impl AssetLoadError {
    /// Path of the asset that failed to load.
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::Decode { path, .. } | Self::Empty { path } => path,
        }
    }
}

/// Load and decode an image file into an RGBA8 texture.
pub fn load_texture(
    path: impl AsRef<Path>,
    settings: TextureSettings,
) -> Result<Texture, AssetLoadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| AssetLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut image = image::load_from_memory(&bytes).map_err(|source| AssetLoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    if settings.flip_y {
        image = image.flipv();
    }

    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(AssetLoadError::Empty {
            path: path.to_path_buf(),
        });
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("texture")
        .to_string();
    tracing::debug!(%name, width, height, "texture decoded");

    Ok(Texture {
        name,
        width,
        height,
        rgba: rgba.into_raw(),
        settings,
    })
}

/// Content-addressed texture registry.
#[derive(Debug, Clone, Default)]
pub struct TextureStore {
    textures: BTreeMap<AssetId, Texture>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a texture and return its asset ID. Identical pixels share an ID.
    pub fn register(&mut self, texture: Texture) -> AssetId {
        let id = content_hash(&texture);
        self.textures.entry(id).or_insert(texture);
        id
    }

    /// Load from disk, or register `fallback` and log when loading fails.
    pub fn load_or_fallback(
        &mut self,
        path: impl AsRef<Path>,
        settings: TextureSettings,
        fallback: impl FnOnce() -> Texture,
    ) -> (AssetId, Option<AssetLoadError>) {
        match load_texture(path, settings) {
            Ok(texture) => (self.register(texture), None),
            Err(e) => {
                tracing::warn!("{e}; using placeholder texture");
                let mut texture = fallback();
                texture.settings = settings;
                (self.register(texture), Some(e))
            }
        }
    }

    pub fn get(&self, id: AssetId) -> Option<&Texture> {
        self.textures.get(&id)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

fn content_hash(texture: &Texture) -> AssetId {
    let mut hasher = Sha256::new();
    hasher.update(texture.width.to_le_bytes());
    hasher.update(texture.height.to_le_bytes());
    hasher.update(&texture.rgba);
    hasher.update([texture.settings.wrap_s as u8, texture.settings.wrap_t as u8]);
    for v in [
        texture.settings.repeat.x,
        texture.settings.repeat.y,
        texture.settings.offset.x,
        texture.settings.offset.y,
    ] {
        hasher.update(v.to_le_bytes());
    }
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    AssetId(u64::from_le_bytes(bytes))
}

pub fn crate_info() -> &'static str {
    "ribbonscape-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        let img = image::RgbaImage::from_fn(w, h, |x, y| {
            image::Rgba([(x * 40) as u8, (y * 40) as u8, 0, 255])
        });
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn default_settings_match_front_texture() {
        let s = TextureSettings::default();
        assert_eq!(s.wrap_s, WrapMode::Repeat);
        assert_eq!(s.wrap_t, WrapMode::Repeat);
        assert_eq!(s.repeat, Vec2::ONE);
        assert_eq!(s.offset, Vec2::new(0.5, 0.0));
        assert!(!s.flip_y);
    }

    #[test]
    fn mirrored_negates_horizontal_repeat() {
        let s = TextureSettings::default().mirrored();
        assert_eq!(s.repeat, Vec2::new(-1.0, 1.0));
        assert_eq!(s.offset, Vec2::new(0.5, 0.0));
    }

    #[test]
    fn load_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "front.png", 4, 3);
        let tex = load_texture(&path, TextureSettings::default()).unwrap();
        assert_eq!(tex.name, "front");
        assert_eq!((tex.width, tex.height), (4, 3));
        assert_eq!(tex.rgba.len(), 4 * 3 * 4);
        assert_eq!(&tex.rgba[..4], &[0, 0, 0, 255]);
    }

    #[test]
    fn flip_y_reverses_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "back.png", 2, 3);
        let settings = TextureSettings {
            flip_y: true,
            ..TextureSettings::default()
        };
        let tex = load_texture(&path, settings).unwrap();
        // First pixel now comes from the last source row (y = 2).
        assert_eq!(&tex.rgba[..4], &[0, 80, 0, 255]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.png");
        let err = load_texture(&path, TextureSettings::default()).unwrap_err();
        assert!(matches!(err, AssetLoadError::Io { .. }));
        assert_eq!(err.path(), path.as_path());
        assert!(err.to_string().contains("nope.png"));
    }

    #[test]
    fn garbage_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"not an image").unwrap();
        let err = load_texture(&path, TextureSettings::default()).unwrap_err();
        assert!(matches!(err, AssetLoadError::Decode { .. }));
    }

    #[test]
    fn content_addressed_dedup() {
        let mut store = TextureStore::new();
        let a = store.register(Texture::checker("a", 8, 2, [255; 4], [0, 0, 0, 255]));
        let b = store.register(Texture::checker("b", 8, 2, [255; 4], [0, 0, 0, 255]));
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);

        let mirrored = Texture {
            settings: TextureSettings::default().mirrored(),
            ..Texture::checker("c", 8, 2, [255; 4], [0, 0, 0, 255])
        };
        let c = store.register(mirrored);
        assert_ne!(a, c);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn fallback_used_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TextureStore::new();
        let settings = TextureSettings::default().mirrored();
        let (id, err) = store.load_or_fallback(dir.path().join("missing.png"), settings, || {
            Texture::checker("placeholder", 16, 4, [255; 4], [200, 0, 200, 255])
        });
        assert!(err.is_some());
        let tex = store.get(id).unwrap();
        assert_eq!(tex.name, "placeholder");
        assert_eq!(tex.settings, settings);
    }

    #[test]
    fn checker_alternates_cells() {
        let tex = Texture::checker("c", 4, 2, [1, 1, 1, 1], [2, 2, 2, 2]);
        assert_eq!(tex.stride(), 16);
        assert_eq!(&tex.rgba[0..4], &[1, 1, 1, 1]);
        assert_eq!(&tex.rgba[8..12], &[2, 2, 2, 2]);
    }
}
