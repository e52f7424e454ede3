use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use sdl2::image::LoadTexture;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Texture, TextureCreator};
use sdl2::video::WindowContext;

/// Side length of the generated fallback texture.
const FALLBACK_SIZE: u32 = 32;

/// Textures decoded from `graphic.zip` or loose image files.
///
/// Lookups never fail: a missing or undecodable image is logged once and
/// replaced by a grey box.
pub struct GraphicsCache {
    archive: Option<zip::ZipArchive<File>>,
    creator: TextureCreator<WindowContext>,
    cache: HashMap<String, Texture>,
    fallback: Option<Texture>,
}

impl GraphicsCache {
    /// Opens the archive at `zip_path`. A missing archive is logged and all
    /// lookups fall back, so the client can still start without artwork.
    pub fn new(zip_path: &Path, creator: TextureCreator<WindowContext>) -> Self {
        let archive = match File::open(zip_path).map_err(|e| e.to_string()).and_then(|file| {
            zip::ZipArchive::new(file).map_err(|e| e.to_string())
        }) {
            Ok(archive) => {
                log::info!(
                    "Opened graphic archive {} ({} entries)",
                    zip_path.display(),
                    archive.len()
                );
                Some(archive)
            }
            Err(err) => {
                log::error!("Failed to open graphic archive {}: {err}", zip_path.display());
                None
            }
        };
        let fallback = match Self::make_fallback(&creator) {
            Ok(texture) => Some(texture),
            Err(err) => {
                log::error!("Failed to create fallback texture: {err}");
                None
            }
        };
        Self {
            archive,
            creator,
            cache: HashMap::new(),
            fallback,
        }
    }

    fn make_fallback(creator: &TextureCreator<WindowContext>) -> Result<Texture, String> {
        let mut texture = creator
            .create_texture_static(PixelFormatEnum::RGBA32, FALLBACK_SIZE, FALLBACK_SIZE)
            .map_err(|e| e.to_string())?;
        let pixels: Vec<u8> = (0..FALLBACK_SIZE * FALLBACK_SIZE)
            .flat_map(|_| [96u8, 96, 96, 255])
            .collect();
        texture
            .update(None, &pixels, (FALLBACK_SIZE * 4) as usize)
            .map_err(|e| e.to_string())?;
        Ok(texture)
    }

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, String> {
        let archive = self
            .archive
            .as_mut()
            .ok_or_else(|| "no graphic archive".to_string())?;
        let mut entry = archive.by_name(name).map_err(|e| e.to_string())?;
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes).map_err(|e| e.to_string())?;
        Ok(bytes)
    }

    /// Returns `true` when the archive has an entry called `name`.
    pub fn contains(&mut self, name: &str) -> bool {
        self.cache.contains_key(name)
            || self
                .archive
                .as_mut()
                .is_some_and(|a| a.by_name(name).is_ok())
    }


    fn load(&mut self, key: &str, file: Option<&PathBuf>) -> Option<Texture> {
        let loaded = match file {
            Some(path) => self.creator.load_texture(path),
            None => self
                .read_entry(key)
                .and_then(|bytes| self.creator.load_texture_bytes(&bytes)),
        };
        match loaded {
            Ok(texture) => Some(texture),
            Err(err) => {
                log::error!("Failed to load texture {key}: {err}");
                None
            }
        }
    }

    fn get_or_load(&mut self, key: String, file: Option<PathBuf>) -> Option<&Texture> {
        if !self.cache.contains_key(&key) {
            match self.load(&key, file.as_ref()) {
                Some(texture) => {
                    self.cache.insert(key.clone(), texture);
                }
                None => {
                    // A grey box under the missing name keeps the error to one log line.
                    if let Ok(texture) = Self::make_fallback(&self.creator) {
                        self.cache.insert(key.clone(), texture);
                    }
                }
            }
        }
        self.cache.get(&key).or(self.fallback.as_ref())
    }

    /// Texture stored in the archive under `name` (e.g. `icon/sword.png`).
    pub fn texture(&mut self, name: &str) -> Option<&Texture> {
        self.get_or_load(name.to_string(), None)
    }

    /// Texture loaded from an image file on disk.
    pub fn texture_file(&mut self, path: &Path) -> Option<&Texture> {
        let key = format!("file:{}", path.display());
        self.get_or_load(key, Some(path.to_path_buf()))
    }
}
