use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use sdl2::mixer::{Channel, Chunk, LoaderRWops, MAX_VOLUME, Music};
use sdl2::rwops::RWops;

const MUSIC_PREFIX: &str = "music/";
const EFFECT_PREFIX: &str = "effect/";

fn mixer_volume(level: f32) -> i32 {
    (level.clamp(0.0, 1.0) * MAX_VOLUME as f32).round() as i32
}

/// Sound effects and music tracks decoded from `audio.zip`.
///
/// Missing sounds are logged once and then stay silent.
pub struct SoundCache {
    archive: Option<zip::ZipArchive<File>>,
    effects: HashMap<String, Option<Chunk>>,
    music: HashMap<String, Option<Music<'static>>>,
    playing: Option<String>,
    effects_volume: i32,
}

impl SoundCache {
    pub fn new(zip_path: &Path) -> Self {
        let archive = match File::open(zip_path).map_err(|e| e.to_string()).and_then(|file| {
            zip::ZipArchive::new(file).map_err(|e| e.to_string())
        }) {
            Ok(archive) => {
                log::info!("Opened audio archive {}", zip_path.display());
                Some(archive)
            }
            Err(err) => {
                log::error!("Failed to open audio archive {}: {err}", zip_path.display());
                None
            }
        };
        Self {
            archive,
            effects: HashMap::new(),
            music: HashMap::new(),
            playing: None,
            effects_volume: MAX_VOLUME,
        }
    }

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, String> {
        let archive = self
            .archive
            .as_mut()
            .ok_or_else(|| "no audio archive".to_string())?;
        let mut entry = archive.by_name(name).map_err(|e| e.to_string())?;
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes).map_err(|e| e.to_string())?;
        Ok(bytes)
    }

    /// Names of the music tracks in the archive, sorted.
    pub fn music_tracks(&self) -> Vec<String> {
        let mut tracks: Vec<String> = self
            .archive
            .as_ref()
            .map(|a| {
                a.file_names()
                    .filter_map(|n| n.strip_prefix(MUSIC_PREFIX))
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        tracks.sort();
        tracks
    }

    pub fn set_effects_volume(&mut self, level: f32) {
        self.effects_volume = mixer_volume(level);
    }

    pub fn set_music_volume(&mut self, level: f32) {
        Music::set_volume(mixer_volume(level));
    }

    /// Plays `effect/<name>` once on any free channel.
    pub fn play_effect(&mut self, name: &str) {
        if name.is_empty() || self.effects_volume == 0 {
            return;
        }
        if !self.effects.contains_key(name) {
            let chunk = self
                .read_entry(&format!("{EFFECT_PREFIX}{name}"))
                .and_then(|bytes| RWops::from_bytes(&bytes)?.load_wav());
            let chunk = match chunk {
                Ok(chunk) => Some(chunk),
                Err(err) => {
                    log::error!("Failed to load sound effect {name}: {err}");
                    None
                }
            };
            self.effects.insert(name.to_string(), chunk);
        }
        let volume = self.effects_volume;
        if let Some(Some(chunk)) = self.effects.get_mut(name) {
            chunk.set_volume(volume);
            if let Err(err) = Channel::all().play(chunk, 0) {
                log::debug!("No free channel for {name}: {err}");
            }
        }
    }

    /// Loops `music/<name>` unless it is already playing.
    pub fn play_music(&mut self, name: &str) {
        if self.playing.as_deref() == Some(name) {
            return;
        }
        if !self.music.contains_key(name) {
            let music = self
                .read_entry(&format!("{MUSIC_PREFIX}{name}"))
                .and_then(|bytes| Music::from_static_bytes(Box::leak(bytes.into_boxed_slice())));
            let music = match music {
                Ok(music) => Some(music),
                Err(err) => {
                    log::error!("Failed to load music {name}: {err}");
                    None
                }
            };
            self.music.insert(name.to_string(), music);
        }
        if let Some(Some(music)) = self.music.get(name) {
            match music.play(-1) {
                Ok(()) => self.playing = Some(name.to_string()),
                Err(err) => log::error!("Failed to play music {name}: {err}"),
            }
        }
    }

    pub fn stop_music(&mut self) {
        Music::halt();
        self.playing = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_maps_to_mixer_range() {
        assert_eq!(mixer_volume(0.0), 0);
        assert_eq!(mixer_volume(1.0), MAX_VOLUME);
        assert_eq!(mixer_volume(2.0), MAX_VOLUME);
        assert_eq!(mixer_volume(0.5), 64);
    }
}
