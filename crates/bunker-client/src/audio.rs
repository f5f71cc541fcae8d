use std::path::Path;

use glam::{Quat, Vec3};
use kira::manager::{AudioManager, AudioManagerSettings, DefaultBackend};
use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle};
use kira::tween::Tween;
use thiserror::Error;

use bunker_core::capability::AudioOut;
use bunker_core::config::AmbientSound;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Failed to load sound {path}: {reason}")]
    Load { path: String, reason: String },
    #[error("Failed to play sound: {0}")]
    Play(String),
}

/// Kira-backed audio: one non-positional ambient loop under a master volume.
pub struct AudioSystem {
    manager: Option<AudioManager>,
    ambient: Option<StaticSoundHandle>,
    ambient_volume: f32,
    master_volume: f32,
    listener: (Vec3, Quat),
}

impl AudioSystem {
    pub fn new() -> Self {
        let settings = AudioManagerSettings::<DefaultBackend>::default();
        let manager = AudioManager::<DefaultBackend>::new(settings)
            .map_err(|e| {
                tracing::warn!("Failed to initialize audio: {}. Audio disabled.", e);
                e
            })
            .ok();

        if manager.is_some() {
            tracing::info!("Audio system initialized (Kira)");
        }
        Self::with_manager(manager)
    }

    /// No output device; every call is accepted and ignored.
    pub fn disabled() -> Self {
        Self::with_manager(None)
    }

    fn with_manager(manager: Option<AudioManager>) -> Self {
        Self {
            manager,
            ambient: None,
            ambient_volume: 1.0,
            master_volume: 1.0,
            listener: (Vec3::ZERO, Quat::IDENTITY),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.manager.is_some()
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    pub fn listener(&self) -> (Vec3, Quat) {
        self.listener
    }

    /// Start the background loop, replacing any previous one.
    pub fn play_ambient(&mut self, project_root: &Path, sound: &AmbientSound) -> Result<(), AudioError> {
        let Some(manager) = &mut self.manager else {
            return Ok(());
        };

        if let Some(mut previous) = self.ambient.take() {
            previous.stop(Tween::default());
        }

        let full_path = project_root.join(&sound.path);
        let mut data = StaticSoundData::from_file(&full_path).map_err(|e| AudioError::Load {
            path: full_path.display().to_string(),
            reason: e.to_string(),
        })?;
        if sound.looping {
            data = data.loop_region(..);
        }

        let handle = manager
            .play(data.volume(sound.volume as f64 * self.master_volume as f64))
            .map_err(|e| AudioError::Play(e.to_string()))?;

        tracing::info!("Ambient sound started: {}", sound.path);
        self.ambient_volume = sound.volume;
        self.ambient = Some(handle);
        Ok(())
    }

    fn apply_volume(&mut self) {
        let volume = self.ambient_volume as f64 * self.master_volume as f64;
        if let Some(handle) = &mut self.ambient {
            handle.set_volume(
                volume,
                Tween {
                    duration: std::time::Duration::from_millis(100),
                    ..Default::default()
                },
            );
        }
    }
}

impl Default for AudioSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOut for AudioSystem {
    fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
        self.apply_volume();
        tracing::debug!("Master volume {:.2}", self.master_volume);
    }

    fn set_listener(&mut self, position: Vec3, orientation: Quat) {
        self.listener = (position, orientation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_accepts_everything() {
        let mut audio = AudioSystem::disabled();
        assert!(!audio.is_enabled());
        audio.set_master_volume(1.7);
        assert_eq!(audio.master_volume(), 1.0);
        audio.set_master_volume(-0.2);
        assert_eq!(audio.master_volume(), 0.0);

        let sound = AmbientSound {
            path: "audio/missing.wav".into(),
            volume: 3.0,
            looping: true,
        };
        assert!(audio.play_ambient(Path::new("."), &sound).is_ok());
    }

    #[test]
    fn test_listener_follows() {
        let mut audio = AudioSystem::disabled();
        let rotation = Quat::from_rotation_y(0.5);
        audio.set_listener(Vec3::new(1.0, 2.0, 3.0), rotation);
        assert_eq!(audio.listener(), (Vec3::new(1.0, 2.0, 3.0), rotation));
    }
}
