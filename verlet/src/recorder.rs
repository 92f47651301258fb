//! Binary frame recording and replay.
//!
//! Each recorded frame is its own file, `<prefix>_<frame>.bin`: one
//! fixed-size snapshot per live particle, `DIM` native-endian `f64` position
//! components each, in world iteration order. Replay loads the file for the
//! current frame and bypasses the whole simulation pipeline for that frame.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("frame file i/o: {0}")]
    Io(#[from] io::Error),
    #[error("frame file holds {len} bytes, not a whole number of {dim}-component snapshots")]
    FrameSize { len: usize, dim: usize },
    #[error("frame holds {found} snapshots but the world has {expected} particles")]
    ParticleCount { expected: usize, found: usize },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecorderMode {
    /// Neither record nor replay.
    #[default]
    Idle,
    /// Dump every updated frame to disk.
    Save,
    /// Replace `update()` with loading the frame from disk.
    Load,
}

#[derive(Clone, Debug)]
pub(crate) struct Recorder {
    mode: RecorderMode,
    prefix: PathBuf,
    playback_scale: f64,
}

impl Default for Recorder {
    fn default() -> Self {
        Self {
            mode: RecorderMode::Idle,
            prefix: PathBuf::from("recorded/physics"),
            playback_scale: 1.0,
        }
    }
}

impl Recorder {
    pub(crate) fn mode(&self) -> RecorderMode {
        self.mode
    }

    pub(crate) fn set_mode(&mut self, mode: RecorderMode) {
        self.mode = mode;
    }

    pub(crate) fn set_prefix(&mut self, prefix: impl Into<PathBuf>) {
        self.prefix = prefix.into();
    }

    /// Scale applied to loaded positions, so frames recorded at one world
    /// scale can be replayed at another. 1 leaves them untouched.
    pub(crate) fn playback_scale(&self) -> f64 {
        self.playback_scale
    }

    pub(crate) fn set_playback_scale(&mut self, scale: f64) {
        self.playback_scale = scale;
    }

    pub(crate) fn frame_path(&self, frame: u64) -> PathBuf {
        let mut name = self
            .prefix
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(format!("_{frame}.bin"));
        self.prefix.with_file_name(name)
    }

    pub(crate) fn write_frame(&self, frame: u64, components: &[f64]) -> Result<(), RecorderError> {
        let path = self.frame_path(frame);
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        std::fs::write(path, bytemuck::cast_slice::<f64, u8>(components))?;
        Ok(())
    }

    /// Read a frame back as raw components; the caller knows the snapshot
    /// width and population it expects.
    pub(crate) fn read_frame(
        &self,
        frame: u64,
        dim: usize,
        expected: usize,
    ) -> Result<Vec<f64>, RecorderError> {
        let bytes = std::fs::read(self.frame_path(frame))?;
        let snapshot_size = dim * std::mem::size_of::<f64>();
        if bytes.len() % snapshot_size != 0 {
            return Err(RecorderError::FrameSize {
                len: bytes.len(),
                dim,
            });
        }
        let components: Vec<f64> = bytemuck::pod_collect_to_vec(&bytes);
        let found = components.len() / dim;
        if found != expected {
            return Err(RecorderError::ParticleCount { expected, found });
        }
        Ok(components)
    }
}
