// src/frame_source.rs
//
// Stand-in for the camera behind the capture boundary: serves pre-encoded
// JPEG frames from a directory, in filename order. The detection service
// decodes; frames pass through this client untouched.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use walkdir::WalkDir;

pub struct DirectoryFrameSource {
    frames: Vec<PathBuf>,
    next: usize,
}

impl DirectoryFrameSource {
    pub fn open(input_dir: &str) -> Result<Self> {
        let mut frames: Vec<PathBuf> = WalkDir::new(input_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| {
                matches!(
                    p.extension().and_then(|ext| ext.to_str()),
                    Some("jpg") | Some("jpeg")
                )
            })
            .collect();
        frames.sort();

        if frames.is_empty() {
            anyhow::bail!("No JPEG frames found in {}", input_dir);
        }

        info!("Found {} frame(s) in {}", frames.len(), input_dir);
        Ok(Self { frames, next: 0 })
    }

    /// Read the next frame's bytes, or None when the source is exhausted.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let path = match self.frames.get(self.next) {
            Some(path) => path,
            None => return Ok(None),
        };
        self.next += 1;
        let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(bytes))
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}
