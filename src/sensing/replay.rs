//! File-backed detector used in place of a camera: replays a recorded
//! detection stream, one JSON array of detections per line.

use std::{
    fs::File,
    io::{BufRead, BufReader, Lines},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use super::sampler::{Detection, Detector};

pub struct ReplayDetector {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_number: usize,
}

impl ReplayDetector {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .with_context(|| format!("failed to open replay file {}", path.display()))?;
        Ok(Self {
            path,
            lines: BufReader::new(file).lines(),
            line_number: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Detector for ReplayDetector {
    fn detect(&mut self) -> Result<Option<Vec<Detection>>> {
        let Some(line) = self.lines.next() else {
            return Ok(None);
        };
        self.line_number += 1;
        let line = line.with_context(|| {
            format!("failed to read line {} of {}", self.line_number, self.path.display())
        })?;

        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Some(Vec::new()));
        }

        let detections = serde_json::from_str(trimmed).with_context(|| {
            format!("invalid detections on line {} of {}", self.line_number, self.path.display())
        })?;
        Ok(Some(detections))
    }
}
