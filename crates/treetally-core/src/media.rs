use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use rayon::prelude::*;
use thiserror::Error;
use uuid::Uuid;

use crate::command_runner::CommandRunner;
use crate::config::{CameraConfig, OUTPUT_PLACEHOLDER};
use crate::record::ImageRef;
use crate::services::{Camera, CameraPermission, CaptureOutcome, MediaLibrary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
    Heic,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Heic => "heic",
        }
    }
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("gallery directory {0} does not exist")]
    MissingGallery(PathBuf),
    #[error("failed to read gallery directory {path}: {source}")]
    ReadGallery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("camera command failed: {program} ({reason})")]
    CaptureFailed { program: String, reason: String },
    #[error("camera wrote {0}, which is not a supported image")]
    NotAnImage(PathBuf),
}

/// Identifies an image by its leading bytes.
pub fn sniff_image_format(header: &[u8]) -> Option<ImageFormat> {
    if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(ImageFormat::Jpeg);
    }
    if header.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(ImageFormat::Png);
    }
    if header.starts_with(b"GIF87a") || header.starts_with(b"GIF89a") {
        return Some(ImageFormat::Gif);
    }
    if header.len() >= 12 && header.starts_with(b"RIFF") && &header[8..12] == b"WEBP" {
        return Some(ImageFormat::Webp);
    }
    if header.len() >= 12 && &header[4..8] == b"ftyp" {
        let brand = &header[8..12];
        if [b"heic", b"heix", b"mif1", b"msf1"]
            .iter()
            .any(|candidate| brand == *candidate)
        {
            return Some(ImageFormat::Heic);
        }
    }
    None
}

/// `None` when the file is unreadable or not a recognised image.
pub fn sniff_file(path: &Path) -> Option<ImageFormat> {
    let mut header = [0u8; 12];
    let mut file = File::open(path).ok()?;
    let read = file.read(&mut header).ok()?;
    sniff_image_format(&header[..read])
}

/// Lists photos from a single directory, newest file name last.
#[derive(Debug, Clone)]
pub struct DirectoryLibrary {
    root: PathBuf,
}

impl DirectoryLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl MediaLibrary for DirectoryLibrary {
    fn list_images(&self) -> anyhow::Result<Vec<ImageRef>> {
        if !self.root.is_dir() {
            return Err(MediaError::MissingGallery(self.root.clone()).into());
        }

        let entries = fs::read_dir(&self.root).map_err(|source| MediaError::ReadGallery {
            path: self.root.clone(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| MediaError::ReadGallery {
                path: self.root.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }

        let mut images: Vec<PathBuf> = files
            .into_par_iter()
            .filter(|path| sniff_file(path).is_some())
            .collect();
        images.sort();

        Ok(images.into_iter().map(ImageRef::new).collect())
    }
}

/// Captures a photo by running an external program that writes to `{output}`.
pub struct CommandCamera<R: CommandRunner> {
    runner: R,
    config: Option<CameraConfig>,
    capture_dir: PathBuf,
}

impl<R: CommandRunner> CommandCamera<R> {
    pub fn new(runner: R, config: Option<CameraConfig>, capture_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            config,
            capture_dir: capture_dir.into(),
        }
    }

    fn next_capture_path(&self) -> PathBuf {
        self.capture_dir
            .join(format!("capture-{}.jpg", Uuid::new_v4().simple()))
    }
}

impl<R: CommandRunner> Camera for CommandCamera<R> {
    fn request_permission(&self) -> anyhow::Result<CameraPermission> {
        Ok(match &self.config {
            Some(_) => CameraPermission::Granted,
            None => CameraPermission::Denied,
        })
    }

    fn capture(&self) -> anyhow::Result<CaptureOutcome> {
        let Some(config) = &self.config else {
            anyhow::bail!("no camera is configured");
        };

        fs::create_dir_all(&self.capture_dir).with_context(|| {
            format!(
                "failed to create capture directory {}",
                self.capture_dir.display()
            )
        })?;

        let output_path = self.next_capture_path();
        let output_value = output_path.to_string_lossy();
        let args: Vec<String> = config
            .args
            .iter()
            .map(|arg| arg.replace(OUTPUT_PLACEHOLDER, &output_value))
            .collect();

        let output = self
            .runner
            .run(&config.program, &args, Some(&self.capture_dir))
            .with_context(|| format!("failed to run camera program '{}'", config.program))?;

        if !output.succeeded() {
            return Err(MediaError::CaptureFailed {
                program: config.program.clone(),
                reason: output.failure_reason(),
            }
            .into());
        }

        if !output_path.is_file() {
            return Ok(CaptureOutcome::Cancelled);
        }

        if sniff_file(&output_path).is_none() {
            return Err(MediaError::NotAnImage(output_path).into());
        }

        Ok(CaptureOutcome::Captured(ImageRef::new(output_path)))
    }
}
