//! Folder scan and batch QR decoding

use crate::error::{Result, SedekahError};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use sedekah_qr_common::{decode_bytes, DecodeResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub file_name: String,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp"];

pub fn scan_folder(folder: &Path) -> Result<Vec<ImageInfo>> {
    if !folder.exists() {
        return Err(SedekahError::FolderNotFound(folder.display().to_string()));
    }

    let mut images = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(1) // top level only
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        if let Some(ext) = path.extension() {
            if is_image_extension(&ext.to_string_lossy()) {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();

                images.push(ImageInfo {
                    path: path.to_path_buf(),
                    file_name,
                });
            }
        }
    }

    images.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(images)
}

fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeStatus {
    Decoded,
    NotFound,
    Error,
}

/// One row of a batch decode
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeReport {
    pub file_name: String,
    pub status: DecodeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DecodeReport {
    fn from_result(file_name: String, result: Result<DecodeResult>) -> Self {
        match result {
            Ok(DecodeResult::Decoded { text }) => Self {
                file_name,
                status: DecodeStatus::Decoded,
                text: Some(text),
                error: None,
            },
            Ok(DecodeResult::NotFound) => Self {
                file_name,
                status: DecodeStatus::NotFound,
                text: None,
                error: None,
            },
            Err(e) => Self {
                file_name,
                status: DecodeStatus::Error,
                text: None,
                error: Some(e.to_string()),
            },
        }
    }
}

pub fn decode_file(path: &Path) -> Result<DecodeResult> {
    let bytes = std::fs::read(path)?;
    Ok(decode_bytes(&bytes)?)
}

/// Decode every image in parallel; results keep the input order
pub fn decode_images(images: &[ImageInfo], show_progress: bool) -> Vec<DecodeReport> {
    let progress = if show_progress {
        let bar = ProgressBar::new(images.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}") {
            bar.set_style(style);
        }
        bar
    } else {
        ProgressBar::hidden()
    };

    let reports = images
        .par_iter()
        .map(|img| {
            let report = DecodeReport::from_result(img.file_name.clone(), decode_file(&img.path));
            progress.inc(1);
            report
        })
        .collect();

    progress.finish_and_clear();
    reports
}
