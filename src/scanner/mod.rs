use crate::error::{LeafDoctorError, Result};
use crate::payload::is_supported_extension;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub file_name: String,
}

impl ImageInfo {
    fn from_path(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            file_name,
        }
    }
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| is_supported_extension(&ext.to_string_lossy()))
        .unwrap_or(false)
}

/// 画像ファイルまたはフォルダから解析対象を集める
///
/// ファイル指定時は拡張子をチェックして1件、フォルダ指定時は対応画像を
/// ファイル名順で返す（`recursive` でサブフォルダも対象）
pub fn scan_path(path: &Path, recursive: bool) -> Result<Vec<ImageInfo>> {
    if path.is_file() {
        if !has_supported_extension(path) {
            return Err(LeafDoctorError::UnsupportedFormat(path.display().to_string()));
        }
        return Ok(vec![ImageInfo::from_path(path)]);
    }

    scan_folder(path, recursive)
}

pub fn scan_folder(folder: &Path, recursive: bool) -> Result<Vec<ImageInfo>> {
    if !folder.is_dir() {
        return Err(LeafDoctorError::FolderNotFound(folder.display().to_string()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };

    let mut images: Vec<ImageInfo> = WalkDir::new(folder)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && has_supported_extension(e.path()))
        .map(|e| ImageInfo::from_path(e.path()))
        .collect();

    // ファイル名でソート
    images.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(images)
}
