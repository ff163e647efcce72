use crate::models::error::SError;
use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub struct FileUtils;

impl FileUtils {
    /// Recursively copies a directory tree from source to destination.
    /// Creates all necessary directories and overwrites existing files.
    pub fn copy_recursive(src: &Utf8Path, dst: &Utf8Path) -> Result<(), SError> {
        // 1. Ensure the root destination directory exists
        std::fs::create_dir_all(dst)?;

        for entry in WalkDir::new(src) {
            let entry = entry?;

            // 2. Convert standard Path to Camino Utf8Path
            let src_path = Utf8Path::from_path(entry.path())
                .ok_or_else(|| SError::InvalidPath(entry.path().display().to_string()))?;

            // 3. Mirror the relative location under the destination
            let dst_path = dst.join(src_path.strip_prefix(src)?);

            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dst_path)?;
            } else {
                if let Some(parent) = dst_path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                // Overwrites, so an interrupted copy can simply be retried
                std::fs::copy(src_path, &dst_path)?;
            }
        }

        Ok(())
    }

    /// Moves a directory, falling back to copy + delete across devices.
    pub fn move_dir(src: &Utf8Path, dst: &Utf8Path) -> Result<(), SError> {
        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if std::fs::rename(src, dst).is_ok() {
            return Ok(());
        }

        debug!("rename {} -> {} failed, copying instead", src, dst);
        Self::copy_recursive(src, dst)?;
        std::fs::remove_dir_all(src)?;
        Ok(())
    }

    pub fn remove_dir_if_exists(path: &Utf8Path) -> Result<bool, SError> {
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(path)?;
        Ok(true)
    }

    /// Immediate children of `dir`, sorted by name.
    pub fn children(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, SError> {
        let mut out = dir
            .read_dir_utf8()?
            .map(|entry| entry.map(|e| e.into_path()))
            .collect::<Result<Vec<_>, _>>()?;
        out.sort();
        Ok(out)
    }

    /// Immediate subdirectories of `dir`, sorted by name.
    pub fn subdirectories(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, SError> {
        Ok(Self::children(dir)?.into_iter().filter(|p| p.is_dir()).collect())
    }

    /// True when `dir` directly contains a file with extension `ext` (case-insensitive).
    pub fn has_file_with_extension(dir: &Utf8Path, ext: &str) -> Result<bool, SError> {
        Ok(Self::children(dir)?.iter().any(|p| {
            p.is_file() && p.extension().is_some_and(|e| e.eq_ignore_ascii_case(ext))
        }))
    }
}
