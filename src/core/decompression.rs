use crate::models::error::SError;
use camino::Utf8Path;
use std::fs::{self, File};
use std::io;
use tracing::{debug, warn};

pub struct Decompression;

impl Decompression {
    /// Unpacks a zip archive into `destination`, returning the number of files written.
    pub fn extract(archive_path: &Utf8Path, destination: &Utf8Path) -> Result<usize, SError> {
        let file = File::open(archive_path)?;
        let mut archive = zip::ZipArchive::new(file)?;
        fs::create_dir_all(destination)?;

        let mut written = 0;
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;

            // Zip Slip: entries escaping the destination are dropped
            let Some(safe_path) = entry.enclosed_name() else {
                warn!("Skipping unsafe archive entry {:?} in {}", entry.name(), archive_path);
                continue;
            };
            let output_path = destination.as_std_path().join(safe_path);

            if entry.is_dir() {
                fs::create_dir_all(&output_path)?;
            } else {
                if let Some(parent) = output_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut outfile = File::create(&output_path)?;
                io::copy(&mut entry, &mut outfile)?;
                written += 1;

                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    if let Some(mode) = entry.unix_mode() {
                        let _ = fs::set_permissions(&output_path, fs::Permissions::from_mode(mode));
                    }
                }
            }
        }

        debug!("extracted {} files from {}", written, archive_path);
        Ok(written)
    }
}
