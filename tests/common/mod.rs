#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use mod_vault_lib::core::library::Library;
use std::fs::{self, File};
use std::io::Write;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Creates an empty WWMI folder and opens a library on it.
pub fn setup_library() -> (TempDir, Library) {
    let tmp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(tmp.path().join("WWMI")).unwrap();
    fs::create_dir_all(&root).unwrap();

    let library = Library::open(&root).expect("Failed to open library");
    (tmp, library)
}

/// Mock a mod payload: `dir/mod.ini` plus a texture file.
pub fn make_mod(dir: &Utf8Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("mod.ini"), "[Constants]\n").unwrap();
    fs::write(dir.join("texture.dds"), dir.as_str()).unwrap();
}

/// Writes a zip at `path` holding one file per `(name, content)` pair.
pub fn make_zip(path: &Utf8Path, files: &[(&str, &str)]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());

    for (name, content) in files {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

/// Reads a library from disk again, as the next run would.
pub fn reopen(library: &Library) -> Library {
    Library::open(&library.root).unwrap()
}
