// src/io/mod.rs
pub mod poscar;

use crate::model::Structure;
use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

pub fn load_structure(path: &str) -> io::Result<Structure> {
    let p = path.to_lowercase();

    if p.ends_with(".json") {
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    } else {
        // POSCAR, CONTCAR, *.vasp and anything unknown
        poscar::parse(path)
    }
}

/// Writes `text` to `dir/file_name`, creating `dir` first. Returns the file path.
pub fn save_report(dir: &Path, file_name: &str, text: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    let mut file = File::create(&path)?;
    file.write_all(text.as_bytes())?;
    Ok(path)
}
