//! Chip libraries and document files.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::CircuitDocument;
use crate::error::{GatesimError, Result};

/// Somewhere chip definitions can be looked up by name.
pub trait ChipSource {
    /// Fetch the definition of chip `name`.
    fn load_chip(&self, name: &str) -> Result<CircuitDocument>;
}

/// A source with no chips, for circuits built only from primitive gates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoChips;

impl ChipSource for NoChips {
    fn load_chip(&self, name: &str) -> Result<CircuitDocument> {
        Err(GatesimError::chip_not_found(name))
    }
}

/// Chips stored as `<root>/<chip_name>.json`.
#[derive(Debug, Clone)]
pub struct DirectoryLibrary {
    root: PathBuf,
}

impl DirectoryLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File a chip is stored in.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    /// Store a chip, creating the library directory if needed.
    pub fn save_chip(&self, name: &str, doc: &CircuitDocument) -> Result<PathBuf> {
        fs::create_dir_all(&self.root).map_err(|e| GatesimError::FileWriteError {
            path: self.root.display().to_string(),
            source: e,
        })?;
        let path = self.path_for(name);
        write_document(&path, doc)?;
        Ok(path)
    }

    /// Names of all stored chips, sorted. A missing directory is empty.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(GatesimError::FileReadError {
                    path: self.root.display().to_string(),
                    source: e,
                })
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().map_or(false, |ext| ext == "json"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        Ok(names)
    }
}

impl ChipSource for DirectoryLibrary {
    fn load_chip(&self, name: &str) -> Result<CircuitDocument> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(GatesimError::chip_not_found(name));
        }
        read_document(&path)
    }
}

/// Chips held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLibrary {
    chips: HashMap<String, CircuitDocument>,
}

impl MemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a chip.
    pub fn insert(&mut self, name: impl Into<String>, doc: CircuitDocument) {
        self.chips.insert(name.into(), doc);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.chips.contains_key(name)
    }
}

impl ChipSource for MemoryLibrary {
    fn load_chip(&self, name: &str) -> Result<CircuitDocument> {
        self.chips
            .get(name)
            .cloned()
            .ok_or_else(|| GatesimError::chip_not_found(name))
    }
}

/// Read a circuit document from a JSON file.
pub fn read_document(path: &Path) -> Result<CircuitDocument> {
    let content = fs::read_to_string(path).map_err(|e| GatesimError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    CircuitDocument::from_json(&content)
}

/// Write a circuit document to a JSON file.
pub fn write_document(path: &Path, doc: &CircuitDocument) -> Result<()> {
    let content = doc.to_json_pretty()?;
    fs::write(path, content).map_err(|e| GatesimError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}
