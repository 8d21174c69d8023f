//! ZIP container codec.
//!
//! A container is a flat map of forward-slash paths to byte payloads.
//! Directories exist only as path prefixes.

use crate::error::{ArchiveError, ArchiveResult};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::io::{Cursor, Read, Write};
use std::ops::Bound;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Leading bytes of every ZIP container (local file header or empty
/// end-of-central-directory record).
pub const ZIP_MAGIC: [u8; 2] = *b"PK";

/// True when `bytes` starts with the container signature.
pub fn is_container(bytes: &[u8]) -> bool {
    bytes.starts_with(&ZIP_MAGIC)
}

fn validate_path(path: &str) -> ArchiveResult<()> {
    let bad = path.is_empty()
        || path.starts_with('/')
        || path.ends_with('/')
        || path.contains('\\')
        || path.split('/').any(|c| c.is_empty() || c == "." || c == "..");
    if bad {
        return Err(ArchiveError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Accumulates entries and writes them out as a deflated ZIP.
#[derive(Debug, Default)]
pub struct ContainerBuilder {
    entries: Vec<(String, Vec<u8>)>,
    seen: HashSet<String>,
    compression_level: Option<i64>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deflate level 0 to 9; `None` uses the library default.
    pub fn with_compression_level(level: Option<i64>) -> Self {
        Self {
            compression_level: level,
            ..Self::default()
        }
    }

    /// Adds an entry. Adding the same path twice is an error.
    pub fn add(&mut self, path: impl Into<String>, data: Vec<u8>) -> ArchiveResult<&mut Self> {
        let path = path.into();
        validate_path(&path)?;
        if !self.seen.insert(path.clone()) {
            return Err(ArchiveError::DuplicateEntry(path));
        }
        self.entries.push((path, data));
        Ok(self)
    }

    /// Adds a pretty-printed JSON entry.
    pub fn add_json<T: Serialize + ?Sized>(
        &mut self,
        path: impl Into<String>,
        value: &T,
    ) -> ArchiveResult<&mut Self> {
        let data = serde_json::to_vec_pretty(value)?;
        self.add(path, data)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.seen.contains(path)
    }

    /// Writes all entries, in insertion order, and returns the ZIP bytes.
    pub fn finish(self) -> ArchiveResult<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(self.compression_level);

        for (path, data) in &self.entries {
            let entry_options = options.large_file(data.len() as u64 >= u64::from(u32::MAX));
            zip.start_file(path.as_str(), entry_options)?;
            zip.write_all(data)?;
        }

        let finished = zip.finish()?;
        Ok(finished.into_inner())
    }
}

/// Builds a container from a complete entry map.
pub fn build_container(entries: &BTreeMap<String, Vec<u8>>) -> ArchiveResult<Vec<u8>> {
    let mut builder = ContainerBuilder::new();
    for (path, data) in entries {
        builder.add(path.clone(), data.clone())?;
    }
    builder.finish()
}

/// A parsed container with every entry loaded in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Container {
    entries: BTreeMap<String, Vec<u8>>,
}

impl Container {
    /// Parses ZIP bytes. Any failure is [`ArchiveError::Format`].
    pub fn parse(bytes: &[u8]) -> ArchiveResult<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ArchiveError::Format(e.to_string()))?;
        let mut entries = BTreeMap::new();

        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| ArchiveError::Format(e.to_string()))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::new();
            file.read_to_end(&mut data)
                .map_err(|e| ArchiveError::Format(format!("{name}: {e}")))?;

            if entries.insert(name.clone(), data).is_some() {
                return Err(ArchiveError::Format(format!("duplicate entry {name}")));
            }
        }

        Ok(Self { entries })
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// All entry paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries whose path starts with `prefix`, in sorted order.
    pub fn entries_under<'a, 'p>(
        &'a self,
        prefix: &'p str,
    ) -> impl Iterator<Item = (&'a str, &'a [u8])> + use<'a, 'p> {
        self.entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(path, _)| path.starts_with(prefix))
            .map(|(path, data)| (path.as_str(), data.as_slice()))
    }

    pub fn into_entries(self) -> BTreeMap<String, Vec<u8>> {
        self.entries
    }
}
