//! Reader for the genuine-comparison file lists
//!
//! Each line holds `enroll_image, probe_image, label`. Only the first two
//! columns are used; entries are normalised to database paths (no
//! extension, relative to the image directory).

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{DatabaseError, Result};

/// Prefix the original lists were generated with
pub const LIST_PREFIX: &str = "../Database_jpg_90/";

const FIELD_SEPARATOR: &str = ", ";

/// Enrollment and probe entries of one group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileList {
    pub enroll: BTreeSet<String>,
    pub probe: BTreeSet<String>,
}

/// Parse the content of a file list
pub fn parse_filelist(content: &str) -> FileList {
    let mut list = FileList::default();

    for line in content.lines().filter(|line| !line.is_empty()) {
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        if fields.len() != 3 {
            log::debug!("Skipping file list line '{}' ({} fields)", line, fields.len());
            continue;
        }
        list.enroll.insert(normalize_entry(fields[0]));
        list.probe.insert(normalize_entry(fields[1]));
    }

    list
}

/// Read and parse a file list from disk
pub fn read_filelist(path: &Path) -> Result<FileList> {
    let content = std::fs::read_to_string(path).map_err(|e| DatabaseError::io(path, e))?;
    let list = parse_filelist(&content);
    log::info!(
        "Read {}: {} enroll, {} probe entries",
        path.display(),
        list.enroll.len(),
        list.probe.len()
    );
    Ok(list)
}

/// Strip the extension and the list prefix from an entry
pub fn normalize_entry(entry: &str) -> String {
    let stem = strip_extension(entry);
    stem.strip_prefix(LIST_PREFIX).unwrap_or(stem).to_string()
}

// Only a dot inside the last path component that is not its first character counts.
fn strip_extension(entry: &str) -> &str {
    let name_start = entry.rfind('/').map(|i| i + 1).unwrap_or(0);
    match entry[name_start..].rfind('.') {
        Some(dot) if dot > 0 => &entry[..name_start + dot],
        _ => entry,
    }
}

/// Number of entries of `a` that are also in `b`
pub fn count_duplicates(a: &BTreeSet<String>, b: &BTreeSet<String>) -> usize {
    a.intersection(b).count()
}
