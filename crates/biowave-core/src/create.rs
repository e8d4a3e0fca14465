//! Population of the database from the raw image tree and file lists
//!
//! Every hand of every person is a separate client. A hand folder becomes a
//! client once it holds at least [`MIN_IMAGES_PER_HAND`] images; each image
//! becomes a file whose model id is `c_<client>_i_<n>`. A single protocol,
//! `all`, splits the files into dev/eval enroll/probe partitions according to
//! the two file lists.

use biowave_db::{
    Connection, Group, Hand, NewClient, NewFile, Purpose, Table,
};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::BiowaveConfig;
use crate::error::{DatabaseError, Result};
use crate::filelist::{count_duplicates, read_filelist, FileList};

/// Hand folders with fewer images are not added as clients
pub const MIN_IMAGES_PER_HAND: usize = 5;

/// Name of the only protocol of the database
pub const PROTOCOL_ALL: &str = "all";

const PERSON_ID_PATTERN: &str = r"\d+[\.]?\d*";

/// Order in which protocol purposes are created
const PROTOCOL_PURPOSES: [(Group, Purpose); 4] = [
    (Group::Dev, Purpose::Enroll),
    (Group::Dev, Purpose::Probe),
    (Group::Eval, Purpose::Enroll),
    (Group::Eval, Purpose::Probe),
];

/// Raw inputs of a database build
#[derive(Debug, Clone)]
pub struct Sources {
    pub imagedir: PathBuf,
    pub devfile: PathBuf,
    pub evalfile: PathBuf,
    pub image_extension: String,
}

impl Sources {
    pub fn from_config(config: &BiowaveConfig) -> Self {
        Self {
            imagedir: config.sources.imagedir.clone(),
            devfile: config.sources.devfile.clone(),
            evalfile: config.sources.evalfile.clone(),
            image_extension: config.sources.image_extension.clone(),
        }
    }
}

/// Options of [`create`]
#[derive(Debug, Clone)]
pub struct CreateOptions {
    pub dbfile: PathBuf,
    pub sources: Sources,
    /// Erase an existing database file first
    pub recreate: bool,
}

/// Row counts after a successful build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateSummary {
    pub clients: i64,
    pub files: i64,
    pub protocols: i64,
    pub protocol_purposes: i64,
    pub linked_files: i64,
}

/// Create (or re-create) the database file
pub fn create(options: &CreateOptions) -> Result<CreateSummary> {
    let dbfile = &options.dbfile;

    if options.recreate && dbfile.exists() {
        log::info!("unlinking {}...", dbfile.display());
        std::fs::remove_file(dbfile).map_err(|e| DatabaseError::io(dbfile, e))?;
    }

    if let Some(parent) = dbfile.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::io(parent, e))?;
        }
    }

    let mut conn = biowave_db::open(dbfile)?;
    let summary = populate(&mut conn, &options.sources)?;

    log::info!(
        "Created {}: {} clients, {} files, {} protocol links",
        dbfile.display(),
        summary.clients,
        summary.files,
        summary.linked_files
    );
    Ok(summary)
}

/// Create the schema and fill it in a single transaction
pub fn populate(conn: &mut Connection, sources: &Sources) -> Result<CreateSummary> {
    biowave_db::create_tables(conn)?;

    let tx = conn.transaction()?;
    add_clients(&tx, &sources.imagedir, &sources.image_extension)?;
    add_protocols(&tx, &sources.devfile, &sources.evalfile)?;
    let summary = summarize(&tx)?;
    tx.commit()?;

    Ok(summary)
}

fn summarize(conn: &Connection) -> Result<CreateSummary> {
    Ok(CreateSummary {
        clients: biowave_db::count_rows(conn, Table::Client)?,
        files: biowave_db::count_rows(conn, Table::File)?,
        protocols: biowave_db::count_rows(conn, Table::Protocol)?,
        protocol_purposes: biowave_db::count_rows(conn, Table::ProtocolPurpose)?,
        linked_files: biowave_db::count_rows(conn, Table::Association)?,
    })
}

/// Parse the person id out of a folder name such as `Person_01` or `Person 7`.
/// Fractional numbers like `3.5` are not a person id.
pub fn parse_original_client_id(pattern: &Regex, folder: &str) -> Result<i64> {
    pattern
        .find(folder)
        .map(|m| m.as_str())
        .filter(|digits| !digits.contains('.'))
        .and_then(|digits| digits.parse::<i64>().ok())
        .ok_or_else(|| DatabaseError::InvalidPersonFolder(folder.to_string()))
}

/// Hand of a hand folder (`Left`, `Right`, `L1`, ...)
pub fn parse_hand(folder: &str) -> Result<Hand> {
    if folder.starts_with('R') {
        Ok(Hand::Right)
    } else if folder.starts_with('L') {
        Ok(Hand::Left)
    } else {
        Err(DatabaseError::InvalidHandFolder(folder.to_string()))
    }
}

/// Sorted sub-directory names of `dir`
fn subdirectories(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| DatabaseError::io(dir, e.into()))?;
        if !entry.file_type().is_dir() {
            log::debug!("Skipping non-directory {}", entry.path().display());
            continue;
        }
        match entry.file_name().to_str() {
            Some(name) => names.push(name.to_string()),
            None => log::warn!("Skipping non UTF-8 folder {}", entry.path().display()),
        }
    }
    Ok(names)
}

/// Sorted image stems (file names without `extension`) in `dir`
fn image_stems(dir: &Path, extension: &str) -> Result<Vec<String>> {
    let mut stems = BTreeSet::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| DatabaseError::io(dir, e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(stem) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.strip_suffix(extension))
            .filter(|stem| !stem.is_empty())
        {
            stems.insert(stem.to_string());
        }
    }
    Ok(stems.into_iter().collect())
}

/// Add one client per hand folder, and its images as files
pub fn add_clients(conn: &Connection, imagedir: &Path, image_extension: &str) -> Result<usize> {
    let pattern = Regex::new(PERSON_ID_PATTERN).map_err(anyhow::Error::from)?;
    let mut added = 0;

    for person in subdirectories(imagedir)? {
        let original_client_id = parse_original_client_id(&pattern, &person)?;
        let person_dir = imagedir.join(&person);

        for hand_folder in subdirectories(&person_dir)? {
            let hand_dir = person_dir.join(&hand_folder);
            let images = image_stems(&hand_dir, image_extension)?;
            if images.len() < MIN_IMAGES_PER_HAND {
                log::info!(
                    "Skipping {}/{}: {} images, at least {} required",
                    person,
                    hand_folder,
                    images.len(),
                    MIN_IMAGES_PER_HAND
                );
                continue;
            }

            let hand = parse_hand(&hand_folder)?;
            log::debug!(
                "Adding client: original client ID = {}, hand = {}",
                original_client_id,
                hand
            );
            biowave_db::insert_client(
                conn,
                &NewClient {
                    original_client_id,
                    hand,
                },
            )?;
            // files attach to the first client of this person/hand
            let client = biowave_db::get_client_by_original_id(conn, original_client_id, hand)?
                .ok_or_else(|| DatabaseError::NotFound {
                    kind: "client",
                    key: format!("{}/{}", original_client_id, hand),
                })?;

            for (index, stem) in images.iter().enumerate() {
                let model_id = biowave_db::model_id(client.id, index + 1);
                if biowave_db::get_file_by_model_id(conn, &model_id)?.is_some() {
                    return Err(DatabaseError::AlreadyPopulated(model_id));
                }
                let path = format!("{}/{}/{}", person, hand_folder, stem);
                log::trace!("  Adding file '{}'...", path);
                biowave_db::insert_file(
                    conn,
                    &NewFile {
                        client_id: client.id,
                        path,
                        model_id,
                    },
                )?;
            }
            added += 1;
        }
    }

    log::info!("Added {} clients from {}", added, imagedir.display());
    Ok(added)
}

/// Reject file lists whose partitions share entries
pub fn check_partitions(dev: &FileList, eval: &FileList) -> Result<()> {
    let count = count_duplicates(&dev.enroll, &dev.probe);
    if count != 0 {
        return Err(DatabaseError::DuplicateEntries {
            scope: "dev / enroll and dev / probe",
            count,
        });
    }

    let count = count_duplicates(&eval.enroll, &eval.probe);
    if count != 0 {
        return Err(DatabaseError::DuplicateEntries {
            scope: "eval / enroll and eval / probe",
            count,
        });
    }

    let count = count_duplicates(&dev.enroll, &eval.enroll)
        + count_duplicates(&dev.enroll, &eval.probe)
        + count_duplicates(&dev.probe, &eval.enroll)
        + count_duplicates(&dev.probe, &eval.probe);
    if count != 0 {
        return Err(DatabaseError::DuplicateEntries {
            scope: "dev / eval",
            count,
        });
    }

    Ok(())
}

/// Read both file lists and build the `all` protocol from them
pub fn add_protocols(conn: &Connection, devfile: &Path, evalfile: &Path) -> Result<usize> {
    let dev = read_filelist(devfile)?;
    let eval = read_filelist(evalfile)?;
    add_protocol(conn, PROTOCOL_ALL, &dev, &eval)
}

/// Insert a protocol with its four purposes and link the listed files
pub fn add_protocol(conn: &Connection, name: &str, dev: &FileList, eval: &FileList) -> Result<usize> {
    check_partitions(dev, eval)?;

    log::info!("Adding protocol {}...", name);
    let protocol_id = biowave_db::insert_protocol(conn, name)?;

    let mut linked = 0;
    for (group, purpose) in PROTOCOL_PURPOSES {
        log::debug!("  Adding protocol purpose ('{}','{}')...", group, purpose);
        let purpose_id = biowave_db::insert_protocol_purpose(conn, protocol_id, group, purpose)?;

        let list = match group {
            Group::Dev => dev,
            Group::Eval => eval,
        };
        let entries = match purpose {
            Purpose::Enroll => &list.enroll,
            Purpose::Probe => &list.probe,
        };

        for entry in entries {
            let mut files = biowave_db::get_files_by_path(conn, entry)?;
            if files.len() > 1 {
                return Err(DatabaseError::AmbiguousFile(entry.clone()));
            }
            let file = files
                .pop()
                .ok_or_else(|| DatabaseError::UnknownFile(entry.clone()))?;
            log::trace!(
                "    Adding to the protocol client's {} file {}...",
                file.client_id,
                file.path
            );
            biowave_db::link_file(conn, purpose_id, file.id)?;
            linked += 1;
        }
    }

    Ok(linked)
}
