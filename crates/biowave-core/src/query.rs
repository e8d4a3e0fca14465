//! Query interface of a populated database
//!
//! Filters left empty stand for every allowed value, so
//! `ObjectQuery::default()` returns every file of every protocol.

use biowave_db::{
    Client, ClientCriteria, Connection, File, FileCriteria, Group, Hand, ParseChoiceError,
    Protocol, ProtocolPurpose, Purpose,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{DatabaseError, Result};

/// Filters for [`Database::clients`]
#[derive(Debug, Clone, Default)]
pub struct ClientQuery {
    pub hands: Vec<Hand>,
    pub protocol: Vec<String>,
    pub groups: Vec<Group>,
}

/// Filters for [`Database::model_ids`]
#[derive(Debug, Clone, Default)]
pub struct ModelQuery {
    pub protocol: Vec<String>,
    pub groups: Vec<Group>,
}

/// Filters for [`Database::objects`]
#[derive(Debug, Clone, Default)]
pub struct ObjectQuery {
    pub protocol: Vec<String>,
    pub groups: Vec<Group>,
    pub purposes: Vec<Purpose>,
    /// Model ids (`c_<client>_i_<n>`) of enrollment files
    pub model_ids: Vec<String>,
}

/// An open connection to the BioWave test database
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open an existing database file read-only
    pub fn open(path: &Path) -> Result<Self> {
        let conn = biowave_db::open_read_only(path)?;
        log::debug!("Opened database {}", path.display());
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn, path: None }
    }

    /// File backing this database, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn groups(&self) -> &'static [Group] {
        &Group::ALL
    }

    pub fn client_hands(&self) -> &'static [Hand] {
        &Hand::ALL
    }

    pub fn purposes(&self) -> &'static [Purpose] {
        &Purpose::ALL
    }

    pub fn protocols(&self) -> Result<Vec<Protocol>> {
        Ok(biowave_db::get_all_protocols(&self.conn)?)
    }

    pub fn protocol_names(&self) -> Result<Vec<String>> {
        Ok(self.protocols()?.into_iter().map(|p| p.name).collect())
    }

    pub fn has_protocol(&self, name: &str) -> Result<bool> {
        Ok(biowave_db::get_protocol_by_name(&self.conn, name)?.is_some())
    }

    /// The protocol called `name`, or `NotFound`
    pub fn protocol(&self, name: &str) -> Result<Protocol> {
        biowave_db::get_protocol_by_name(&self.conn, name)?.ok_or_else(|| {
            DatabaseError::NotFound {
                kind: "protocol",
                key: name.to_string(),
            }
        })
    }

    pub fn protocol_purposes(&self) -> Result<Vec<ProtocolPurpose>> {
        Ok(biowave_db::get_all_protocol_purposes(&self.conn)?)
    }

    /// Empty means every protocol; unknown names are rejected
    fn check_protocols(&self, requested: &[String]) -> Result<Vec<String>> {
        let known = self.protocol_names()?;
        if requested.is_empty() {
            return Ok(known);
        }
        for name in requested {
            if !known.contains(name) {
                let allowed: Vec<&str> = known.iter().map(String::as_str).collect();
                return Err(ParseChoiceError::new("protocol", name, &allowed).into());
            }
        }
        Ok(requested.to_vec())
    }

    /// Clients by hand. A protocol or group filter keeps only clients with
    /// files in those partitions.
    pub fn clients(&self, query: &ClientQuery) -> Result<Vec<Client>> {
        let protocols = if query.protocol.is_empty() {
            Vec::new()
        } else {
            self.check_protocols(&query.protocol)?
        };
        let criteria = ClientCriteria {
            hands: query.hands.clone(),
            protocols,
            groups: query.groups.clone(),
        };
        Ok(biowave_db::query_clients(&self.conn, &criteria)?)
    }

    /// Same as [`Database::clients`]
    pub fn models(&self, query: &ClientQuery) -> Result<Vec<Client>> {
        self.clients(query)
    }

    /// Model ids of the enrollment files in the selected groups
    pub fn model_ids(&self, query: &ModelQuery) -> Result<Vec<String>> {
        let files = self.objects(&ObjectQuery {
            protocol: query.protocol.clone(),
            groups: query.groups.clone(),
            purposes: vec![Purpose::Enroll],
            model_ids: Vec::new(),
        })?;
        Ok(files.into_iter().map(|f| f.model_id).collect())
    }

    pub fn has_client_id(&self, id: i64) -> Result<bool> {
        Ok(biowave_db::get_client_by_id(&self.conn, id)?.is_some())
    }

    /// The client with SQL id `id`, or `NotFound`
    pub fn client(&self, id: i64) -> Result<Client> {
        biowave_db::get_client_by_id(&self.conn, id)?.ok_or_else(|| DatabaseError::NotFound {
            kind: "client",
            key: id.to_string(),
        })
    }

    /// Files of the selected protocol partitions, ordered by client.
    ///
    /// `model_ids` restricts every partition to those files, except for a
    /// probe-only query: every probe is scored against each model, so it
    /// returns all probes of the selected groups.
    pub fn objects(&self, query: &ObjectQuery) -> Result<Vec<File>> {
        let protocols = self.check_protocols(&query.protocol)?;
        let groups: &[Group] = if query.groups.is_empty() {
            &Group::ALL
        } else {
            &query.groups
        };
        let purposes: &[Purpose] = if query.purposes.is_empty() {
            &Purpose::ALL
        } else {
            &query.purposes
        };

        let probe_only = purposes.iter().all(|&p| p == Purpose::Probe);
        let model_ids = if probe_only {
            Vec::new()
        } else {
            query.model_ids.clone()
        };

        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for &group in groups {
            let criteria = FileCriteria {
                protocols: protocols.clone(),
                group,
                purposes: purposes.to_vec(),
                model_ids: model_ids.clone(),
            };
            files.extend(biowave_db::query_files(&self.conn, &criteria)?);
        }

        files.retain(|f| seen.insert(f.id));
        files.sort_by_key(|f| (f.client_id, f.id));
        Ok(files)
    }

    /// Files with the given ids; unknown ids are skipped
    pub fn files_by_ids(&self, ids: &[i64]) -> Result<Vec<File>> {
        let mut files = Vec::with_capacity(ids.len());
        for &id in ids {
            match biowave_db::get_file_by_id(&self.conn, id)? {
                Some(file) => files.push(file),
                None => log::debug!("No file with id {}", id),
            }
        }
        Ok(files)
    }

    /// Files stored under the given relative paths; unknown paths are skipped
    pub fn reverse(&self, paths: &[String]) -> Result<Vec<File>> {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let found = biowave_db::get_files_by_path(&self.conn, path)?;
            if found.is_empty() {
                log::debug!("No file stored under {}", path);
            }
            files.extend(found);
        }
        Ok(files)
    }

    pub fn all_files(&self) -> Result<Vec<File>> {
        Ok(biowave_db::get_all_files(&self.conn)?)
    }
}
