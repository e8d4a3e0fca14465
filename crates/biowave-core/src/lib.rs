//! BioWave Core - access layer for the BioWave test vein database
//!
//! Builds the SQLite database from the raw image tree and genuine file
//! lists, and queries clients, protocols and files out of it.

pub mod config;
pub mod create;
pub mod error;
pub mod filelist;
pub mod query;

#[cfg(test)]
pub(crate) mod fixture;

pub use biowave_db::{Client, File, Group, Hand, Protocol, ProtocolPurpose, Purpose};
pub use config::BiowaveConfig;
pub use create::{create, populate, CreateOptions, CreateSummary, Sources};
pub use error::{DatabaseError, Result};
pub use filelist::{parse_filelist, read_filelist, FileList};
pub use query::{ClientQuery, Database, ModelQuery, ObjectQuery};
