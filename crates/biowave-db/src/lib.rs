//! BioWave Database Layer
//!
//! SQLite schema, row models and queries for the BioWave test database

pub mod connection;
pub mod models;
pub mod operations;

// Re-export commonly used types
pub use connection::{create_tables, open, open_in_memory, open_read_only, test_connection};
pub use models::{
    model_id, Client, ClientCriteria, File, FileCriteria, Group, Hand, NewClient, NewFile,
    ParseChoiceError, Protocol, ProtocolPurpose, Purpose,
};
pub use operations::{
    count_rows, get_all_clients, get_all_files, get_all_protocol_purposes, get_all_protocols,
    get_client_by_id, get_client_by_original_id, get_file_by_id,
    get_file_by_model_id, get_files_by_path, get_protocol_by_name, insert_client, insert_file,
    insert_protocol, insert_protocol_purpose, link_file, query_clients, query_files, Table,
};
pub use rusqlite::Connection;
