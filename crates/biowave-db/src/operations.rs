use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::str::FromStr;

use crate::models::*;

/// Tables whose rows can be counted with [`count_rows`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Client,
    File,
    Protocol,
    ProtocolPurpose,
    Association,
}

impl Table {
    fn name(&self) -> &'static str {
        match self {
            Table::Client => "client",
            Table::File => "file",
            Table::Protocol => "protocol",
            Table::ProtocolPurpose => "protocolPurpose",
            Table::Association => "protocolPurpose_file_association",
        }
    }
}

const PROTOCOL_JOINS: &str = "
     JOIN protocolPurpose_file_association a ON a.file_id = f.id
     JOIN protocolPurpose pp ON pp.id = a.protocolPurpose_id
     JOIN protocol p ON p.id = pp.protocol_id";

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = ParseChoiceError>,
{
    let text: String = row.get(idx)?;
    text.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn client_from_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get(0)?,
        original_client_id: row.get(1)?,
        hand: parse_column(row, 2)?,
    })
}

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<File> {
    Ok(File {
        id: row.get(0)?,
        client_id: row.get(1)?,
        path: row.get(2)?,
        model_id: row.get(3)?,
    })
}

fn purpose_from_row(row: &Row<'_>) -> rusqlite::Result<ProtocolPurpose> {
    Ok(ProtocolPurpose {
        id: row.get(0)?,
        protocol_id: row.get(1)?,
        protocol_name: row.get(2)?,
        group: parse_column(row, 3)?,
        purpose: parse_column(row, 4)?,
    })
}

/// Append ` AND <column> IN (?n, ...)` for a non-empty value list
fn push_in_filter<I, S>(sql: &mut String, params: &mut Vec<String>, column: &str, values: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let start = params.len();
    params.extend(values.into_iter().map(Into::into));
    if params.len() == start {
        return;
    }
    let placeholders: Vec<String> = (start + 1..=params.len())
        .map(|n| format!("?{}", n))
        .collect();
    sql.push_str(&format!(" AND {} IN ({})", column, placeholders.join(", ")));
}

/// Insert a new client
pub fn insert_client(conn: &Connection, client: &NewClient) -> Result<i64> {
    let id = conn
        .query_row(
            "INSERT INTO client (original_client_id, hand) VALUES (?1, ?2) RETURNING id",
            params![client.original_client_id, client.hand.as_str()],
            |row| row.get(0),
        )
        .context("Failed to insert client")?;
    Ok(id)
}

/// Insert a new file
pub fn insert_file(conn: &Connection, file: &NewFile) -> Result<i64> {
    let id = conn
        .query_row(
            "INSERT INTO file (client_id, path, model_id) VALUES (?1, ?2, ?3) RETURNING id",
            params![file.client_id, file.path, file.model_id],
            |row| row.get(0),
        )
        .with_context(|| format!("Failed to insert file {}", file.path))?;
    Ok(id)
}

/// Insert a protocol
pub fn insert_protocol(conn: &Connection, name: &str) -> Result<i64> {
    let id = conn
        .query_row(
            "INSERT INTO protocol (name) VALUES (?1) RETURNING id",
            params![name],
            |row| row.get(0),
        )
        .with_context(|| format!("Failed to insert protocol {}", name))?;
    Ok(id)
}

/// Insert a (group, purpose) partition of a protocol
pub fn insert_protocol_purpose(
    conn: &Connection,
    protocol_id: i64,
    group: Group,
    purpose: Purpose,
) -> Result<i64> {
    let id = conn
        .query_row(
            "INSERT INTO protocolPurpose (protocol_id, sgroup, purpose)
             VALUES (?1, ?2, ?3)
             RETURNING id",
            params![protocol_id, group.as_str(), purpose.as_str()],
            |row| row.get(0),
        )
        .context("Failed to insert protocol purpose")?;
    Ok(id)
}

/// Attach a file to a protocol purpose
pub fn link_file(conn: &Connection, protocol_purpose_id: i64, file_id: i64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO protocolPurpose_file_association (protocolPurpose_id, file_id)
         VALUES (?1, ?2)",
        params![protocol_purpose_id, file_id],
    )
    .context("Failed to link file to protocol purpose")?;
    Ok(())
}

/// Get a client by its original (folder) id and hand
pub fn get_client_by_original_id(
    conn: &Connection,
    original_client_id: i64,
    hand: Hand,
) -> Result<Option<Client>> {
    let client = conn
        .query_row(
            "SELECT id, original_client_id, hand FROM client
             WHERE original_client_id = ?1 AND hand = ?2
             ORDER BY id
             LIMIT 1",
            params![original_client_id, hand.as_str()],
            client_from_row,
        )
        .optional()
        .context("Failed to get client by original id")?;
    Ok(client)
}

/// Get a client by ID
pub fn get_client_by_id(conn: &Connection, id: i64) -> Result<Option<Client>> {
    let client = conn
        .query_row(
            "SELECT id, original_client_id, hand FROM client WHERE id = ?1",
            params![id],
            client_from_row,
        )
        .optional()
        .context("Failed to get client")?;
    Ok(client)
}

/// Get all clients
pub fn get_all_clients(conn: &Connection) -> Result<Vec<Client>> {
    let mut stmt = conn
        .prepare("SELECT id, original_client_id, hand FROM client ORDER BY id")
        .context("Failed to prepare client query")?;
    let clients = stmt
        .query_map([], client_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to get all clients")?;
    Ok(clients)
}

/// Get a file by ID
pub fn get_file_by_id(conn: &Connection, id: i64) -> Result<Option<File>> {
    let file = conn
        .query_row(
            "SELECT id, client_id, path, model_id FROM file WHERE id = ?1",
            params![id],
            file_from_row,
        )
        .optional()
        .context("Failed to get file")?;
    Ok(file)
}

/// Get a file by model id
pub fn get_file_by_model_id(conn: &Connection, model_id: &str) -> Result<Option<File>> {
    let file = conn
        .query_row(
            "SELECT id, client_id, path, model_id FROM file WHERE model_id = ?1",
            params![model_id],
            file_from_row,
        )
        .optional()
        .context("Failed to get file by model id")?;
    Ok(file)
}

/// Get all files stored under a relative path
pub fn get_files_by_path(conn: &Connection, path: &str) -> Result<Vec<File>> {
    let mut stmt = conn
        .prepare("SELECT id, client_id, path, model_id FROM file WHERE path = ?1 ORDER BY id")
        .context("Failed to prepare file query")?;
    let files = stmt
        .query_map(params![path], file_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to get files by path")?;
    Ok(files)
}

/// Get all files
pub fn get_all_files(conn: &Connection) -> Result<Vec<File>> {
    let mut stmt = conn
        .prepare("SELECT id, client_id, path, model_id FROM file ORDER BY client_id, id")
        .context("Failed to prepare file query")?;
    let files = stmt
        .query_map([], file_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to get all files")?;
    Ok(files)
}

/// Get all protocols
pub fn get_all_protocols(conn: &Connection) -> Result<Vec<Protocol>> {
    let mut stmt = conn
        .prepare("SELECT id, name FROM protocol ORDER BY id")
        .context("Failed to prepare protocol query")?;
    let protocols = stmt
        .query_map([], |row| {
            Ok(Protocol {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to get all protocols")?;
    Ok(protocols)
}

/// Get a protocol by name
pub fn get_protocol_by_name(conn: &Connection, name: &str) -> Result<Option<Protocol>> {
    let protocol = conn
        .query_row(
            "SELECT id, name FROM protocol WHERE name = ?1",
            params![name],
            |row| {
                Ok(Protocol {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()
        .context("Failed to get protocol by name")?;
    Ok(protocol)
}

/// Get all protocol purposes together with their protocol name
pub fn get_all_protocol_purposes(conn: &Connection) -> Result<Vec<ProtocolPurpose>> {
    let mut stmt = conn
        .prepare(
            "SELECT pp.id, pp.protocol_id, p.name, pp.sgroup, pp.purpose
             FROM protocolPurpose pp
             JOIN protocol p ON p.id = pp.protocol_id
             ORDER BY pp.id",
        )
        .context("Failed to prepare protocol purpose query")?;
    let purposes = stmt
        .query_map([], purpose_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to get all protocol purposes")?;
    Ok(purposes)
}

/// Count the rows of a table
pub fn count_rows(conn: &Connection, table: Table) -> Result<i64> {
    let count = conn
        .query_row(&format!("SELECT COUNT(*) FROM {}", table.name()), [], |row| {
            row.get(0)
        })
        .with_context(|| format!("Failed to count rows of {}", table.name()))?;
    Ok(count)
}

/// Query clients with criteria
pub fn query_clients(conn: &Connection, criteria: &ClientCriteria) -> Result<Vec<Client>> {
    let linked = !criteria.protocols.is_empty() || !criteria.groups.is_empty();

    let mut sql = String::from("SELECT DISTINCT c.id, c.original_client_id, c.hand FROM client c");
    if linked {
        sql.push_str(" JOIN file f ON f.client_id = c.id");
        sql.push_str(PROTOCOL_JOINS);
    }
    sql.push_str(" WHERE 1=1");

    let mut params = Vec::new();
    push_in_filter(&mut sql, &mut params, "c.hand", criteria.hands.iter().map(|h| h.as_str()));
    push_in_filter(&mut sql, &mut params, "p.name", criteria.protocols.iter().cloned());
    push_in_filter(&mut sql, &mut params, "pp.sgroup", criteria.groups.iter().map(|g| g.as_str()));
    sql.push_str(" ORDER BY c.id");

    log::trace!("query_clients: {} {:?}", sql, params);

    let mut stmt = conn.prepare(&sql).context("Failed to prepare client query")?;
    let clients = stmt
        .query_map(params_from_iter(params.iter()), client_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to query clients")?;
    Ok(clients)
}

/// Query files of one group with criteria
pub fn query_files(conn: &Connection, criteria: &FileCriteria) -> Result<Vec<File>> {
    let mut sql = String::from("SELECT DISTINCT f.id, f.client_id, f.path, f.model_id FROM file f");
    sql.push_str(PROTOCOL_JOINS);
    sql.push_str(" WHERE 1=1");

    let mut params = Vec::new();
    push_in_filter(&mut sql, &mut params, "pp.sgroup", [criteria.group.as_str()]);
    push_in_filter(&mut sql, &mut params, "p.name", criteria.protocols.iter().cloned());
    push_in_filter(&mut sql, &mut params, "pp.purpose", criteria.purposes.iter().map(|p| p.as_str()));
    push_in_filter(&mut sql, &mut params, "f.model_id", criteria.model_ids.iter().cloned());
    sql.push_str(" ORDER BY f.client_id, f.id");

    log::trace!("query_files: {} {:?}", sql, params);

    let mut stmt = conn.prepare(&sql).context("Failed to prepare file query")?;
    let files = stmt
        .query_map(params_from_iter(params.iter()), file_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to query files")?;
    Ok(files)
}
