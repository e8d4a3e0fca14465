//! Plain and JSON output formatting

use biowave_core::File;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::commands::PathFormat;

#[derive(Serialize)]
struct FileOutput<'a> {
    id: i64,
    client_id: i64,
    model_id: &'a str,
    path: &'a str,
    full_path: PathBuf,
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing result: {}", e),
    }
}

/// Files as a pretty JSON array, including their full paths
pub fn files_json(files: &[File], format: &PathFormat) -> serde_json::Result<String> {
    let output: Vec<FileOutput<'_>> = files
        .iter()
        .map(|f| FileOutput {
            id: f.id,
            client_id: f.client_id,
            model_id: &f.model_id,
            path: &f.path,
            full_path: format.full_path(f),
        })
        .collect();
    serde_json::to_string_pretty(&output)
}

pub fn print_json_files(files: &[File], format: &PathFormat) {
    match files_json(files, format) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing files: {}", e),
    }
}

/// Print one path per line
pub fn print_paths<P: AsRef<Path>>(paths: &[P]) {
    for path in paths {
        println!("{}", path.as_ref().display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_json_has_full_paths() {
        let files = vec![File {
            id: 7,
            client_id: 2,
            path: "Person_01/Right/img_2".to_string(),
            model_id: "c_2_i_2".to_string(),
        }];
        let format = PathFormat {
            directory: PathBuf::from("/data"),
            extension: ".png".to_string(),
        };

        let json = files_json(&files, &format).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["id"], 7);
        assert_eq!(value[0]["model_id"], "c_2_i_2");
        assert_eq!(value[0]["path"], "Person_01/Right/img_2");
        assert_eq!(value[0]["full_path"], "/data/Person_01/Right/img_2.png");

        assert_eq!(files_json(&[], &format).unwrap(), "[]");
    }
}
