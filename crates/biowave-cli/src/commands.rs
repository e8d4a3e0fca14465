//! Implementations of the `bwdb` sub-commands
//!
//! Each function returns what the binary prints, so the binary only handles
//! argument wiring, `--self-test` and output.

use anyhow::{Context, Result};
use biowave_core::{
    BiowaveConfig, CreateOptions, CreateSummary, Database, File, ObjectQuery, Sources,
};
use rayon::prelude::*;
use std::path::PathBuf;

/// How stored relative paths are turned into file names
#[derive(Debug, Clone)]
pub struct PathFormat {
    pub directory: PathBuf,
    pub extension: String,
}

impl PathFormat {
    /// Use the given values, or the configured output defaults
    pub fn resolve(config: &BiowaveConfig, directory: Option<PathBuf>, extension: Option<String>) -> Self {
        Self {
            directory: directory.unwrap_or_else(|| config.output.original_directory.clone()),
            extension: extension.unwrap_or_else(|| config.output.original_extension.clone()),
        }
    }

    pub fn full_path(&self, file: &File) -> PathBuf {
        file.make_path(&self.directory, &self.extension)
    }
}

/// Overrides of the configured sources given on the command line
#[derive(Debug, Clone, Default)]
pub struct SourceOverrides {
    pub imagedir: Option<PathBuf>,
    pub devfile: Option<PathBuf>,
    pub evalfile: Option<PathBuf>,
}

/// Result of a `checkfiles` pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub total: usize,
    pub missing: Vec<PathBuf>,
}

pub fn open_database(config: &BiowaveConfig) -> Result<Database> {
    let dbfile = &config.database.file;
    Database::open(dbfile).with_context(|| format!("Failed to open database {}", dbfile.display()))
}

pub fn create(config: &BiowaveConfig, overrides: SourceOverrides, recreate: bool) -> Result<CreateSummary> {
    let mut sources = Sources::from_config(config);
    if let Some(imagedir) = overrides.imagedir {
        sources.imagedir = imagedir;
    }
    if let Some(devfile) = overrides.devfile {
        sources.devfile = devfile;
    }
    if let Some(evalfile) = overrides.evalfile {
        sources.evalfile = evalfile;
    }

    log::info!("Building {} from {}", config.database.file.display(), sources.imagedir.display());
    let options = CreateOptions {
        dbfile: config.database.file.clone(),
        sources,
        recreate,
    };
    let summary = biowave_core::create(&options).context("Failed to create database")?;
    Ok(summary)
}

pub fn dumplist(db: &Database, query: &ObjectQuery) -> Result<Vec<File>> {
    let files = db.objects(query)?;
    log::info!("{} files match the query", files.len());
    Ok(files)
}

/// Look for every database file below the given directory
pub fn checkfiles(db: &Database, format: &PathFormat) -> Result<CheckReport> {
    let files = db.all_files()?;
    let missing: Vec<PathBuf> = files
        .par_iter()
        .map(|f| format.full_path(f))
        .filter(|path| !path.exists())
        .collect();

    for path in &missing {
        log::debug!("Cannot find file {}", path.display());
    }

    Ok(CheckReport {
        total: files.len(),
        missing,
    })
}

/// File ids of the given stored paths
pub fn reverse(db: &Database, paths: &[String]) -> Result<Vec<i64>> {
    Ok(db.reverse(paths)?.into_iter().map(|f| f.id).collect())
}

/// Full paths of the files with the given ids
pub fn paths(db: &Database, ids: &[i64], format: &PathFormat) -> Result<Vec<PathBuf>> {
    Ok(db
        .files_by_ids(ids)?
        .iter()
        .map(|f| format.full_path(f))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use biowave_core::{Group, Purpose};
    use std::path::Path;

    const PEOPLE: [&str; 2] = ["Person_01", "Person_02"];

    fn write_images(root: &Path) {
        for person in PEOPLE {
            for hand in ["Left", "Right"] {
                let dir = root.join(person).join(hand);
                std::fs::create_dir_all(&dir).unwrap();
                for i in 1..=5 {
                    std::fs::write(dir.join(format!("img_{}.png", i)), b"png").unwrap();
                }
            }
        }
    }

    fn filelist(hand: &str) -> String {
        PEOPLE
            .iter()
            .map(|p| format!("{p}/{hand}/img_1.png, {p}/{hand}/img_2.png, 1\n{p}/{hand}/img_1.png, {p}/{hand}/img_3.png, 1\n"))
            .collect()
    }

    fn setup() -> (tempfile::TempDir, BiowaveConfig) {
        let dir = tempfile::tempdir().unwrap();
        let imagedir = dir.path().join("images");
        write_images(&imagedir);
        std::fs::write(dir.path().join("dev.txt"), filelist("Left")).unwrap();
        std::fs::write(dir.path().join("eval.txt"), filelist("Right")).unwrap();

        let mut config = BiowaveConfig::default();
        config.database.file = dir.path().join("db").join("db.sql3");
        config.sources.imagedir = imagedir.clone();
        config.sources.devfile = dir.path().join("dev.txt");
        config.sources.evalfile = dir.path().join("eval.txt");
        config.output.original_directory = imagedir;

        let summary = create(&config, SourceOverrides::default(), false).unwrap();
        assert_eq!(summary.clients, 4);
        assert_eq!(summary.files, 20);
        assert_eq!(summary.linked_files, 12);
        (dir, config)
    }

    #[test]
    fn test_create_overrides_sources() {
        let (dir, config) = setup();
        let overrides = SourceOverrides {
            devfile: Some(dir.path().join("missing.txt")),
            ..Default::default()
        };
        let err = create(&config, overrides, true).unwrap_err();
        assert!(format!("{:#}", err).contains("missing.txt"));
    }

    #[test]
    fn test_dumplist_filters() {
        let (_dir, config) = setup();
        let db = open_database(&config).unwrap();

        let enroll = dumplist(
            &db,
            &ObjectQuery {
                groups: vec![Group::Dev],
                purposes: vec![Purpose::Enroll],
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(enroll.len(), 2);
        assert_eq!(enroll[0].path, "Person_01/Left/img_1");
        assert_eq!(dumplist(&db, &ObjectQuery::default()).unwrap().len(), 12);
    }

    #[test]
    fn test_checkfiles_reports_missing() {
        let (_dir, config) = setup();
        let db = open_database(&config).unwrap();
        let format = PathFormat::resolve(&config, None, None);

        let report = checkfiles(&db, &format).unwrap();
        assert_eq!(report.total, 20);
        assert!(report.missing.is_empty());

        let removed = config.sources.imagedir.join("Person_02/Right/img_4.png");
        std::fs::remove_file(&removed).unwrap();
        let report = checkfiles(&db, &format).unwrap();
        assert_eq!(report.missing, vec![removed]);

        let wrong_ext = PathFormat::resolve(&config, None, Some(".jpg".to_string()));
        assert_eq!(checkfiles(&db, &wrong_ext).unwrap().missing.len(), 20);
    }

    #[test]
    fn test_reverse_and_paths() {
        let (_dir, config) = setup();
        let db = open_database(&config).unwrap();

        let ids = reverse(&db, &["Person_01/Left/img_3".to_string()]).unwrap();
        assert_eq!(ids, vec![3]);

        let format = PathFormat::resolve(&config, Some(PathBuf::from("/data")), Some(".png".to_string()));
        let found = paths(&db, &[3, 999], &format).unwrap();
        assert_eq!(found, vec![PathBuf::from("/data/Person_01/Left/img_3.png")]);
    }

    #[test]
    fn test_open_missing_database() {
        let mut config = BiowaveConfig::default();
        config.database.file = PathBuf::from("/nonexistent/db.sql3");
        assert!(open_database(&config).is_err());
    }
}
