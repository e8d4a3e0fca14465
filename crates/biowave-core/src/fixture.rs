//! On-disk sample database used by the unit tests
//!
//! Four people with five images per hand. Left hands form the dev group and
//! right hands the eval group; images 1-2 enroll and images 3-5 probe.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::create::Sources;
use crate::filelist::LIST_PREFIX;

pub const PERSONS: usize = 4;
pub const IMAGES_PER_HAND: usize = 5;
pub const ENROLL_IMAGES: [usize; 2] = [1, 2];
pub const PROBE_IMAGES: [usize; 3] = [3, 4, 5];

pub struct Fixture {
    pub dir: TempDir,
    pub sources: Sources,
}

impl Fixture {
    pub fn dbfile(&self) -> PathBuf {
        self.dir.path().join("out").join("db.sql3")
    }
}

pub fn person_folder(person: usize) -> String {
    format!("Person_{:02}", person)
}

pub fn image_stem(person: usize, hand: &str, image: usize) -> String {
    format!("BioPic_{:02}_{}_{}", person, hand, image)
}

pub fn entry(person: usize, hand: &str, image: usize) -> String {
    format!("{}/{}/{}", person_folder(person), hand, image_stem(person, hand, image))
}

pub fn write_hand(root: &Path, person: usize, hand: &str, images: usize) {
    let dir = root.join(person_folder(person)).join(hand);
    std::fs::create_dir_all(&dir).unwrap();
    for image in 1..=images {
        std::fs::write(dir.join(format!("{}.png", image_stem(person, hand, image))), b"png").unwrap();
    }
    std::fs::write(dir.join("Thumbs.db"), b"").unwrap();
}

/// Genuine comparisons of one hand for every person
pub fn genuine_list(hand: &str, prefixed: bool) -> String {
    let mut lines = Vec::new();
    for person in 1..=PERSONS {
        for enroll in ENROLL_IMAGES {
            for probe in PROBE_IMAGES {
                let (prefix, ext) = if prefixed { (LIST_PREFIX, ".jpg") } else { ("", ".png") };
                lines.push(format!(
                    "{}{}{}, {}{}{}, 1",
                    prefix,
                    entry(person, hand, enroll),
                    ext,
                    prefix,
                    entry(person, hand, probe),
                    ext
                ));
            }
        }
    }
    lines.join("\n") + "\n"
}

pub fn build_with_lists(dev: &str, eval: &str) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let imagedir = dir.path().join("database");
    for person in 1..=PERSONS {
        write_hand(&imagedir, person, "Left", IMAGES_PER_HAND);
        write_hand(&imagedir, person, "Right", IMAGES_PER_HAND);
    }
    std::fs::write(imagedir.join("README.txt"), b"not a person").unwrap();

    let devfile = dir.path().join("devSetGenuine.txt");
    let evalfile = dir.path().join("evalSetGenuine.txt");
    std::fs::write(&devfile, dev).unwrap();
    std::fs::write(&evalfile, eval).unwrap();

    Fixture {
        sources: Sources {
            imagedir,
            devfile,
            evalfile,
            image_extension: ".png".to_string(),
        },
        dir,
    }
}

pub fn build() -> Fixture {
    build_with_lists(&genuine_list("Left", true), &genuine_list("Right", false))
}

/// A populated in-memory connection built from [`build`]
pub fn populated() -> (Fixture, biowave_db::Connection) {
    let fixture = build();
    let mut conn = biowave_db::open_in_memory().unwrap();
    crate::create::populate(&mut conn, &fixture.sources).unwrap();
    (fixture, conn)
}
