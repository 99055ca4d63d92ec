//! Naming of generation directories.
//!
//! A generation directory is called `<base>-Backup-<NNN>` where `NNN` is the
//! generation index zero padded to a fixed width, so lexical and numeric
//! ordering agree. Index 1 is always the newest snapshot.

use bon::Builder;
use derive_more::{Display, From};
use getset::{CopyGetters, Getters};
use std::fs::read_dir;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backup::result_error::result::Result;

/// Width used for the `NNN` suffix when none is configured
pub const DEFAULT_NAME_WIDTH: u8 = 3;

const BACKUP_INFIX: &str = "-Backup-";

/// Index of a generation, 1 being the most recent
#[derive(Clone, Copy, Debug, Display, From, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u32);

impl Generation {
    pub const NEWEST: Generation = Generation(1);
    pub const LINK_REFERENCE: Generation = Generation(2);

    pub fn index(self) -> u32 {
        self.0
    }

    /// Generation one step older than this one.
    pub fn older(self) -> Generation {
        Generation(self.0 + 1)
    }
}

#[derive(Clone, Debug, Builder, Getters, CopyGetters, PartialEq, Eq)]
pub struct GenerationNamer {
    #[builder(into)]
    #[getset(get = "pub")]
    base_name: Arc<str>,
    #[builder(default = DEFAULT_NAME_WIDTH)]
    #[getset(get_copy = "pub")]
    width: u8,
}

impl GenerationNamer {
    /// Largest index that still fits in the configured width.
    pub fn max_index(&self) -> u32 {
        max_index_for_width(self.width)
    }

    pub fn name(&self, generation: Generation) -> String {
        format!(
            "{}{}{:0width$}",
            self.base_name,
            BACKUP_INFIX,
            generation.index(),
            width = self.width as usize
        )
    }

    pub fn path<P: AsRef<Path>>(&self, root: P, generation: Generation) -> PathBuf {
        root.as_ref().join(self.name(generation))
    }

    /// Recovers the generation from a directory name produced by [`Self::name`].
    ///
    /// Names with a different base, a different width or a non numeric suffix
    /// are not ours and yield `None`.
    pub fn parse(&self, file_name: &str) -> Option<Generation> {
        let digits = file_name
            .strip_prefix(self.base_name.as_ref())?
            .strip_prefix(BACKUP_INFIX)?;
        if digits.len() != self.width as usize || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<u32>().ok().map(Generation)
    }

    /// Generations currently present under `root`, oldest last.
    pub fn list_generations<P: AsRef<Path>>(&self, root: P) -> Result<Vec<Generation>> {
        let mut generations = Vec::new();
        for entry in read_dir(root.as_ref())? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(generation) = entry.file_name().to_str().and_then(|n| self.parse(n)) {
                generations.push(generation);
            }
        }
        generations.sort_unstable();
        Ok(generations)
    }
}

pub fn max_index_for_width(width: u8) -> u32 {
    10u32
        .checked_pow(width as u32)
        .map(|limit| limit - 1)
        .unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use tempfile::TempDir;

    fn namer() -> GenerationNamer {
        GenerationNamer::builder().base_name("photos").build()
    }

    #[test]
    fn test_name_is_zero_padded() {
        assert_eq!(namer().name(Generation::NEWEST), "photos-Backup-001");
        assert_eq!(namer().name(Generation::from(42)), "photos-Backup-042");
        assert_eq!(namer().name(Generation::from(999)), "photos-Backup-999");
    }

    #[test]
    fn test_custom_width() {
        let namer = GenerationNamer::builder()
            .base_name("photos")
            .width(5)
            .build();
        assert_eq!(namer.name(Generation::from(7)), "photos-Backup-00007");
        assert_eq!(namer.max_index(), 99_999);
    }

    #[test]
    fn test_lexical_order_matches_numeric_order() {
        let names = (1..=120).map(|i| namer().name(Generation::from(i))).collect_vec();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_parse_roundtrips_and_rejects_foreign_names() {
        let namer = namer();
        assert_eq!(namer.parse("photos-Backup-003"), Some(Generation::from(3)));
        assert_eq!(namer.parse("photos-Backup-03"), None);
        assert_eq!(namer.parse("photos-Backup-0003"), None);
        assert_eq!(namer.parse("music-Backup-003"), None);
        assert_eq!(namer.parse("photos-Backup-0x3"), None);
        assert_eq!(namer.parse("photos-Backup-+03"), None);
    }

    #[test]
    fn test_max_index_for_width() {
        assert_eq!(max_index_for_width(1), 9);
        assert_eq!(max_index_for_width(3), 999);
        assert_eq!(max_index_for_width(9), 999_999_999);
        assert_eq!(max_index_for_width(12), u32::MAX);
    }

    #[test]
    fn test_list_generations_reports_unreadable_root() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("missing");
        assert!(namer().list_generations(&missing).is_err());
    }

    #[test]
    fn test_list_generations_skips_files_and_foreign_dirs() {
        let root = TempDir::new().unwrap();
        let namer = namer();
        for g in [3, 1, 2] {
            std::fs::create_dir(namer.path(root.path(), Generation::from(g))).unwrap();
        }
        std::fs::create_dir(root.path().join("other-Backup-001")).unwrap();
        std::fs::write(root.path().join("photos-Backup-004"), "not a dir").unwrap();

        let found = namer.list_generations(root.path()).unwrap();
        assert_eq!(
            found,
            vec![Generation::from(1), Generation::from(2), Generation::from(3)]
        );
    }
}
