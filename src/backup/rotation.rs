//! Rotation of the generation directories under a backup root.
//!
//! Two passes make room for a fresh generation 1:
//!
//! 1. **Eviction**: starting at the retention count, every generation that
//!    exists is removed until the first missing index. This also cleans up
//!    leftovers from earlier runs with a larger retention count.
//! 2. **Shift**: from `retention - 1` down to 1 every existing generation is
//!    renamed one index up. Descending order guarantees a rename never lands
//!    on a directory that has not been moved yet.
//!
//! The plan is computed up front and executed step by step, so a dry run
//! reports exactly what a real run would do, in the same order.

use bon::Builder;
use derive_more::Display;
use getset::Getters;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::backup::generation::{Generation, GenerationNamer};
use crate::backup::result_error::error::{Error, FsOperation};
use crate::backup::result_error::result::Result;

#[derive(Clone, Debug, Display, PartialEq, Eq)]
pub enum RotationStep {
    #[display("Remove obsolete path: {}", path.display())]
    Evict { generation: Generation, path: PathBuf },
    #[display("Move {} to {}", from_path.display(), to_path.display())]
    Shift {
        from: Generation,
        to: Generation,
        from_path: PathBuf,
        to_path: PathBuf,
    },
}

impl RotationStep {
    fn apply(&self) -> Result<()> {
        match self {
            RotationStep::Evict { path, .. } => {
                let removed = if path.is_dir() {
                    std::fs::remove_dir_all(path)
                } else {
                    std::fs::remove_file(path)
                };
                removed.map_err(|source| Error::FilesystemOperation {
                    op: FsOperation::Remove(path.clone()),
                    source,
                })
            }
            RotationStep::Shift {
                from_path, to_path, ..
            } => std::fs::rename(from_path, to_path).map_err(|source| {
                Error::FilesystemOperation {
                    op: FsOperation::Rename {
                        from: from_path.clone(),
                        to: to_path.clone(),
                    },
                    source,
                }
            }),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct RotationPlan {
    evictions: Vec<RotationStep>,
    shifts: Vec<RotationStep>,
}

impl RotationPlan {
    /// All steps in execution order: evictions first, then shifts.
    pub fn steps(&self) -> impl Iterator<Item = &RotationStep> {
        self.evictions.iter().chain(self.shifts.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.evictions.is_empty() && self.shifts.is_empty()
    }

    /// Runs the plan. The first failing step aborts the rotation; whatever
    /// was already moved stays moved and the next run picks up from there.
    pub fn execute(&self, dry_run: bool) -> Result<()> {
        let prefix = if dry_run { "Would " } else { "" };
        for step in self.steps() {
            info!("{prefix}{step}");
            if !dry_run {
                step.apply()?;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Builder)]
pub struct RotationPlanner<'a> {
    root: &'a Path,
    namer: &'a GenerationNamer,
    retention_count: u32,
}

impl RotationPlanner<'_> {
    pub fn plan(&self) -> RotationPlan {
        RotationPlan {
            evictions: self.eviction_pass(),
            shifts: self.shift_pass(),
        }
    }

    fn exists(path: &Path) -> bool {
        path.symlink_metadata().is_ok()
    }

    /// Contiguous sweep from the retention boundary upward. Bounded by the
    /// largest index the namer can express.
    fn eviction_pass(&self) -> Vec<RotationStep> {
        let first = self.retention_count.max(1);
        (first..=self.namer.max_index())
            .map(Generation::from)
            .map(|generation| (generation, self.namer.path(self.root, generation)))
            .take_while(|(_, path)| Self::exists(path))
            .map(|(generation, path)| RotationStep::Evict { generation, path })
            .collect()
    }

    fn shift_pass(&self) -> Vec<RotationStep> {
        (1..self.retention_count)
            .rev()
            .map(Generation::from)
            .filter_map(|from| {
                let from_path = self.namer.path(self.root, from);
                if !Self::exists(&from_path) {
                    return None;
                }
                let to = from.older();
                Some(RotationStep::Shift {
                    from,
                    to,
                    from_path,
                    to_path: self.namer.path(self.root, to),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn namer() -> GenerationNamer {
        GenerationNamer::builder().base_name("src").build()
    }

    /// Creates the given generations, each holding a marker file naming the
    /// generation it was created as.
    fn seed(root: &Path, namer: &GenerationNamer, generations: &[u32]) {
        for &g in generations {
            let dir = namer.path(root, Generation::from(g));
            std::fs::create_dir(&dir).unwrap();
            std::fs::write(dir.join("marker"), format!("snapshot {g}")).unwrap();
        }
    }

    fn marker(root: &Path, namer: &GenerationNamer, generation: u32) -> String {
        std::fs::read_to_string(namer.path(root, Generation::from(generation)).join("marker"))
            .unwrap()
    }

    fn present(root: &Path, namer: &GenerationNamer) -> Vec<u32> {
        namer
            .list_generations(root)
            .unwrap()
            .into_iter()
            .map(Generation::index)
            .collect()
    }

    fn plan(root: &Path, namer: &GenerationNamer, retention_count: u32) -> RotationPlan {
        RotationPlanner::builder()
            .root(root)
            .namer(namer)
            .retention_count(retention_count)
            .build()
            .plan()
    }

    #[test]
    fn test_empty_root_has_empty_plan() {
        let root = TempDir::new().unwrap();
        assert!(plan(root.path(), &namer(), 3).is_empty());
    }

    #[test]
    fn test_shift_moves_each_generation_one_older() {
        let root = TempDir::new().unwrap();
        let namer = namer();
        seed(root.path(), &namer, &[1, 2]);

        let plan = plan(root.path(), &namer, 3);
        assert!(plan.evictions().is_empty());
        let moves: Vec<_> = plan
            .shifts()
            .iter()
            .map(|s| match s {
                RotationStep::Shift { from, to, .. } => (from.index(), to.index()),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(moves, vec![(2, 3), (1, 2)]);

        plan.execute(false).unwrap();
        assert_eq!(present(root.path(), &namer), vec![2, 3]);
        assert_eq!(marker(root.path(), &namer, 2), "snapshot 1");
        assert_eq!(marker(root.path(), &namer, 3), "snapshot 2");
    }

    #[test]
    fn test_eviction_sweeps_stale_generations_after_shrink() {
        let root = TempDir::new().unwrap();
        let namer = namer();
        seed(root.path(), &namer, &[1, 2, 3, 4]);

        let plan = plan(root.path(), &namer, 2);
        let evicted: Vec<_> = plan
            .evictions()
            .iter()
            .map(|s| match s {
                RotationStep::Evict { generation, .. } => generation.index(),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(evicted, vec![2, 3, 4]);
        assert_eq!(plan.shifts().len(), 1);

        plan.execute(false).unwrap();
        assert_eq!(present(root.path(), &namer), vec![2]);
        assert_eq!(marker(root.path(), &namer, 2), "snapshot 1");
    }

    #[test]
    fn test_eviction_stops_at_first_gap() {
        let root = TempDir::new().unwrap();
        let namer = namer();
        seed(root.path(), &namer, &[1, 3, 5]);

        let plan = plan(root.path(), &namer, 3);
        assert_eq!(plan.evictions().len(), 1);
        plan.execute(false).unwrap();
        assert_eq!(present(root.path(), &namer), vec![2, 5]);
    }

    #[test]
    fn test_eviction_is_idempotent() {
        let root = TempDir::new().unwrap();
        let namer = namer();
        seed(root.path(), &namer, &[3, 4]);

        plan(root.path(), &namer, 3).execute(false).unwrap();
        let second = plan(root.path(), &namer, 3);
        assert!(second.evictions().is_empty());
    }

    #[test]
    fn test_retention_one_clears_everything() {
        let root = TempDir::new().unwrap();
        let namer = namer();
        seed(root.path(), &namer, &[1, 2]);

        let plan = plan(root.path(), &namer, 1);
        assert!(plan.shifts().is_empty());
        plan.execute(false).unwrap();
        assert!(present(root.path(), &namer).is_empty());
    }

    #[test]
    fn test_at_most_retention_minus_one_remain_after_rotation() {
        for retention in 1..=5 {
            for prior in 0..=7u32 {
                let root = TempDir::new().unwrap();
                let namer = namer();
                seed(root.path(), &namer, &(1..=prior).collect::<Vec<_>>());

                plan(root.path(), &namer, retention).execute(false).unwrap();

                let expected: Vec<u32> = (2..=prior.min(retention - 1) + 1).collect();
                assert_eq!(
                    present(root.path(), &namer),
                    expected,
                    "retention {retention}, prior {prior}"
                );
            }
        }
    }

    #[test]
    fn test_dry_run_does_not_touch_disk() {
        let root = TempDir::new().unwrap();
        let namer = namer();
        seed(root.path(), &namer, &[1, 2, 3, 4]);

        let plan = plan(root.path(), &namer, 2);
        plan.execute(true).unwrap();
        assert_eq!(present(root.path(), &namer), vec![1, 2, 3, 4]);
        assert_eq!(marker(root.path(), &namer, 1), "snapshot 1");
    }

    #[test]
    fn test_step_display() {
        let step = RotationStep::Shift {
            from: Generation::from(1),
            to: Generation::from(2),
            from_path: PathBuf::from("a-Backup-001"),
            to_path: PathBuf::from("a-Backup-002"),
        };
        assert_eq!(step.to_string(), "Move a-Backup-001 to a-Backup-002");
        let step = RotationStep::Evict {
            generation: Generation::from(3),
            path: PathBuf::from("a-Backup-003"),
        };
        assert_eq!(step.to_string(), "Remove obsolete path: a-Backup-003");
    }

    #[test]
    fn test_failed_step_aborts_with_filesystem_error() {
        let root = TempDir::new().unwrap();
        let namer = namer();
        seed(root.path(), &namer, &[1]);

        let plan = plan(root.path(), &namer, 2);
        std::fs::remove_dir_all(namer.path(root.path(), Generation::NEWEST)).unwrap();

        match plan.execute(false) {
            Err(Error::FilesystemOperation {
                op: FsOperation::Rename { from, .. },
                ..
            }) => assert_eq!(from, namer.path(root.path(), Generation::NEWEST)),
            other => panic!("Expected FilesystemOperation, got {other:?}"),
        }
    }
}
