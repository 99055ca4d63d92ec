//! # rsync_generations
//!
//! Generational, space efficient backups of a directory tree.
//!
//! Each run produces a new snapshot `<name>-Backup-001` under the backup
//! root, after shifting the older snapshots one index up and evicting those
//! beyond the retention count. Files unchanged since the previous snapshot are
//! hard-linked by `rsync --link-dest` instead of being copied again.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rsync_generations::backup::backup_config::BackupConfig;
//! use rsync_generations::backup::orchestrator::Orchestrator;
//! use rsync_generations::backup::sync::rsync::RsyncSynchronizer;
//!
//! let config = BackupConfig::builder()
//!     .source("/home/me/photos")
//!     .destination("/mnt/backup")
//!     .retention_count(7)
//!     .build();
//!
//! let rsync = RsyncSynchronizer::locate(None)?;
//! Orchestrator::new(&config, &rsync).run()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backup;
