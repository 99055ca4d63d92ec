//! Sequencing of a single backup run.
//!
//! `Start -> Validated -> Rotated -> Synced -> Done`; any failure moves the
//! run to `Failed` and skips the remaining steps. Nothing is retried, a
//! failed run is meant to be started again as a whole.

use derive_more::Display;
use getset::{CopyGetters, Getters};
use std::cell::Cell;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use validator::Validate;

use crate::backup::backup_config::BackupConfig;
use crate::backup::generation::{Generation, GenerationNamer};
use crate::backup::invoker::BackupInvoker;
use crate::backup::lock::RootLock;
use crate::backup::result_error::result::Result;
use crate::backup::rotation::{RotationPlan, RotationPlanner};
use crate::backup::sync::{SyncRequest, Synchronizer};
use crate::backup::validate::{normalize_source_and_destination, source_base_name};

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum RunState {
    Start,
    Validated,
    Rotated,
    Synced,
    Done,
    Failed,
}

/// What a finished run did.
#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct RunReport {
    #[getset(get_copy = "pub")]
    state: RunState,
    /// Generations present before rotation
    #[getset(get = "pub")]
    prior_generations: Vec<Generation>,
    #[getset(get = "pub")]
    rotation: RotationPlan,
    #[getset(get = "pub")]
    request: SyncRequest,
    #[getset(get_copy = "pub")]
    elapsed: Duration,
}

pub struct Orchestrator<'a, S: Synchronizer> {
    config: &'a BackupConfig,
    synchronizer: &'a S,
    state: Cell<RunState>,
}

impl<'a, S: Synchronizer> Orchestrator<'a, S> {
    pub fn new(config: &'a BackupConfig, synchronizer: &'a S) -> Self {
        Self {
            config,
            synchronizer,
            state: Cell::new(RunState::Start),
        }
    }

    /// State reached by the latest run, `Failed` if it returned an error.
    pub fn state(&self) -> RunState {
        self.state.get()
    }

    pub fn run(&self) -> Result<RunReport> {
        self.state.set(RunState::Start);
        self.run_steps().inspect_err(|e| {
            warn!("Run failed after reaching state {}: {e}", self.state());
            self.advance(RunState::Failed);
        })
    }

    fn advance(&self, next: RunState) {
        debug!("{} -> {next}", self.state());
        self.state.set(next);
    }

    fn run_steps(&self) -> Result<RunReport> {
        let started = Instant::now();
        let dry_run = self.config.dry_run();

        self.config.validate()?;
        let (source, root) =
            normalize_source_and_destination(self.config.source(), self.config.destination())?;
        let base_name = source_base_name(&source)?;
        let namer = GenerationNamer::builder()
            .base_name(base_name.as_str())
            .width(self.config.name_width())
            .build();
        self.advance(RunState::Validated);

        let _lock = if dry_run {
            None
        } else {
            Some(RootLock::acquire(&root, &base_name)?)
        };

        let prior_generations = namer.list_generations(&root)?;
        info!(
            "Found {} existing generation(s) of {:?} in {:?}",
            prior_generations.len(),
            base_name,
            root
        );

        let rotation = RotationPlanner::builder()
            .root(&root)
            .namer(&namer)
            .retention_count(self.config.retention_count())
            .build()
            .plan();
        rotation.execute(dry_run)?;
        self.advance(RunState::Rotated);

        let request = BackupInvoker::builder()
            .source(&source)
            .root(&root)
            .namer(&namer)
            .synchronizer(self.synchronizer)
            .build()
            .invoke(dry_run)?;
        self.advance(RunState::Synced);

        let elapsed = started.elapsed();
        if !dry_run {
            info!("Time needed: {:?}", elapsed);
        }
        self.advance(RunState::Done);

        Ok(RunReport {
            state: self.state(),
            prior_generations,
            rotation,
            request,
            elapsed,
        })
    }
}
