use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::backup::result_error::error::{Error, SyncFailure};
use crate::backup::result_error::result::Result;
use crate::backup::sync::{render_command, SyncRequest, Synchronizer};

pub const DEFAULT_SYNC_BINARY: &str = "rsync";

/// Runs the real `rsync` as a child process, sharing this process's stdout
/// and stderr so its output reaches the operator unmodified.
#[derive(Clone, Debug)]
pub struct RsyncSynchronizer {
    program: PathBuf,
}

impl RsyncSynchronizer {
    /// Resolves the sync binary, either the configured one or `rsync` from
    /// `PATH`.
    pub fn locate(binary: Option<&Path>) -> Result<Self> {
        let wanted = binary.unwrap_or(Path::new(DEFAULT_SYNC_BINARY));
        let program = which::which(wanted).map_err(|source| Error::ToolUnavailable {
            tool: wanted.display().to_string(),
            source,
        })?;
        debug!("Using sync binary {:?}", program);
        Ok(Self { program })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Synchronizer for RsyncSynchronizer {
    fn sync(&self, request: &SyncRequest) -> Result<()> {
        let status = Command::new(&self.program)
            .args(request.args())
            .status()
            .map_err(|e| Error::SyncExecution {
                command: self.command_line(request),
                failure: SyncFailure::Launch(e),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::SyncExecution {
                command: self.command_line(request),
                failure: SyncFailure::Exit(status),
            })
        }
    }

    fn command_line(&self, request: &SyncRequest) -> String {
        render_command(&self.program, &request.args())
    }
}
