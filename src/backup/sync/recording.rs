use std::cell::RefCell;

use crate::backup::result_error::error::{Error, SyncFailure};
use crate::backup::result_error::result::Result;
use crate::backup::sync::{render_command, SyncRequest, Synchronizer};

/// Synchronizer that only remembers what it was asked to do.
///
/// With `materialize` set it creates the target directory, standing in for
/// the snapshot a real sync would produce. With `fail` set every call returns
/// a launch failure.
#[derive(Debug, Default)]
pub struct RecordingSynchronizer {
    requests: RefCell<Vec<SyncRequest>>,
    materialize: bool,
    fail: bool,
}

impl RecordingSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn materializing() -> Self {
        Self {
            materialize: true,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<SyncRequest> {
        self.requests.borrow().clone()
    }
}

impl Synchronizer for RecordingSynchronizer {
    fn sync(&self, request: &SyncRequest) -> Result<()> {
        self.requests.borrow_mut().push(request.clone());
        if self.fail {
            return Err(Error::SyncExecution {
                command: self.command_line(request),
                failure: SyncFailure::Launch(std::io::Error::other("simulated failure")),
            });
        }
        if self.materialize {
            std::fs::create_dir_all(request.target())?;
        }
        Ok(())
    }

    fn command_line(&self, request: &SyncRequest) -> String {
        render_command("recording-sync", &request.args())
    }
}
