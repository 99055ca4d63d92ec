use crate::backup::result_error::{WithDebugObjectAndFnName, WithMsg};
use derive_more::Display;
use itertools::Itertools;
use std::fmt::Debug;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Filesystem mutation attempted during rotation
#[derive(Debug, Display)]
pub enum FsOperation {
    #[display("remove {}", _0.display())]
    Remove(PathBuf),
    #[display("rename {} to {}", from.display(), to.display())]
    Rename { from: PathBuf, to: PathBuf },
}

/// Why the sync tool did not complete successfully
#[derive(Debug, Display)]
pub enum SyncFailure {
    #[display("could not be launched: {_0}")]
    Launch(std::io::Error),
    #[display("exited with {_0}")]
    Exit(ExitStatus),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    ValidationError(#[from] validator::ValidationErrors),
    #[error(transparent)]
    SerdeYml(#[from] serde_yml::Error),
    #[error("{} does not exist or is not a directory", path.display())]
    NotFound { path: PathBuf },
    #[error("{} has no final component to name backups after", path.display())]
    MissingBaseName { path: PathBuf },
    #[error("Please install '{tool}': {source}")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: which::Error,
    },
    #[error("Failed to {op}: {source}")]
    FilesystemOperation {
        op: FsOperation,
        #[source]
        source: std::io::Error,
    },
    #[error("{command} {failure}")]
    SyncExecution {
        command: String,
        failure: SyncFailure,
    },
    #[error("missing required setting '{0}'")]
    MissingSetting(&'static str),
    #[error("backup root is locked by another run: {}", path.display())]
    RootLocked { path: PathBuf },
    #[error("{}:\n{}", msg, indent::indent_all_with("  ", error.to_string()))]
    WithMsg { msg: String, error: Box<Error> },
    #[error("{:?} {} failed:\n{}", obj_debug, fn_name, indent::indent_all_with("  ", error.to_string()))]
    WithDebugObjAndFnName {
        error: Box<Error>,
        obj_debug: Box<dyn Debug + Send>,
        fn_name: String,
    },
    #[error("{}", itertools::join(.0, "\n\n"))]
    LotsOfError(Vec<Error>),
}

impl<S: Into<String>, O: Debug + Send + 'static> WithDebugObjectAndFnName<S, O> for Error {
    fn with_debug_object_and_fn_name(self, obj: O, fn_name: S) -> Self {
        Error::WithDebugObjAndFnName {
            error: Box::new(self),
            obj_debug: Box::new(obj),
            fn_name: fn_name.into(),
        }
    }
}

impl<S: Into<String>> WithMsg<S> for Error {
    fn with_msg(self, msg: S) -> Self {
        Self::WithMsg {
            msg: msg.into(),
            error: Box::new(self),
        }
    }
}

impl Error {
    pub fn into_iter(self) -> Box<dyn Iterator<Item = Error>> {
        match self {
            Error::LotsOfError(v) => Box::new(v.into_iter().flat_map(Error::into_iter)),
            e => Box::new(std::iter::once(e)),
        }
    }

    pub fn chain(self, other: Error) -> Error {
        Error::LotsOfError(self.into_iter().chain(other.into_iter()).collect_vec())
    }

    /// Process exit code to report for this error.
    ///
    /// A sync tool that ran and failed hands its own code through, everything
    /// else maps to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::SyncExecution {
                failure: SyncFailure::Exit(status),
                ..
            } => status.code().unwrap_or(1),
            Error::WithMsg { error, .. } | Error::WithDebugObjAndFnName { error, .. } => {
                error.exit_code()
            }
            _ => 1,
        }
    }
}
