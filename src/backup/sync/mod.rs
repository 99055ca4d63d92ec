//! Seam between the rotation engine and the tool that actually copies bytes.
//!
//! The engine only ever asks for "make `target` a mirror of `source`,
//! hard-linking unchanged files from `link_reference` when given". How that
//! happens is up to the [`Synchronizer`] implementation.

pub mod recording;
pub mod rsync;

use bon::Builder;
use getset::Getters;
use itertools::Itertools;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use crate::backup::result_error::result::Result;

/// Flags passed on every invocation: archive mode, verbose output, ignore
/// symlinks pointing outside the tree, delete files gone from the source.
pub const BASE_ARGS: [&str; 4] = ["--archive", "--verbose", "--safe-links", "--delete"];

pub const LINK_DEST_FLAG: &str = "--link-dest=";

#[derive(Clone, Debug, PartialEq, Eq, Builder, Getters)]
#[getset(get = "pub")]
pub struct SyncRequest {
    /// Source directory with a trailing separator
    #[builder(into)]
    source: OsString,
    /// Generation 1 directory, created by the sync tool
    #[builder(into)]
    target: PathBuf,
    /// Generation 2 directory with a trailing separator, when it exists
    #[builder(into)]
    link_reference: Option<OsString>,
}

impl SyncRequest {
    /// Argument list for the sync tool, program name excluded.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = BASE_ARGS.iter().map(OsString::from).collect();
        if let Some(link) = &self.link_reference {
            let mut flag = OsString::from(LINK_DEST_FLAG);
            flag.push(link);
            args.push(flag);
        }
        args.push(self.source.clone());
        args.push(self.target.clone().into_os_string());
        args
    }
}

pub trait Synchronizer {
    /// Runs the synchronization described by `request` to completion.
    fn sync(&self, request: &SyncRequest) -> Result<()>;

    /// Printable command line for `request`, used for logging.
    fn command_line(&self, request: &SyncRequest) -> String;
}

/// Renders a program and its arguments the way a user would type them.
pub fn render_command<P: AsRef<OsStr>, A: AsRef<OsStr>>(program: P, args: &[A]) -> String {
    std::iter::once(program.as_ref())
        .chain(args.iter().map(AsRef::as_ref))
        .map(quote_arg)
        .join(" ")
}

fn quote_arg(arg: &OsStr) -> String {
    let arg = arg.to_string_lossy();
    if arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'') {
        format!("{arg:?}")
    } else {
        arg.into_owned()
    }
}
