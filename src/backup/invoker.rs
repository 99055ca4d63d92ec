//! Builds and runs the sync for a fresh generation 1.
//!
//! Rotation has emptied slot 1 by the time this runs. Generation 2, when it
//! exists, is the previous snapshot and is handed to the sync tool as the
//! hard-link reference so unchanged files are linked instead of copied.

use bon::Builder;
use function_name::named;
use std::path::Path;
use tracing::info;

use crate::backup::function_path;
use crate::backup::generation::{Generation, GenerationNamer};
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithDebugObjectAndFnName;
use crate::backup::sync::{SyncRequest, Synchronizer};
use crate::backup::validate::with_trailing_separator;

#[derive(Builder)]
pub struct BackupInvoker<'a, S: Synchronizer> {
    source: &'a Path,
    root: &'a Path,
    namer: &'a GenerationNamer,
    synchronizer: &'a S,
}

impl<S: Synchronizer> BackupInvoker<'_, S> {
    pub fn request(&self) -> SyncRequest {
        let link_path = self.namer.path(self.root, Generation::LINK_REFERENCE);
        let link_reference = link_path.is_dir().then(|| with_trailing_separator(&link_path));

        SyncRequest::builder()
            .source(with_trailing_separator(self.source))
            .target(self.namer.path(self.root, Generation::NEWEST))
            .maybe_link_reference(link_reference)
            .build()
    }

    /// Runs the sync, or in a dry run only reports what would be run.
    #[named]
    pub fn invoke(&self, dry_run: bool) -> Result<SyncRequest> {
        let request = self.request();
        let prefix = if dry_run { "Would " } else { "" };

        info!(
            source = %request.source().to_string_lossy(),
            target = %request.target().display(),
            "{prefix}Execute sync: {}",
            self.synchronizer.command_line(&request)
        );
        if request.link_reference().is_none() {
            info!("{}", missing_link_reference_note(dry_run));
        }

        if !dry_run {
            self.synchronizer
                .sync(&request)
                .with_debug_object_and_fn_name(request.clone(), function_path!())?;
        }

        Ok(request)
    }
}

/// A dry run looks at the unrotated root, where generation 1 has not yet
/// been shifted into slot 2.
fn missing_link_reference_note(dry_run: bool) -> &'static str {
    if dry_run {
        "Generation 2 absent before rotation, link reference omitted from the preview"
    } else {
        "No previous generation to link against, performing a full copy"
    }
}
