//! Artifact assembly and the output sink.
//!
//! Results are rendered into fenced blocks and concatenated in enumeration
//! order. The artifact is written once: staged next to the target, then
//! renamed over it. Until [`OutputSink::commit`] succeeds the target is
//! never touched.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use docbundle_shared::{DocBundleError, ExtractionResult, Result, UnitStatus};

/// Render one result as `# <identity>` followed by a fenced block.
///
/// Skipped results render nothing.
pub fn render_block(result: &ExtractionResult) -> Option<String> {
    if result.status == UnitStatus::Skipped {
        return None;
    }

    let body = result.rendered_block.trim_end_matches(['\n', '\r']);
    let fence = "`".repeat(longest_backtick_run(body).max(2) + 1);

    Some(format!("# {}\n{fence}\n{body}\n{fence}\n\n", result.identity))
}

/// Concatenate all rendered blocks in the order given.
pub fn render_artifact(results: &[ExtractionResult]) -> String {
    results.iter().filter_map(render_block).collect()
}

fn longest_backtick_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

// ---------------------------------------------------------------------------
// OutputSink
// ---------------------------------------------------------------------------

/// Staged, all-or-nothing writer for the final artifact.
///
/// Opening the sink creates missing parent directories and the staging file,
/// so an unwritable destination fails the run before any work starts.
/// Dropping an uncommitted sink removes the staging file.
#[derive(Debug)]
pub struct OutputSink {
    target: PathBuf,
    staging: PathBuf,
    file: Option<File>,
}

impl OutputSink {
    #[instrument(skip_all, fields(target = %target.display()))]
    pub fn open(target: &Path) -> Result<Self> {
        let absolute = std::path::absolute(target).map_err(|e| DocBundleError::io(target, e))?;
        let file_name = absolute
            .file_name()
            .ok_or_else(|| {
                DocBundleError::validation(format!("'{}' is not a file path", target.display()))
            })?
            .to_os_string();

        let parent = absolute.parent().unwrap_or_else(|| Path::new("/"));
        std::fs::create_dir_all(parent).map_err(|e| DocBundleError::io(parent, e))?;
        let parent = parent.canonicalize().map_err(|e| DocBundleError::io(parent, e))?;

        let target = parent.join(&file_name);
        if target.is_dir() {
            return Err(DocBundleError::validation(format!(
                "output '{}' is a directory",
                target.display()
            )));
        }

        let mut staging_name = std::ffi::OsString::from(".");
        staging_name.push(&file_name);
        staging_name.push(".tmp");
        let staging = parent.join(staging_name);

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&staging)
            .map_err(|e| DocBundleError::io(&staging, e))?;

        debug!(staging = %staging.display(), "output sink opened");

        Ok(Self {
            target,
            staging,
            file: Some(file),
        })
    }

    /// Resolved absolute path of the final artifact.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Path of the staging file the artifact is written to first.
    pub fn staging(&self) -> &Path {
        &self.staging
    }

    /// Write the whole artifact and move it into place. Returns bytes written.
    pub fn commit(mut self, artifact: &str) -> Result<usize> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| DocBundleError::validation("output sink already committed"))?;

        file.write_all(artifact.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| DocBundleError::io(&self.staging, e))?;
        drop(file);

        std::fs::rename(&self.staging, &self.target)
            .map_err(|e| DocBundleError::io(&self.target, e))?;

        info!(
            path = %self.target.display(),
            bytes = artifact.len(),
            "artifact written"
        );

        Ok(artifact.len())
    }
}

impl Drop for OutputSink {
    fn drop(&mut self) {
        // Still holding the handle means commit never ran or failed early.
        if self.file.take().is_some() || self.staging.exists() {
            if let Err(e) = std::fs::remove_file(&self.staging) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.staging.display(), error = %e, "could not remove staging file");
                }
            }
        }
    }
}
