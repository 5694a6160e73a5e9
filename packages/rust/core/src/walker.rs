//! Local source enumeration: a sorted, pruned directory walk.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use docbundle_shared::{
    Admission, ContentUnit, DocBundleError, Result, ScopeFilter, SourceLocation, UnitKind,
};

/// Enumerates files under a root directory in a fixed order.
///
/// Entries are sorted by file name at every level, so two walks over an
/// unchanged tree yield the same sequence. [`iter`](Self::iter) can be called
/// any number of times; each call starts a fresh walk.
#[derive(Debug, Clone)]
pub struct LocalEnumerator {
    root: PathBuf,
    filter: ScopeFilter,
    excluded: Vec<PathBuf>,
}

impl LocalEnumerator {
    /// Resolve `root` and check it is a directory.
    pub fn new(root: &Path, filter: ScopeFilter) -> Result<Self> {
        let root = root.canonicalize().map_err(|e| {
            DocBundleError::invalid_source(format!("'{}' does not exist: {e}", root.display()))
        })?;
        if !root.is_dir() {
            return Err(DocBundleError::invalid_source(format!(
                "'{}' is not a directory",
                root.display()
            )));
        }

        Ok(Self {
            root,
            filter,
            excluded: Vec::new(),
        })
    }

    /// Never yield this exact path (e.g. the output artifact itself).
    pub fn exclude(mut self, path: impl Into<PathBuf>) -> Self {
        self.excluded.push(path.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily walk the tree, yielding every admitted file as a unit.
    ///
    /// Skipped directories are pruned without being descended. Entries that
    /// cannot be read are logged and left out.
    pub fn iter(&self) -> impl Iterator<Item = ContentUnit> + '_ {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_pruned(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(path = ?e.path(), error = %e, "cannot read entry, leaving it out");
                    None
                }
            })
            .filter(is_file)
            .filter(|entry| !self.excluded.iter().any(|p| p == entry.path()))
            .filter_map(|entry| self.unit_for(entry.path()))
    }

    fn is_pruned(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && self.filter.skips_dir(&entry.file_name().to_string_lossy())
    }

    fn unit_for(&self, path: &Path) -> Option<ContentUnit> {
        let relative = path.strip_prefix(&self.root).ok()?;

        let kind = match self.filter.admit_path(relative) {
            Admission::Skip => {
                debug!(path = %relative.display(), "skipped");
                return None;
            }
            Admission::Unsupported(ext) => UnitKind::Unsupported(ext),
            Admission::Proceed(kind) => kind,
        };

        Some(ContentUnit::new(
            identity_for(relative),
            kind,
            SourceLocation::Path(path.to_path_buf()),
        ))
    }
}

fn is_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}

/// Root-relative path with `/` separators on every platform.
fn identity_for(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn identities(enumerator: &LocalEnumerator) -> Vec<String> {
        enumerator.iter().map(|u| u.identity).collect()
    }

    #[test]
    fn sorted_recursive_walk() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.txt", "b");
        write(dir.path(), "a.txt", "a");
        write(dir.path(), "src/main.rs", "fn main() {}");
        write(dir.path(), "src/lib/mod.rs", "");

        let enumerator = LocalEnumerator::new(dir.path(), ScopeFilter::default()).unwrap();
        assert_eq!(
            identities(&enumerator),
            vec!["a.txt", "b.txt", "src/lib/mod.rs", "src/main.rs"]
        );
    }

    #[test]
    fn restartable_and_stable() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["z.md", "m.py", "a.toml"] {
            write(dir.path(), name, name);
        }
        let enumerator = LocalEnumerator::new(dir.path(), ScopeFilter::default()).unwrap();
        assert_eq!(identities(&enumerator), identities(&enumerator));
    }

    #[test]
    fn skip_rules_applied() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "node_modules/pkg/index.js", "module.exports = 1;");
        write(dir.path(), ".git/HEAD", "ref: refs/heads/main");
        write(dir.path(), "logo.png", "not really a png");
        write(dir.path(), "keep.js", "let x = 1;");

        let enumerator = LocalEnumerator::new(dir.path(), ScopeFilter::default()).unwrap();
        assert_eq!(identities(&enumerator), vec!["keep.js"]);
    }

    #[test]
    fn unsupported_files_are_enumerated() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "old.doc", "binary-ish");

        let enumerator = LocalEnumerator::new(dir.path(), ScopeFilter::default()).unwrap();
        let units: Vec<_> = enumerator.iter().collect();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].kind, UnitKind::Unsupported("doc".into()));
    }

    #[test]
    fn excluded_paths_left_out() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "a");
        write(dir.path(), "summary.md", "previous output");

        let root = dir.path().canonicalize().unwrap();
        let enumerator = LocalEnumerator::new(&root, ScopeFilter::default())
            .unwrap()
            .exclude(root.join("summary.md"));
        assert_eq!(identities(&enumerator), vec!["a.txt"]);
    }

    #[test]
    fn invalid_roots_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            LocalEnumerator::new(&missing, ScopeFilter::default()),
            Err(DocBundleError::InvalidSource { .. })
        ));

        write(dir.path(), "file.txt", "x");
        assert!(matches!(
            LocalEnumerator::new(&dir.path().join("file.txt"), ScopeFilter::default()),
            Err(DocBundleError::InvalidSource { .. })
        ));
    }
}
