//! ToolContext - execution context for tools
//!
//! Holds the sandbox root and implements the containment check every tool
//! goes through before touching the filesystem.

use std::path::{Component, Path, PathBuf};
use tracing::debug;

use super::ToolError;

/// Execution context for tools - scoped to a single sandbox root
///
/// The root is canonicalized once, when the context is built, and never
/// changes afterwards. Every path a tool touches is resolved against it with
/// [`ToolContext::resolve`].
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Canonical sandbox root - all file ops constrained here
    root: PathBuf,
}

impl ToolContext {
    /// Create a new tool context rooted at `root`
    ///
    /// Fails if the root does not exist or is not a directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, ToolError> {
        let root = root.as_ref();
        debug!(?root, "ToolContext::new: called");

        if root.as_os_str().is_empty() {
            return Err(ToolError::InvalidArgument("sandbox root must not be empty".to_string()));
        }

        let canonical = root.canonicalize().map_err(|_| ToolError::NotFound {
            what: "Sandbox root",
            path: root.to_path_buf(),
        })?;

        if !canonical.is_dir() {
            debug!(?canonical, "ToolContext::new: root is not a directory");
            return Err(ToolError::WrongKind {
                path: root.to_path_buf(),
                reason: "is not a directory".to_string(),
            });
        }

        debug!(?canonical, "ToolContext::new: root resolved");
        Ok(Self { root: canonical })
    }

    /// The canonical sandbox root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `relative` against the root, rejecting anything that escapes it
    ///
    /// `action` names the operation for the error message ("read", "list", ...).
    /// An empty path or `.` resolves to the root itself. Symlinks are followed
    /// for every component that exists, so a link pointing outside the root is
    /// rejected just like a `..` that climbs out of it.
    pub fn resolve(&self, relative: impl AsRef<Path>, action: &'static str) -> Result<PathBuf, ToolError> {
        let relative = relative.as_ref();
        debug!(?relative, %action, "ToolContext::resolve: called");

        let joined = self.root.join(relative);
        let resolved = canonicalize_lenient(&joined);

        match resolved {
            Some(path) if path.starts_with(&self.root) => {
                debug!(?path, "ToolContext::resolve: path is within sandbox");
                Ok(path)
            }
            other => {
                debug!(?other, "ToolContext::resolve: sandbox violation detected");
                Err(ToolError::SandboxViolation {
                    action,
                    path: relative.to_path_buf(),
                })
            }
        }
    }
}

/// Canonicalize a path that may not fully exist yet
///
/// Walks the path one component at a time. Whenever the path built so far
/// exists it is replaced by its canonical form, so a symlink is followed
/// wherever it appears, including after a `..` that backed out of a missing
/// directory. Components that do not exist are kept lexically. A path that
/// exists but cannot be canonicalized (a dangling link) yields `None`.
fn canonicalize_lenient(path: &Path) -> Option<PathBuf> {
    let mut resolved = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(part) => {
                resolved.push(part);
                if resolved.symlink_metadata().is_ok() {
                    resolved = resolved.canonicalize().ok()?;
                }
            }
        }
    }

    Some(resolved)
}
