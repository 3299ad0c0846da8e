//! Error kinds surfaced by the digest engines and repository queries.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigestError {
    /// Repository could not be opened at the given path.
    #[error("cannot open repository `{path}`: {source}")]
    BadRepo {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    /// Input hash is not 40 hexadecimal characters.
    #[error("bad commit hash `{0}`: expected 40 hexadecimal characters")]
    BadHash(String),

    /// Hash is well-formed but the object is absent or not a commit.
    #[error("bad commit `{commit}`: {source}")]
    BadCommit {
        commit: String,
        #[source]
        source: git2::Error,
    },

    /// An object (tree, blob, tag) expected to be present is missing.
    #[error("object not found: {0}")]
    ObjectNotFound(#[source] git2::Error),

    /// `HEAD` is detached where a branch name was required.
    #[error("cannot get branch name: HEAD refers to a revision that is not associated with a branch name")]
    NotABranch,

    /// The configured base path resolves to a blob entry in the commit tree.
    #[error("bad base path `{0}`: entry is not a directory or submodule")]
    BadBasePath(String),

    /// A glob pattern was rejected by the matching library.
    #[error("invalid glob pattern `{pattern}`: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Filesystem access failed on a path that must exist.
    #[error("i/o error on `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The host `git` binary exited with a failure.
    #[error("git command `{command}` failed: {message}")]
    GitCommand { command: String, message: String },

    /// Patch collaborator failure, with the commit range it was asked for.
    #[error("error creating patch between `{from_commit}` and `{to_commit}` commits: {source}")]
    Patch {
        from_commit: String,
        to_commit: String,
        #[source]
        source: Box<DigestError>,
    },

    /// Archive collaborator failure, with the commit it was asked for.
    #[error("error creating archive for commit `{commit}`: {source}")]
    Archive {
        commit: String,
        #[source]
        source: Box<DigestError>,
    },

    /// Commit-message search pattern did not compile.
    #[error("bad message regex `{pattern}`: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Residual libgit2 failure that maps to no more specific kind.
    #[error(transparent)]
    Git(#[from] git2::Error),
}

impl DigestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        DigestError::Io { path: path.into(), source }
    }

    pub(crate) fn glob(pattern: impl Into<String>, source: globset::Error) -> Self {
        DigestError::Glob { pattern: pattern.into(), source }
    }
}

/// Maps "object is missing" onto [`DigestError::ObjectNotFound`] and leaves
/// every other libgit2 failure as a passthrough.
pub(crate) fn object_lookup_error(err: git2::Error) -> DigestError {
    if err.code() == git2::ErrorCode::NotFound {
        DigestError::ObjectNotFound(err)
    } else {
        DigestError::Git(err)
    }
}
