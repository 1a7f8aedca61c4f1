use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("no git repo found above `{0}`")]
    NotFound(PathBuf),

    #[error("could not read the current directory: `{0}`")]
    IOError(#[from] std::io::Error),
}

/// Returns the root of the git repository containing the current directory.
pub fn lookup_project_repo() -> Result<PathBuf, RepoError> {
    lookup_project_repo_from(&std::env::current_dir()?)
}

/// Returns the nearest ancestor of `dir` (itself included) holding a `.git` entry.
pub fn lookup_project_repo_from(dir: &Path) -> Result<PathBuf, RepoError> {
    dir.ancestors()
        .find(|candidate| candidate.join(".git").exists())
        .map(Path::to_path_buf)
        .ok_or_else(|| RepoError::NotFound(dir.to_path_buf()))
}
