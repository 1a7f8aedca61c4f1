#[cfg(target_family = "unix")]
use nix::unistd::{access, AccessFlags};
use std::path::{Path, PathBuf};

use super::BouncerError;

/// Resolves the bouncer under test inside the project repository. It must be an
/// executable file.
pub fn locate_bouncer_binary(
    project_repo: &Path,
    bouncer_under_test: &Path,
) -> Result<PathBuf, BouncerError> {
    let binary = project_repo.join(bouncer_under_test);
    if !binary.is_file() || !is_executable(&binary) {
        return Err(BouncerError::BinaryNotFound(binary));
    }
    Ok(binary)
}

#[cfg(target_family = "unix")]
fn is_executable(path: &Path) -> bool {
    access(path, AccessFlags::X_OK).is_ok()
}

#[cfg(not(target_family = "unix"))]
fn is_executable(_path: &Path) -> bool {
    true
}
