use std::env;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{MtuError, MtuResult};

pub fn find_in_path(tool: &str, path_var: &str) -> Option<PathBuf> {
    env::split_paths(path_var)
        .map(|dir| dir.join(tool))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Fails with `ToolMissing` naming every tool not found on $PATH
pub fn check_requirements(tools: &[&str]) -> MtuResult<()> {
    let path_var = env::var("PATH").unwrap_or_default();
    let missing: Vec<&str> = tools.iter()
        .copied()
        .filter(|tool| match find_in_path(tool, &path_var) {
            Some(found) => {
                debug!("Found {tool} at {}", found.display());
                false
            },
            None => true,
        })
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(MtuError::ToolMissing(missing.join(", ")))
    }
}
