//! Path validation for file operations
//!
//! Data files, reports and uploads must stay inside the configured
//! VibrationVIEW folders. Paths are normalized lexically; symlinks are not
//! followed.

use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// Folders a request may read from or write to
#[derive(Debug, Clone)]
pub struct PathPolicy {
    authorized: Vec<PathBuf>,
    report_folder: PathBuf,
}

impl PathPolicy {
    /// The report folder is always authorized; extra folders are added in order.
    pub fn new(report_folder: impl Into<PathBuf>, extra: impl IntoIterator<Item = PathBuf>) -> Self {
        let report_folder = report_folder.into();
        let mut authorized = vec![report_folder.clone()];
        authorized.extend(extra);
        Self {
            authorized,
            report_folder,
        }
    }

    pub fn authorized_directories(&self) -> &[PathBuf] {
        &self.authorized
    }

    /// True when `path` normalizes to a location inside an authorized folder
    pub fn is_within_authorized_directories(&self, path: &Path) -> bool {
        let Ok(normalized) = normalize_path(path) else {
            return false;
        };
        self.authorized.iter().any(|dir| {
            normalize_path(dir)
                .map(|dir| normalized.starts_with(dir))
                .unwrap_or(false)
        })
    }

    /// Validate a path supplied by a client; returns the normalized path.
    pub fn validate_file_path(&self, file_path: &str, operation: &str) -> Result<PathBuf> {
        if file_path.is_empty() {
            return Err(Error::PathValidation(format!(
                "Empty file path not allowed for {}",
                operation
            )));
        }

        if has_parent_segment(file_path) || has_injected_colon(file_path) {
            return Err(Error::PathValidation(format!(
                "Path traversal detected in path: {}",
                file_path
            )));
        }

        let path = Path::new(file_path);
        if !self.is_within_authorized_directories(path) {
            let dirs: Vec<String> = self
                .authorized
                .iter()
                .map(|d| d.display().to_string())
                .collect();
            return Err(Error::PathValidation(format!(
                "File path '{}' is not within authorized directories for {}. Authorized directories: {}",
                file_path,
                operation,
                dirs.join(", ")
            )));
        }

        normalize_path(path)
    }

    /// Validate a report output name.
    ///
    /// A bare filename is placed in the report folder; anything with a
    /// directory part must already be inside an authorized folder.
    pub fn validate_output_path(&self, output_name: &str, operation: &str) -> Result<PathBuf> {
        if output_name.is_empty() {
            return Err(Error::PathValidation(format!(
                "Empty output name not allowed for {}",
                operation
            )));
        }

        let is_bare = !output_name.contains(['/', '\\']);
        if is_bare {
            if output_name == ".." || has_injected_colon(output_name) {
                return Err(Error::PathValidation(format!(
                    "Invalid output name: {}",
                    output_name
                )));
            }
            return normalize_path(&self.report_folder.join(output_name));
        }

        self.validate_file_path(output_name, operation)
    }
}

/// Join `parts` onto `base`, refusing results that escape it.
pub fn secure_path_join(base: &Path, parts: &[&str]) -> Result<PathBuf> {
    let base = normalize_path(base)?;
    let mut joined = base.clone();
    for part in parts {
        if has_parent_segment(part) {
            return Err(Error::PathValidation(format!(
                "Path '{}' would escape base directory '{}'",
                part,
                base.display()
            )));
        }
        joined.push(part);
    }

    let joined = normalize_path(&joined)?;
    if !joined.starts_with(&base) {
        return Err(Error::PathValidation(format!(
            "Path '{}' would escape base directory '{}'",
            joined.display(),
            base.display()
        )));
    }
    Ok(joined)
}

/// Absolute, lexically normalized form of `path` (`.` removed, `..` rejected)
pub fn normalize_path(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::PathValidation(format!(
                    "Path traversal detected in path: {}",
                    path.display()
                )))
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

fn has_parent_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| segment == "..")
}

/// Colons are only legal as a drive letter separator (`C:`)
fn has_injected_colon(path: &str) -> bool {
    let positions: Vec<usize> = path.match_indices(':').map(|(i, _)| i).collect();
    match positions.as_slice() {
        [] => false,
        [1] => false,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn policy(dir: &TempDir) -> PathPolicy {
        PathPolicy::new(dir.path().join("Reports"), [dir.path().join("Profiles")])
    }

    #[test]
    fn accepts_paths_inside_authorized_folders() {
        let dir = TempDir::new().unwrap();
        let policy = policy(&dir);
        let file = dir.path().join("Profiles").join("sine.vsp");

        let validated = policy
            .validate_file_path(file.to_str().unwrap(), "test")
            .unwrap();
        assert_eq!(validated, file);
    }

    #[test]
    fn rejects_paths_outside_authorized_folders() {
        let dir = TempDir::new().unwrap();
        let policy = policy(&dir);
        let outside = dir.path().join("Elsewhere").join("data.vrd");

        let err = policy
            .validate_file_path(outside.to_str().unwrap(), "data file retrieval")
            .unwrap_err();
        assert!(err.to_string().contains("not within authorized directories for data file retrieval"));
    }

    #[test]
    fn rejects_traversal_and_colons() {
        let dir = TempDir::new().unwrap();
        let policy = policy(&dir);
        let sneaky = format!("{}/Reports/../../etc/passwd", dir.path().display());

        assert!(policy.validate_file_path(&sneaky, "test").is_err());
        assert!(policy.validate_file_path("C:\\Reports\\..\\x.vrd", "test").is_err());
        assert!(policy.validate_file_path("report:stream", "test").is_err());
        assert!(policy.validate_file_path("", "test").is_err());
    }

    #[test]
    fn bare_output_name_lands_in_report_folder() {
        let dir = TempDir::new().unwrap();
        let policy = policy(&dir);

        let out = policy.validate_output_path("report.pdf", "report generation").unwrap();
        assert_eq!(out, dir.path().join("Reports").join("report.pdf"));
    }

    #[test]
    fn output_path_with_directory_is_validated() {
        let dir = TempDir::new().unwrap();
        let policy = policy(&dir);

        let inside = dir.path().join("Reports").join("sub").join("r.rtf");
        assert!(policy.validate_output_path(inside.to_str().unwrap(), "x").is_ok());
        assert!(policy.validate_output_path("/somewhere/else/r.rtf", "x").is_err());
    }

    #[test]
    fn secure_join_refuses_escape() {
        let dir = TempDir::new().unwrap();
        let joined = secure_path_join(dir.path(), &["Uploads", "a.vsp"]).unwrap();
        assert!(joined.starts_with(dir.path()));
        assert!(secure_path_join(dir.path(), &["..", "a.vsp"]).is_err());
    }
}
