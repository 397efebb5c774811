use std::path::{Path, PathBuf};

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Resolves a path found in a configuration file against the directory of that file.
pub fn resolve_path(config_path: Option<&str>, file_path: &str) -> String {
    let p = Path::new(file_path);
    match config_path.and_then(|c| Path::new(c).parent()) {
        Some(root) if p.is_relative() => {
            let full: PathBuf = root.join(p);
            full.as_path().display().to_string()
        }
        _ => file_path.to_string(),
    }
}
