use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::consts::VOLUME_EXTENSIONS;
use crate::error::{MovieError, Result};

/// Whether `path` carries one of the recognized volume extensions
/// (case-insensitive).
pub fn is_volume_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            VOLUME_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Expand the command-line inputs into a list of volume files.
///
/// Files are taken as given; directories contribute their volume files
/// (not recursively), sorted by name. Duplicates are dropped. Two volumes
/// whose outputs would share a name (`tomo.mrc`, `tomo.st`) are rejected.
pub fn discover_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for path in paths {
        if path.is_dir() {
            let entries = fs::read_dir(path)
                .map_err(|e| MovieError::input(path, format!("cannot list directory: {e}")))?;
            let mut in_dir: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_volume_file(p))
                .collect();
            in_dir.sort();
            found.extend(in_dir);
        } else if path.is_file() {
            found.push(path.clone());
        } else {
            return Err(MovieError::input(path, "no such file or directory"));
        }
    }

    let mut seen = HashSet::new();
    found.retain(|p| seen.insert(p.clone()));

    if found.is_empty() {
        return Err(MovieError::Config(format!(
            "no input volumes found (looked for .{})",
            VOLUME_EXTENSIONS.join(", .")
        )));
    }
    check_output_names(&found)?;
    Ok(found)
}

/// Fail if two inputs would write to the same `{basename}.avi` /
/// `{basename}_slices`.
pub fn check_output_names(inputs: &[PathBuf]) -> Result<()> {
    let mut owners: HashMap<String, &Path> = HashMap::new();
    for input in inputs {
        if let Some(first) = owners.insert(output_basename(input), input) {
            return Err(MovieError::Config(format!(
                "{} and {} would both write outputs named '{}'",
                first.display(),
                input.display(),
                output_basename(input)
            )));
        }
    }
    Ok(())
}

/// File stem used to name the outputs of `input`.
pub fn output_basename(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "volume".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_match_ignores_case() {
        assert!(is_volume_file(Path::new("a/tomo.MRC")));
        assert!(is_volume_file(Path::new("tilt.st")));
        assert!(is_volume_file(Path::new("x.Rec")));
        assert!(!is_volume_file(Path::new("notes.txt")));
        assert!(!is_volume_file(Path::new("mrc")));
    }

    #[test]
    fn test_output_name_collision_is_rejected() {
        let inputs = [PathBuf::from("a/tomo.mrc"), PathBuf::from("b/tomo.st")];
        let err = check_output_names(&inputs).unwrap_err();
        assert!(matches!(err, MovieError::Config(ref m) if m.contains("'tomo'")));

        let distinct = [PathBuf::from("a/tomo.mrc"), PathBuf::from("a/tilt.st")];
        assert!(check_output_names(&distinct).is_ok());
    }

    #[test]
    fn test_output_basename() {
        assert_eq!(output_basename(Path::new("/data/tomo_01.rec")), "tomo_01");
    }
}
