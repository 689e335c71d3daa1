use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::prelude::*;

/// File name pattern of the BC Hydro consumption exports.
pub const FILE_PATTERN: &str = "bchydro.com-consumption-*.csv";

/// Resolve the CSV file to process.
///
/// An explicitly specified file must exist. Otherwise, the input directory must contain
/// exactly one export matching [`FILE_PATTERN`].
#[instrument(skip_all)]
pub fn find_csv_file(specified: Option<&Path>, input_dir: &Path) -> Result<PathBuf> {
    if let Some(path) = specified {
        ensure!(path.is_file(), "specified file `{}` does not exist", path.display());
        return Ok(path.to_path_buf());
    }

    let display_pattern = input_dir.join(FILE_PATTERN);
    let pattern =
        format!("{}/{FILE_PATTERN}", glob::Pattern::escape(&input_dir.to_string_lossy()));
    let mut candidates: Vec<PathBuf> = glob::glob(&pattern)
        .with_context(|| format!("invalid file pattern `{pattern}`"))?
        .filter_map(Result::ok)
        .collect();
    candidates.sort();
    debug!(n_candidates = candidates.len(), %pattern, "searched");

    match candidates.len() {
        0 => bail!(
            "no files found matching pattern `{}`: place your BC Hydro CSV file in `{}`, or specify a CSV file as a command-line argument",
            display_pattern.display(),
            input_dir.display(),
        ),
        1 => Ok(candidates.remove(0)),
        _ => bail!(
            "multiple files found matching pattern `{}`:\n{}\nPlease specify which file to process as a command-line argument",
            display_pattern.display(),
            candidates.iter().map(|path| format!("  - {}", path.display())).join("\n"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_single_candidate() -> Result {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("bchydro.com-consumption-0385-2026-02-07.csv");
        fs::write(&path, "")?;
        fs::write(directory.path().join("unrelated.csv"), "")?;
        assert_eq!(find_csv_file(None, directory.path())?, path);
        Ok(())
    }

    #[test]
    fn test_multiple_candidates() -> Result {
        let directory = tempfile::tempdir()?;
        for name in ["bchydro.com-consumption-a.csv", "bchydro.com-consumption-b.csv"] {
            fs::write(directory.path().join(name), "")?;
        }
        let message = find_csv_file(None, directory.path()).unwrap_err().to_string();
        assert!(message.contains("multiple files"), "{message}");
        assert!(message.contains("  - "), "{message}");
        assert!(message.contains("bchydro.com-consumption-a.csv"), "{message}");
        assert!(message.contains("bchydro.com-consumption-b.csv"), "{message}");
        Ok(())
    }

    #[test]
    fn test_no_candidates() -> Result {
        let directory = tempfile::tempdir()?;
        let message = find_csv_file(None, directory.path()).unwrap_err().to_string();
        assert!(message.contains("no files found"), "{message}");
        Ok(())
    }

    #[test]
    fn test_specified_file() -> Result {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("anything.csv");
        assert!(find_csv_file(Some(&path), directory.path()).is_err());
        fs::write(&path, "")?;
        assert_eq!(find_csv_file(Some(&path), directory.path())?, path);
        Ok(())
    }
}
