#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;
use itertools::Itertools;

/// A glob utility function to find paths to files with certain extension
///
/// * `extension`: the file extension to find paths for
/// * `search_depth`: how many folders deep to search for
/// * `root_dir`: the root directory where search starts
///
/// Results are sorted lexicographically so callers see a reproducible order.
pub fn find_files(extension: &str, search_depth: u8, root_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pattern = root_dir.to_path_buf();

    for _ in 0..search_depth {
        pattern.push("**");
    }

    pattern.push(format!("*.{extension}"));
    let pattern = pattern
        .to_str()
        .context("Could not convert root_dir to string")?
        .to_string();

    Ok(glob(&pattern)
        .context("Could not create glob")?
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .sorted()
        .collect())
}

/// Collapses runs of whitespace, drops trailing semicolons and lowercases the
/// text, so that cosmetic differences between two queries disappear. Quoted
/// literals and identifiers (`'...'`, `"..."`) are kept exactly as written.
pub fn normalize_sql(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut quote: Option<char> = None;
    let mut gap = false;

    for c in sql.chars() {
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c.is_whitespace() => gap = true,
            None => {
                if gap && !out.is_empty() {
                    out.push(' ');
                }
                gap = false;
                if c == '\'' || c == '"' {
                    quote = Some(c);
                }
                out.extend(c.to_lowercase());
            }
        }
    }

    out.trim_end_matches(|c: char| c == ';' || c.is_whitespace())
        .to_string()
}

/// Returns the file name of `path` without its extension, falling back to the
/// full display form when the path has no usable stem.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
