//! File-name helpers and plain-text value files.

use crate::error::{GdscError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, is_separator};
use tracing::{debug, warn};

/// Byte offset of the dot that starts the extension of the final path component.
///
/// A path ending in a separator has no final file name and so no extension.
/// Leading dots of hidden files (`.config`) do not start an extension.
fn extension_dot(path: &str) -> Option<usize> {
    if path.ends_with(is_separator) {
        return None;
    }
    let name_start = path.rfind(is_separator).map_or(0, |i| i + 1);
    let name = &path[name_start..];
    if name == ".." {
        return None;
    }
    match name.rfind('.') {
        Some(0) | None => None,
        Some(dot) => Some(name_start + dot),
    }
}

/// Extension of the final path component without the dot, or `""` when absent.
pub fn get_extension(path: &str) -> &str {
    extension_dot(path).map_or("", |dot| &path[dot + 1..])
}

pub fn remove_extension(path: &str) -> String {
    match extension_dot(path) {
        Some(dot) => path[..dot].to_string(),
        None => path.to_string(),
    }
}

/// Replace (or add) the extension; `extension` may include the leading dot.
pub fn replace_extension(path: &str, extension: &str) -> String {
    let base = remove_extension(path);
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        base
    } else {
        format!("{}.{}", base, extension)
    }
}

/// Append `extension` unless the path already ends with it (case-insensitive).
pub fn add_extension(path: &str, extension: &str) -> String {
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() || get_extension(path).eq_ignore_ascii_case(extension) {
        return path.to_string();
    }
    format!("{}.{}", path, extension)
}

/// Write one value per line.
pub fn save_values(path: impl AsRef<Path>, values: &[f64]) -> Result<()> {
    let path = path.as_ref();
    write_values(path, values).map_err(|e| {
        warn!("Failed to save {} values to {}: {}", values.len(), path.display(), e);
        GdscError::from(e).with_context(format!("writing {}", path.display()))
    })?;
    debug!("Saved {} values to {}", values.len(), path.display());
    Ok(())
}

fn write_values(path: &Path, values: &[f64]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for v in values {
        writeln!(writer, "{}", v)?;
    }
    writer.flush()
}

/// Read one value per line. Blank lines are skipped; anything else that does not
/// parse as a number is an error naming the line.
pub fn read_values(path: impl AsRef<Path>) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        warn!("Failed to open {}: {}", path.display(), e);
        GdscError::from(e).with_context(format!("reading {}", path.display()))
    })?;

    let mut values = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let value = text.parse::<f64>().map_err(|e| {
            warn!("{}:{}: cannot parse '{}'", path.display(), index + 1, text);
            GdscError::invalid_argument(format!(
                "{}:{}: cannot parse '{}': {}",
                path.display(),
                index + 1,
                text,
                e
            ))
        })?;
        values.push(value);
    }
    Ok(values)
}
