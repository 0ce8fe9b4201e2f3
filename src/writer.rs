//! Target directory population.
//! Prepares a fresh target, copies passthrough files and writes rendered
//! templates under their prefix-stripped names.

use crate::error::{Error, Result};
use crate::scanner::{Prefix, SourceEntry};
use log::debug;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Replaces `target` with an empty directory, creating parents as needed.
///
/// Destructive: anything previously at `target` is removed.
pub fn prepare<P: AsRef<Path>>(target: P) -> Result<()> {
    let target = target.as_ref();
    if target.exists() {
        debug!("Removing previous target {}", target.display());
        fs::remove_dir_all(target)?;
    }
    fs::create_dir_all(target)?;
    Ok(())
}

/// Copies every passthrough entry into `target`, skipping paths in `ignore`.
///
/// Files keep their relative path and permissions; an existing file at the
/// destination is overwritten. Returns the number of files copied.
pub fn copy_passthrough<'a, I, P>(entries: I, target: P, ignore: &HashSet<PathBuf>) -> Result<usize>
where
    I: IntoIterator<Item = &'a SourceEntry>,
    P: AsRef<Path>,
{
    let target = target.as_ref();
    let mut copied = 0;

    for entry in entries.into_iter().filter(|entry| !entry.is_template()) {
        if ignore.contains(&entry.path) {
            debug!("Skipping ignored file {}", entry.path.display());
            continue;
        }

        let dest_path = target.join(&entry.relative_path);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!("Copying file: {}", dest_path.display());
        // fs::copy carries the permission bits over.
        fs::copy(&entry.path, &dest_path)?;
        copied += 1;
    }

    Ok(copied)
}

/// Computes where a template entry is written: its relative path with the
/// prefix removed from the base name only.
pub fn output_path<P: AsRef<Path>>(entry: &SourceEntry, target: P, prefix: &Prefix) -> PathBuf {
    let relative = match entry.relative_path.file_name().and_then(|name| name.to_str()) {
        Some(file_name) => entry.relative_path.with_file_name(prefix.strip(file_name)),
        None => entry.relative_path.clone(),
    };
    target.as_ref().join(relative)
}

/// Writes rendered template text into `target`.
///
/// # Errors
/// * `Error::DestinationExistsError` if a file already exists at the output path
pub fn write_template<P: AsRef<Path>>(
    entry: &SourceEntry,
    rendered: &str,
    target: P,
    prefix: &Prefix,
) -> Result<PathBuf> {
    let dest_path = output_path(entry, target, prefix);
    if dest_path.exists() {
        return Err(Error::DestinationExistsError {
            destination: dest_path.display().to_string(),
            template: entry.path.display().to_string(),
        });
    }

    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent)?;
    }
    debug!("Writing file: {}", dest_path.display());
    fs::write(&dest_path, rendered)?;

    let permissions = fs::metadata(&entry.path)?.permissions();
    fs::set_permissions(&dest_path, permissions)?;

    Ok(dest_path)
}
