//! Output-folder staging: name and populate the working directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::TransformationError;
use crate::transformation::Transformation;

/// Create the working directory and copy the application tree into it.
///
/// Failures here are fatal and surface before any listener is notified.
pub(crate) fn stage(transformation: &Transformation) -> Result<PathBuf, TransformationError> {
    let application = transformation.application();
    let source = application.folder();
    if !source.is_dir() {
        return Err(TransformationError::Internal(format!(
            "application folder {} does not exist",
            source.display()
        )));
    }

    let parent = resolve_parent(transformation)?;
    let stamp = Local::now().format("%Y%m%d%H%M%S%3f");
    let target = parent.join(format!("{}-transformed-{}", application.name(), stamp));

    fs::create_dir_all(&target).map_err(|source| TransformationError::Staging {
        path: target.clone(),
        source,
    })?;
    copy_tree(source, &target).map_err(|source| TransformationError::Staging {
        path: target.clone(),
        source,
    })?;

    info!(from = %source.display(), to = %target.display(), "staged application copy");
    Ok(target)
}

/// The directory the working copy is created under: the configured output
/// folder, the application's parent, or the process working directory.
fn resolve_parent(transformation: &Transformation) -> Result<PathBuf, TransformationError> {
    if let Some(output) = transformation.configuration().output_folder.as_ref() {
        if !output.is_dir() {
            return Err(TransformationError::InvalidOutputFolder {
                path: output.clone(),
            });
        }
        return Ok(output.clone());
    }
    match transformation.application().folder().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
        _ => std::env::current_dir().map_err(|source| TransformationError::Staging {
            path: PathBuf::from("."),
            source,
        }),
    }
}

fn copy_tree(source: &Path, target: &Path) -> io::Result<()> {
    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(io::Error::from)?;
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let destination = target.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &destination)?;
        } else {
            debug!(path = %entry.path().display(), "skipping non-regular file during staging");
        }
    }
    Ok(())
}
