use std::{
    error::Error,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;
use zip::ZipArchive;

use crate::construct::{LGPO_NAME, STEMCELL_AUTOMATION_NAME};

/// Finds the first directory under `roots` holding both upload archives.
pub(crate) fn locate_artifact_directory(
    roots: &[PathBuf],
    depth: usize,
) -> Result<PathBuf, Box<dyn Error>> {
    roots
        .iter()
        .find_map(|root| find_artifact_directory(root, depth))
        .ok_or_else(|| {
            format!(
                "Could not find {LGPO_NAME} and {STEMCELL_AUTOMATION_NAME} together in {roots:?}"
            )
            .into()
        })
}

fn find_artifact_directory(root: &Path, depth: usize) -> Option<PathBuf> {
    WalkDir::new(root)
        .follow_links(true)
        .max_depth(depth)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir())
        .find(|entry| {
            contains_file(entry.path(), LGPO_NAME)
                && contains_file(entry.path(), STEMCELL_AUTOMATION_NAME)
        })
        .map(|entry| entry.into_path())
}

fn contains_file(directory: &Path, name: &str) -> bool {
    WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .any(|entry| entry.file_type().is_file() && entry.file_name().eq_ignore_ascii_case(name))
}

/// Returns the contents of the first entry in `archive` whose name ends with
/// `suffix`.
pub(crate) fn read_zip_entry(archive: &Path, suffix: &str) -> Result<Vec<u8>, Box<dyn Error>> {
    let file = File::open(archive)
        .map_err(|err| format!("failed to open {}: {err}", archive.display()))?;
    let mut zip = ZipArchive::new(file)?;
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        if entry.is_file() && entry.name().ends_with(suffix) {
            log::debug!("Reading {} from {}", entry.name(), archive.display());
            let mut contents = Vec::new();
            entry.read_to_end(&mut contents)?;
            return Ok(contents);
        }
    }
    Err(format!("{suffix} not found in {}", archive.display()).into())
}
