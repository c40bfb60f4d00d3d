//! One churn cycle in a worker directory
//!
//! ```text
//! <dir>/src, <dir>/dst        create both
//! <dir>/src/{0..n}            write random-length payload prefixes
//! readdir src -> rename dst   same names
//! readdir dst -> unlink       every entry
//! rmdir src, rmdir dst
//! ```
//!
//! Steps run strictly in order. The first failing operation ends the cycle
//! and nothing is cleaned up.

use crate::error::{CycleError, CycleResult};
use crate::payload::Payload;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Paths used by a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleDirs {
    pub root: PathBuf,
    pub src: PathBuf,
    pub dst: PathBuf,
}

impl CycleDirs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let src = root.join("src");
        let dst = root.join("dst");
        Self { root, src, dst }
    }
}

/// What a completed cycle did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub files_created: u64,
    pub bytes_written: u64,
    pub files_moved: u64,
    pub files_deleted: u64,
}

/// Run a full cycle with a freshly seeded size generator
pub fn run_cycle(dirs: &CycleDirs, max_files: usize, payload: &Payload) -> CycleResult<CycleReport> {
    run_cycle_with_rng(dirs, max_files, payload, &mut SmallRng::from_entropy())
}

/// Run a full cycle drawing file sizes from `rng`
pub fn run_cycle_with_rng<R: Rng>(
    dirs: &CycleDirs,
    max_files: usize,
    payload: &Payload,
    rng: &mut R,
) -> CycleResult<CycleReport> {
    let dir = dirs.root.display();

    debug!(dir = %dir, "creating src and dst");
    create_dirs(dirs)?;

    debug!(dir = %dir, files = max_files, "creating files");
    let bytes_written = create_files(&dirs.src, max_files, payload, rng)?;

    debug!(dir = %dir, "moving files");
    let files_moved = relocate_files(&dirs.src, &dirs.dst)?;

    debug!(dir = %dir, "deleting files");
    let files_deleted = delete_files(&dirs.dst)?;

    debug!(dir = %dir, "deleting src and dst");
    remove_dirs(dirs)?;

    Ok(CycleReport {
        files_created: max_files as u64,
        bytes_written,
        files_moved: files_moved as u64,
        files_deleted: files_deleted as u64,
    })
}

/// Create `src` and `dst`; existing directories are fine
pub fn create_dirs(dirs: &CycleDirs) -> CycleResult<()> {
    for path in [&dirs.src, &dirs.dst] {
        fs::create_dir_all(path).map_err(|source| CycleError::CreateDir {
            path: path.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Create files `0..count` in `src`, each holding a payload prefix whose
/// length is uniform in `[0, payload.len())`. Returns total bytes written.
pub fn create_files<R: Rng>(
    src: &Path,
    count: usize,
    payload: &Payload,
    rng: &mut R,
) -> CycleResult<u64> {
    let mut total = 0u64;

    for i in 0..count {
        let path = src.join(i.to_string());
        let mut file = File::create(&path).map_err(|source| CycleError::CreateFile {
            path: path.clone(),
            source,
        })?;

        let len = rng.gen_range(0..payload.len());
        file.write_all(payload.prefix(len))
            .map_err(|source| CycleError::WriteFile {
                path: path.clone(),
                len,
                source,
            })?;

        total += len as u64;
    }

    Ok(total)
}

/// Names of every entry in `dir`
pub fn list_entries(dir: &Path) -> CycleResult<Vec<OsString>> {
    let read_err = |source: std::io::Error| CycleError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        names.push(entry.map_err(read_err)?.file_name());
    }
    Ok(names)
}

/// Rename every entry of `src` into `dst` under the same name
pub fn relocate_files(src: &Path, dst: &Path) -> CycleResult<usize> {
    let names = list_entries(src)?;

    for name in &names {
        let from = src.join(name);
        let to = dst.join(name);
        fs::rename(&from, &to).map_err(|source| CycleError::Rename { from, to, source })?;
    }

    Ok(names.len())
}

/// Delete every entry of `dir`
pub fn delete_files(dir: &Path) -> CycleResult<usize> {
    let names = list_entries(dir)?;

    for name in &names {
        let path = dir.join(name);
        fs::remove_file(&path).map_err(|source| CycleError::RemoveFile { path, source })?;
    }

    Ok(names.len())
}

/// Remove the (empty) `src` and `dst` directories
pub fn remove_dirs(dirs: &CycleDirs) -> CycleResult<()> {
    for path in [&dirs.src, &dirs.dst] {
        fs::remove_dir(path).map_err(|source| CycleError::RemoveDir {
            path: path.clone(),
            source,
        })?;
    }
    Ok(())
}
