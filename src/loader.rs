//! Locating and loading packages from the search roots.
//!
//! A package is a directory of source files somewhere under one of the
//! configured roots, keyed by its import path. Loaded packages go into a
//! process-local cache; concurrent lookups of one path share a single load.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{env, fs, io};

use parking_lot::Mutex;
use snafu::{ensure, OptionExt, ResultExt, Snafu};

use crate::package::{Decl, Package};
use crate::parser::{self, SourceFile};

/// Environment variable listing the package search roots, colon-separated
pub const SEARCH_PATH_VAR: &str = "IMPLGEN_PATH";

/// How deep the short-name scan descends below each root
const SCAN_DEPTH: usize = 8;

#[derive(Debug, Snafu)]
pub enum LoadError {
    #[snafu(display("could not find package '{}'", path))]
    PackageNotFound { path: String },
    #[snafu(display("could not read '{}': {}", path.display(), source))]
    Io { path: PathBuf, source: io::Error },
    #[snafu(display("could not parse '{}': {}", file.display(), source))]
    Malformed { file: PathBuf, source: parser::SyntaxError },
}

/// A per-path cache entry. Loading happens with the slot locked, so a
/// second request for the same path waits instead of loading again.
type Slot = Arc<Mutex<Option<Arc<Package>>>>;

pub struct Loader {
    roots: Vec<PathBuf>,
    /// The directory an empty package path resolves to
    local_root: PathBuf,
    cache: Mutex<HashMap<String, Slot>>,
}

impl Loader {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            local_root: PathBuf::from("."),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Sets the directory that an empty package path resolves to
    pub fn with_local_root<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.local_root = dir.as_ref().to_path_buf();
        self
    }

    /// Builds a loader whose roots come from the `IMPLGEN_PATH` environment
    /// variable
    pub fn from_env() -> Self {
        let roots = env::var(SEARCH_PATH_VAR)
            .map(|paths| {
                paths.split(':')
                    .filter(|root| !root.is_empty())
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_else(|_| Vec::new());
        Self::new(roots)
    }

    /// Loads the package at the given import path, reusing the cached copy
    /// when one exists.
    ///
    /// Repeated loads of one path return clones of the same `Arc`; failures
    /// are not cached, since they describe permanent conditions that would
    /// fail identically on retry.
    pub fn load(&self, path: &str) -> Result<Arc<Package>, LoadError> {
        let slot = self.slot(path);
        let mut slot = slot.lock();
        if let Some(pkg) = &*slot {
            log::trace!("cache hit for package '{}'", path);
            return Ok(pkg.clone());
        }

        let (canonical, dir) = self.locate(path)
            .with_context(|| PackageNotFound {path: path.to_string()})?;
        let pkg = if canonical == path {
            Arc::new(self.load_dir(&canonical, &dir)?)
        } else {
            // a short name shares the canonical path's entry, so `http` and
            // `net/http` resolve to one loaded package in either order
            let canonical_slot = self.slot(&canonical);
            let mut canonical_slot = canonical_slot.lock();
            match &*canonical_slot {
                Some(pkg) => pkg.clone(),
                None => {
                    let pkg = Arc::new(self.load_dir(&canonical, &dir)?);
                    *canonical_slot = Some(pkg.clone());
                    pkg
                },
            }
        };
        *slot = Some(pkg.clone());
        Ok(pkg)
    }

    fn slot(&self, path: &str) -> Slot {
        let mut cache = self.cache.lock();
        cache.entry(path.to_string()).or_default().clone()
    }

    /// Finds the directory for an import path: first a direct join onto
    /// each root, then a scan for a package directory whose final segment
    /// matches (`http` names `net/http`). Returns the canonical path and
    /// the directory.
    fn locate(&self, path: &str) -> Option<(String, PathBuf)> {
        if path.is_empty() {
            return Some((String::new(), self.local_root.clone()));
        }
        for root in &self.roots {
            let dir = root.join(path);
            if has_source(&dir) {
                return Some((path.to_string(), dir));
            }
        }
        for root in &self.roots {
            if let Some(found) = scan_for(root, root, path, SCAN_DEPTH) {
                return Some(found);
            }
        }
        None
    }

    fn load_dir(&self, path: &str, dir: &Path) -> Result<Package, LoadError> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| Io {path: dir.to_path_buf()})?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|file| is_source_file(file))
            .collect();
        files.sort();
        ensure!(!files.is_empty(), PackageNotFound {path});

        let mut name = String::new();
        let mut imports = HashMap::new();
        let mut decls: HashMap<String, Decl> = HashMap::new();
        for file in files {
            let src = fs::read_to_string(&file)
                .with_context(|| Io {path: file.clone()})?;
            let parsed = parser::parse_file(&src)
                .with_context(|| Malformed {file: file.clone()})?;
            let SourceFile {package, imports: file_imports, decls: file_decls} = parsed;
            if name.is_empty() {
                name = package;
            }
            for (short, import_path) in file_imports {
                imports.entry(short).or_insert(import_path);
            }
            for (decl_name, decl) in file_decls {
                decls.entry(decl_name).or_insert(decl);
            }
        }

        log::debug!(
            "loaded package '{}' from '{}' ({} declarations)",
            path, dir.display(), decls.len(),
        );
        Ok(Package {path: path.to_string(), name, imports, decls})
    }
}

/// Recursively looks for a package directory named `name` under `dir`,
/// checking each directory's children in sorted order before descending
fn scan_for(root: &Path, dir: &Path, name: &str, depth: usize) -> Option<(String, PathBuf)> {
    if depth == 0 {
        return None;
    }
    let entries = fs::read_dir(dir).ok()?;
    let mut subdirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    subdirs.sort();

    for subdir in &subdirs {
        if subdir.file_name().map_or(false, |dir_name| dir_name == name) && has_source(subdir) {
            return Some((rel_import_path(root, subdir), subdir.clone()));
        }
    }
    for subdir in subdirs {
        if let Some(found) = scan_for(root, &subdir, name, depth - 1) {
            return Some(found);
        }
    }
    None
}

fn rel_import_path(root: &Path, dir: &Path) -> String {
    let rel = dir.strip_prefix(root).unwrap_or(dir);
    let segments: Vec<_> = rel.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect();
    segments.join("/")
}

fn has_source(dir: &Path) -> bool {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return false,
    };
    entries.filter_map(|entry| entry.ok()).any(|entry| is_source_file(&entry.path()))
}

/// Non-test source files make up a package
fn is_source_file(path: &Path) -> bool {
    if path.extension() != Some(OsStr::new("go")) {
        return false;
    }
    match path.file_name().and_then(|name| name.to_str()) {
        Some(name) => !name.ends_with("_test.go"),
        None => false,
    }
}
