//! Image catalog: the ordered, immutable list of gallery images.
//!
//! The catalog is resolved once at startup and installed as a process-wide
//! singleton. Its order is the lightbox navigation order.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::Error;

static GLOBAL: OnceLock<Catalog> = OnceLock::new();

/// A loadable image and its position in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    ordinal: usize,
    path: PathBuf,
}

impl ImageRef {
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name for captions and logs.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned()
    }
}

/// Options controlling directory scanning.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional maximum recursion depth. `None` or `Some(0)` means unlimited.
    pub max_depth: Option<usize>,
    /// Optional override for allowed extensions (lowercase, without dot).
    pub exts: Option<Vec<&'static str>>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            max_depth: None,
            exts: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    images: Arc<[ImageRef]>,
}

impl Catalog {
    /// Build a catalog from `paths`, ordered by path.
    pub fn from_paths(mut paths: Vec<PathBuf>) -> Self {
        paths.sort();
        paths.dedup();
        let images = paths
            .into_iter()
            .enumerate()
            .map(|(ordinal, path)| ImageRef { ordinal, path })
            .collect::<Vec<_>>();
        Self {
            images: images.into(),
        }
    }

    /// Scan `root` for images.
    ///
    /// An existing directory without images yields an empty catalog.
    ///
    /// # Errors
    /// Returns [`Error::BadDir`] if `root` is missing or not a directory.
    pub fn scan(root: &Path, opts: &ScanOptions) -> Result<Self, Error> {
        let paths = scan_with_options(&[root.to_path_buf()], opts)?;
        Ok(Self::from_paths(paths))
    }

    /// Install `catalog` as the process-wide catalog. The first install wins;
    /// later calls return the catalog that is already in place.
    pub fn install(catalog: Catalog) -> &'static Catalog {
        let mut fresh = Some(catalog);
        let installed = GLOBAL.get_or_init(|| fresh.take().unwrap_or_default());
        if fresh.is_some() {
            warn!("image catalog already installed; keeping the first one");
        }
        installed
    }

    /// The installed catalog, if any.
    pub fn global() -> Option<&'static Catalog> {
        GLOBAL.get()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn get(&self, ordinal: usize) -> Option<&ImageRef> {
        self.images.get(ordinal)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageRef> {
        self.images.iter()
    }
}

/// Return `true` if `path` has an allowed image extension.
#[must_use]
pub fn is_supported_image(path: &Path, exts: Option<&[&str]>) -> bool {
    let default_exts: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
    let exts = exts.unwrap_or(default_exts);
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| *e == ext)
        })
}

/// Scan the given `paths` for images using the provided options.
///
/// Returned paths are canonical.
///
/// # Errors
/// Returns [`Error::BadDir`] if any path is missing or not a directory, and
/// [`Error::Io`] if a root cannot be canonicalized.
pub fn scan_with_options(paths: &[PathBuf], opts: &ScanOptions) -> Result<Vec<PathBuf>, Error> {
    let bad = paths
        .iter()
        .filter(|p| !p.is_dir())
        .map(|p| p.to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    if !bad.is_empty() {
        return Err(Error::BadDir(bad.join(", ")));
    }

    let mut out = Vec::new();
    for root in paths {
        let root = root.canonicalize()?;
        let mut wd = WalkDir::new(&root).follow_links(true);
        if !opts.recursive {
            wd = wd.max_depth(1);
        } else if let Some(d) = opts.max_depth
            && d > 0
        {
            wd = wd.max_depth(d);
        }

        for entry in wd
            .into_iter()
            .filter_entry(|e| !should_skip_dir(e))
            .flatten()
        {
            let path = entry.path();
            if entry.file_type().is_file() && is_supported_image(path, opts.exts.as_deref()) {
                out.push(path.to_path_buf());
            } else {
                debug!(path = %path.display(), "scan: skipped");
            }
        }
    }

    Ok(out)
}

fn should_skip_dir(entry: &DirEntry) -> bool {
    // Never skip the root; tempfile roots can be dot-dirs.
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .is_some_and(|n| n.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_follow_sorted_paths() {
        let catalog = Catalog::from_paths(vec![
            PathBuf::from("/g/c.jpg"),
            PathBuf::from("/g/a.jpg"),
            PathBuf::from("/g/b.png"),
            PathBuf::from("/g/a.jpg"),
        ]);
        assert_eq!(catalog.len(), 3);
        let names: Vec<_> = catalog.iter().map(ImageRef::display_name).collect();
        assert_eq!(names, ["a.jpg", "b.png", "c.jpg"]);
        assert_eq!(catalog.get(2).map(ImageRef::ordinal), Some(2));
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        assert!(is_supported_image(Path::new("x/IMG.JPG"), None));
        assert!(!is_supported_image(Path::new("x/notes.txt"), None));
        assert!(is_supported_image(Path::new("x/a.tif"), Some(&["tif"])));
    }
}
