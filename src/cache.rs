//! Static artifact store for "static only" rendering.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

/// Store of statically rendered HTML artifacts, keyed by template basename.
///
/// The backing directory is wiped and recreated when the store is constructed, which
/// is meant to happen once per application startup; artifacts written afterwards
/// persist for the process lifetime. Two concurrent first renders of the same
/// template may both populate the same artifact; the outputs are identical for a
/// given template, so the last write winning is harmless.
#[derive(Debug, Clone)]
pub struct StaticCache {
    dir: PathBuf,
}

impl StaticCache {
    /// Creates a store rooted at `dir`, deleting any leftover contents from previous
    /// runs.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be removed or recreated.
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        match fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Creates a store under the well-known location in the OS temp directory.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::new()`] errors.
    pub fn in_temp_dir() -> io::Result<Self> {
        Self::new(env::temp_dir().join("pug-bridge"))
    }

    /// Returns the backing directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Computes the artifact path for the given source template path. The store is a
    /// flat namespace: only the template basename is used.
    ///
    /// # Errors
    ///
    /// Returns an error if `template_path` has no final filename component
    /// (e.g., it ends in `..`).
    pub fn artifact_path(&self, template_path: &Path) -> io::Result<PathBuf> {
        let name = template_path.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "template path `{}` has no file name to key the artifact by",
                    template_path.display()
                ),
            )
        })?;
        Ok(self.dir.join(name))
    }

    /// Reads the cached artifact for a template, or `None` if it has not been
    /// rendered yet in this run.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failures other than the artifact being absent, or if
    /// the template path has no filename.
    pub fn get(&self, template_path: &Path) -> io::Result<Option<String>> {
        match fs::read_to_string(self.artifact_path(template_path)?) {
            Ok(html) => Ok(Some(html)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Stores the rendered artifact for a template, overwriting a previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be written, or if the template path
    /// has no filename.
    pub fn put(&self, template_path: &Path, html: &str) -> io::Result<()> {
        fs::write(self.artifact_path(template_path)?, html)
    }
}
