//! Template resolution and loading.

use serde::Serialize;

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use crate::{HbsEngine, RenderError};

/// Reference to a named template, optionally qualified by a package.
///
/// An explicit qualifier inside the name itself (`pkg:index.pug`) takes precedence;
/// the separate package is only consulted for unqualified names (see
/// [`PugRendererFactory`](crate::PugRendererFactory) for the resolution policy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRef {
    name: String,
    package: Option<String>,
}

impl TemplateRef {
    /// Creates a reference to `name` with no package.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: None,
        }
    }

    /// Creates a reference to `name` originating from `package`.
    pub fn in_package(name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: Some(package.into()),
        }
    }

    /// Returns the template name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the originating package, if any.
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// Checks whether the name carries an explicit package qualifier.
    pub fn is_qualified(&self) -> bool {
        self.name.contains(':')
    }
}

impl fmt::Display for TemplateRef {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (false, Some(package)) = (self.is_qualified(), &self.package) {
            write!(formatter, "{package}:{}", self.name)
        } else {
            formatter.write_str(&self.name)
        }
    }
}

/// Resolves template names to loaded templates.
///
/// Implementations are collaborators supplied by the host application;
/// [`DirTemplateLoader`] covers the common directory-backed case.
pub trait TemplateLoader {
    /// Loads the template stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::TemplateNotFound`] if nothing is stored under `name`,
    /// or another error if the template exists but cannot be loaded.
    fn load(&self, name: &str) -> Result<LoadedTemplate, RenderError>;
}

/// A template resolved to its source text and originating file path.
#[derive(Debug, Clone)]
pub struct LoadedTemplate {
    source: String,
    path: PathBuf,
}

impl LoadedTemplate {
    /// Creates a loaded template from its source text and path.
    pub fn new(source: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            path: path.into(),
        }
    }

    /// Returns the template source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the file path the template was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Executes the template against `context` using the provided engine.
    ///
    /// # Errors
    ///
    /// Propagates [`HbsEngine::render_str()`] errors.
    pub fn render(
        &self,
        engine: &HbsEngine,
        context: &impl Serialize,
    ) -> Result<String, RenderError> {
        engine.render_str(&self.source, context)
    }
}

/// [`TemplateLoader`] reading templates from a directory tree.
///
/// A package-qualified name (`pkg:index.pug`) resolves to the `pkg` subdirectory of
/// the root.
#[derive(Debug, Clone)]
pub struct DirTemplateLoader {
    root: PathBuf,
}

impl DirTemplateLoader {
    /// Creates a loader rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_path(&self, name: &str) -> PathBuf {
        match name.split_once(':') {
            Some((package, rest)) => self.root.join(package).join(rest),
            None => self.root.join(name),
        }
    }
}

impl TemplateLoader for DirTemplateLoader {
    fn load(&self, name: &str) -> Result<LoadedTemplate, RenderError> {
        let path = self.file_path(name);
        let source = fs::read_to_string(&path).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                RenderError::TemplateNotFound {
                    name: name.to_owned(),
                }
            } else {
                RenderError::Io(err)
            }
        })?;
        Ok(LoadedTemplate::new(source, path))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use std::fs;

    use super::*;

    #[test]
    fn loading_from_directory() -> anyhow::Result<()> {
        let temp_dir = tempfile::tempdir()?;
        fs::write(temp_dir.path().join("index.pug"), "h1 hello")?;

        let loader = DirTemplateLoader::new(temp_dir.path());
        let template = loader.load("index.pug")?;
        assert_eq!(template.source(), "h1 hello");
        assert_eq!(template.path(), temp_dir.path().join("index.pug"));
        Ok(())
    }

    #[test]
    fn qualified_name_maps_to_subdirectory() -> anyhow::Result<()> {
        let temp_dir = tempfile::tempdir()?;
        fs::create_dir(temp_dir.path().join("site"))?;
        fs::write(temp_dir.path().join("site/index.pug"), "h1 site")?;

        let loader = DirTemplateLoader::new(temp_dir.path());
        let template = loader.load("site:index.pug")?;
        assert_eq!(template.source(), "h1 site");
        Ok(())
    }

    #[test]
    fn missing_template_is_reported_by_name() {
        let loader = DirTemplateLoader::new("/nonexistent");
        let err = loader.load("index.pug").unwrap_err();
        assert_matches!(err, RenderError::TemplateNotFound { name } if name == "index.pug");
    }

    #[test]
    fn display_of_template_refs() {
        assert_eq!(TemplateRef::new("index.pug").to_string(), "index.pug");
        assert_eq!(
            TemplateRef::in_package("index.pug", "site").to_string(),
            "site:index.pug"
        );
        assert_eq!(
            TemplateRef::in_package("other:index.pug", "site").to_string(),
            "other:index.pug"
        );
    }
}
