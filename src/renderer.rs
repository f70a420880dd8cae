//! Renderer adapter: pluggable traits and the pug rendering pipeline.

use serde_json::{Map, Value};

use std::{collections::HashMap, io, sync::Arc};

use crate::{
    config::{self, RenderConfig},
    HbsEngine, LoadedTemplate, PugCli, RenderError, StaticCache, TemplateLoader, TemplateRef,
};

/// Renders a data context into output text.
///
/// This is the contract a host application's rendering layer calls into. `context` is
/// the per-request data (it must be a JSON object); `system` is the host-provided
/// value mapping, which the context entries are merged into before rendering.
pub trait Renderer {
    /// Renders the merged context into output text.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NonMappingContext`] if `context` is not a JSON object;
    /// other variants propagate from template execution.
    fn render(&self, context: &Value, system: &mut Map<String, Value>)
        -> Result<String, RenderError>;
}

/// Builds [`Renderer`]s for template references.
pub trait RendererFactory {
    /// Resolves `template` and builds a renderer for it.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::TemplateNotFound`] if the reference cannot be resolved.
    fn build(&self, template: &TemplateRef) -> Result<Box<dyn Renderer>, RenderError>;
}

/// [`Renderer`] executing the pug pipeline for one resolved template.
///
/// The pipeline is: execute the template source against the merged context with the
/// [`HbsEngine`], convert the result to HTML via [`PugCli`], then apply the engine
/// once more to the CLI output so Handlebars syntax surviving the conversion is
/// resolved. In static-only mode (with reloading off) the rendered HTML is written to
/// the [`StaticCache`] on first render and read back verbatim afterwards; if the
/// factory carries no cache, static-only mode degrades to direct rendering.
#[derive(Debug)]
pub struct PugRenderer {
    template: LoadedTemplate,
    engine: Arc<HbsEngine>,
    cli: PugCli,
    config: RenderConfig,
    cache: Option<Arc<StaticCache>>,
}

impl PugRenderer {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip_all, err, fields(template = ?self.template.path()))
    )]
    fn render_template(&self, system: &Map<String, Value>) -> Result<String, RenderError> {
        let context = Value::Object(system.clone());
        let primary = self.template.render(&self.engine, &context)?;
        let html = self
            .cli
            .render_str(&primary, Some(self.template.path()), Some(&context))?;
        // Secondary pass over the CLI output.
        self.engine.render_str(&html, &context)
    }
}

impl Renderer for PugRenderer {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            level = "debug",
            skip_all,
            err,
            fields(template = ?self.template.path(), static_only = self.config.static_only)
        )
    )]
    fn render(
        &self,
        context: &Value,
        system: &mut Map<String, Value>,
    ) -> Result<String, RenderError> {
        let entries = context
            .as_object()
            .ok_or(RenderError::NonMappingContext(value_kind(context)))?;
        for (key, value) in entries {
            system.insert(key.clone(), value.clone());
        }

        if self.config.use_static() {
            if let Some(cache) = &self.cache {
                if let Some(html) = cache.get(self.template.path())? {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("serving statically rendered artifact");
                    return Ok(html);
                }
                let html = self.render_template(system)?;
                cache.put(self.template.path(), &html)?;
                return Ok(html);
            }
        }
        self.render_template(system)
    }
}

/// [`RendererFactory`] for the pug pipeline.
///
/// Owns the collaborators shared by all built renderers: the template loader, the
/// Handlebars engine, the CLI options, the [`RenderConfig`], and (in static-only
/// mode) the artifact cache.
///
/// # Resolution policy
///
/// If the factory knows a package (its own or the reference's) and the name carries
/// no explicit `pkg:` qualifier, the package-qualified name is tried first; on
/// [`RenderError::TemplateNotFound`] resolution falls back to the bare name. Other
/// loader errors propagate immediately.
pub struct PugRendererFactory {
    loader: Box<dyn TemplateLoader>,
    engine: Arc<HbsEngine>,
    cli: PugCli,
    config: RenderConfig,
    cache: Option<Arc<StaticCache>>,
    package: Option<String>,
}

impl std::fmt::Debug for PugRendererFactory {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("PugRendererFactory")
            .field("cli", &self.cli)
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("package", &self.package)
            .finish_non_exhaustive()
    }
}

impl PugRendererFactory {
    /// Creates a factory with default options and no cache.
    pub fn new(loader: impl TemplateLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            engine: Arc::new(HbsEngine::new()),
            cli: PugCli::new(),
            config: RenderConfig::default(),
            cache: None,
            package: None,
        }
    }

    /// Creates a factory from a flat settings map scoped by `prefix` (see
    /// [`DEFAULT_SETTINGS_PREFIX`](crate::DEFAULT_SETTINGS_PREFIX)).
    ///
    /// Recognized keys besides the [`RenderConfig`] ones: `{prefix}executable`
    /// (path to the pug CLI) and `{prefix}pretty` (bool-like). When the resulting
    /// config enables static-only rendering, the artifact cache is created under
    /// `{prefix}cache_dir`, or the well-known temp location if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be prepared.
    pub fn from_settings(
        loader: impl TemplateLoader + 'static,
        settings: &HashMap<String, String>,
        prefix: &str,
    ) -> io::Result<Self> {
        let config = RenderConfig::from_settings(settings, prefix);
        let mut cli = PugCli::new();
        if let Some(executable) = settings.get(&format!("{prefix}executable")) {
            cli = cli.with_executable(executable);
        }
        if let Some(pretty) = settings.get(&format!("{prefix}pretty")) {
            cli = cli.with_pretty(config::as_bool(pretty));
        }

        let cache = if config.use_static() {
            let cache = match settings.get(&format!("{prefix}cache_dir")) {
                Some(dir) => StaticCache::new(dir)?,
                None => StaticCache::in_temp_dir()?,
            };
            Some(Arc::new(cache))
        } else {
            None
        };

        Ok(Self {
            cache,
            cli,
            config,
            ..Self::new(loader)
        })
    }

    /// Overrides the render config.
    ///
    /// A config with [`RenderConfig::use_static()`] set only takes effect if a cache
    /// is also attached (via [`Self::with_cache()`]; [`Self::from_settings()`] does
    /// this automatically). Without one, renderers fall back to rendering directly
    /// on every call.
    #[must_use]
    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the CLI options.
    #[must_use]
    pub fn with_cli(mut self, cli: PugCli) -> Self {
        self.cli = cli;
        self
    }

    /// Attaches a static artifact cache.
    #[must_use]
    pub fn with_cache(mut self, cache: StaticCache) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    /// Sets the default package for resolving unqualified template names.
    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    fn resolve(&self, template: &TemplateRef) -> Result<LoadedTemplate, RenderError> {
        let package = template.package().or(self.package.as_deref());
        if let (false, Some(package)) = (template.is_qualified(), package) {
            match self.loader.load(&format!("{package}:{}", template.name())) {
                Ok(loaded) => return Ok(loaded),
                Err(RenderError::TemplateNotFound { .. }) => {}
                Err(err) => return Err(err),
            }
        }
        self.loader.load(template.name())
    }
}

impl RendererFactory for PugRendererFactory {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip(self), err, fields(template = %template))
    )]
    fn build(&self, template: &TemplateRef) -> Result<Box<dyn Renderer>, RenderError> {
        let loaded = self.resolve(template)?;
        Ok(Box::new(PugRenderer {
            template: loaded,
            engine: Arc::clone(&self.engine),
            cli: self.cli.clone(),
            config: self.config,
            cache: self.cache.clone(),
        }))
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
