//! Rendering [pug] templates through the `pug` CLI, in a pluggable way.
//!
//! # What it does
//!
//! This crate allows to:
//!
//! - Convert pug-syntax template text into HTML by piping it through the external
//!   `pug` command-line tool ([`PugCli`]), with a context serialized to JSON.
//! - Chain the conversion with a [Handlebars] pass ([`HbsEngine`]), so that a single
//!   template file can mix pug and Handlebars syntax.
//! - Plug the pipeline into a host application's rendering layer via explicit
//!   [`Renderer`] / [`RendererFactory`] traits, with template resolution delegated
//!   to a [`TemplateLoader`].
//! - Cache one rendered HTML artifact per template for the process lifetime
//!   ("static only" mode, [`StaticCache`]), skipping the CLI entirely on cache hits.
//!
//! # Design decisions
//!
//! - **External conversion.** The pug language is defined by its reference JavaScript
//!   implementation; converting via the official CLI guarantees output parity at the
//!   cost of one subprocess per (uncached) render.
//! - **Argument-vector invocation.** The CLI is spawned with an argument vector and
//!   stdin redirection rather than through a shell, so context data can never be
//!   interpreted as shell syntax.
//! - **Injected configuration.** [`RenderConfig`] is built once at startup and handed
//!   to the factory; nothing reads mutable process-global state during rendering.
//! - **Failures are errors.** A non-zero exit status from the CLI surfaces as
//!   [`RenderError::ExternalFailure`] with captured stderr instead of being passed
//!   off as (possibly empty) output.
//!
//! # Limitations
//!
//! - The `pug` executable must be installed separately (e.g., via `npm`); this crate
//!   does not bundle or locate it beyond an ordinary `PATH` lookup.
//! - Renders are synchronous and blocking; there is no timeout on the subprocess.
//! - The static cache keys artifacts by template *basename*, so two templates with
//!   the same filename in different directories collide in static-only mode.
//!
//! # Examples
//!
//! Rendering a pug string with a context:
//!
//! ```no_run
//! use pug_bridge::PugCli;
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let cli = PugCli::new();
//! let context = json!({ "name": "Derp" });
//! let html = cli.render_str("h1 hello #{ name }", None, Some(&context))?;
//! assert_eq!(html, "<h1>hello Derp</h1>");
//! # Ok(())
//! # }
//! ```
//!
//! Wiring the full pipeline through the factory:
//!
//! ```no_run
//! use pug_bridge::{
//!     DirTemplateLoader, PugRendererFactory, RenderConfig, RendererFactory, TemplateRef,
//! };
//! use serde_json::{json, Map};
//!
//! # fn main() -> anyhow::Result<()> {
//! let loader = DirTemplateLoader::new("templates");
//! let factory = PugRendererFactory::new(loader).with_config(RenderConfig::default());
//! let renderer = factory.build(&TemplateRef::new("index.pug"))?;
//!
//! let mut system = Map::new();
//! let html = renderer.render(&json!({ "name": "sam" }), &mut system)?;
//! println!("{html}");
//! # Ok(())
//! # }
//! ```
//!
//! [pug]: https://pugjs.org/
//! [Handlebars]: https://handlebarsjs.com/

// Documentation settings.
#![cfg_attr(docsrs, feature(doc_cfg))]
// Linter settings.
#![warn(missing_debug_implementations, missing_docs, bare_trait_objects)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use std::{error::Error as StdError, fmt, io, process::ExitStatus};

mod cache;
mod cli;
mod config;
mod hbs;
mod loader;
mod renderer;

pub use self::{
    cache::StaticCache,
    cli::{PugCli, DEFAULT_EXECUTABLE},
    config::{RenderConfig, DEFAULT_EXTENSION, DEFAULT_SETTINGS_PREFIX},
    hbs::HbsEngine,
    loader::{DirTemplateLoader, LoadedTemplate, TemplateLoader, TemplateRef},
    renderer::{PugRenderer, PugRendererFactory, Renderer, RendererFactory},
};

/// Errors that can occur when rendering templates.
#[derive(Debug)]
#[non_exhaustive]
pub enum RenderError {
    /// The context passed to a [`Renderer`] is not a JSON object. The enclosed string
    /// names the actual kind of the value (e.g., `"array"`).
    NonMappingContext(&'static str),
    /// The template cannot be resolved under either the package-qualified
    /// or the unqualified name.
    TemplateNotFound {
        /// Name under which resolution was last attempted.
        name: String,
    },
    /// The external `pug` process exited with a non-zero status.
    ExternalFailure {
        /// Exit status of the process.
        status: ExitStatus,
        /// Captured standard error of the process.
        stderr: String,
    },
    /// I/O error (temp file management, cache access, or subprocess plumbing).
    Io(io::Error),
    /// Context cannot be serialized to JSON.
    Json(serde_json::Error),
    /// Handlebars pass failed.
    Handlebars(Box<handlebars::RenderError>),
}

impl fmt::Display for RenderError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonMappingContext(kind) => {
                write!(
                    formatter,
                    "renderer was passed a non-mapping value as the context ({kind})"
                )
            }
            Self::TemplateNotFound { name } => {
                write!(formatter, "template `{name}` cannot be resolved")
            }
            Self::ExternalFailure { status, stderr } => {
                write!(
                    formatter,
                    "pug CLI exited with {status}; stderr: {}",
                    stderr.trim_end()
                )
            }
            Self::Io(err) => write!(formatter, "I/O error: {err}"),
            Self::Json(err) => write!(formatter, "cannot serialize context to JSON: {err}"),
            Self::Handlebars(err) => write!(formatter, "Handlebars pass failed: {err}"),
        }
    }
}

impl StdError for RenderError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Handlebars(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for RenderError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<handlebars::RenderError> for RenderError {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Handlebars(Box::new(err))
    }
}
