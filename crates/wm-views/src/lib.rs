//! Multi-website view resolution, override merging and caching.
//!
//! One set of shared views serves many websites; each website may override a
//! view by key or extend it with website-owned fragments.
//!
//! This crate provides:
//! - [`ViewEngine`] / [`Session`]: resolution and materialization over a
//!   store snapshot, and validated writes
//! - [`resolve_view_id`]: template key + website to concrete view id
//! - [`applicable_fragments`]: per-website filtering of inheriting views
//! - [`read_combined`]: combination of a view with its fragments
//! - [`IntegrityValidator`]: write-time validation of views
//! - [`ResolutionCache`]: generation-tagged memo tables
//!
//! Collaborators are traits with a default implementation each:
//! [`Translator`] ([`TermTranslator`]), [`Branding`] ([`EditorBranding`]),
//! [`SchemaGrammar`] ([`LegacyViewGrammar`]) and [`Slugify`]
//! ([`AsciiSlugify`]).

pub mod arch;
mod branding;
mod cache;
mod combine;
mod engine;
mod error;
mod overrides;
mod pages;
mod postprocess;
mod resolver;
mod schema;
mod scope;
mod structure;
mod translate;
mod validator;
mod website;

pub use arch::{ArchError, Node};
pub use branding::{Branding, EditorBranding};
pub use cache::ResolutionCache;
pub use combine::{CombineError, read_combined};
pub use engine::{
    DEFAULT_PAGE_TEMPLATE, EngineConfig, PUBLIC_USER_XML_ID, Session, ViewEngine,
};
pub use error::ViewError;
pub use overrides::applicable_fragments;
pub use pages::{AsciiSlugify, PAGE_NAME_MAX_LENGTH, Slugify};
pub use postprocess::check_fields;
pub use resolver::{TemplateRef, resolve_view_id};
pub use schema::{ArchVersion, LegacyViewGrammar, SchemaGrammar};
pub use scope::Scope;
pub use structure::{check_generic, check_structured};
pub use translate::{TermTranslator, Translator};
pub use validator::IntegrityValidator;
pub use website::{host_name, lookup_website, website_menu};
