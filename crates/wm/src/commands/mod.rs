//! CLI command implementations.

pub(crate) mod check;
pub(crate) mod render;
pub(crate) mod resolve;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use wm_cache::{MemoryCache, NullCache};
use wm_config::{CliSettings, Config};
use wm_storage::{Bundle, MemoryStore, Store, WebsiteId};
use wm_views::{ArchVersion, EngineConfig, Scope, Session, ViewEngine};

use crate::error::CliError;

pub(crate) use check::CheckArgs;
pub(crate) use render::RenderArgs;
pub(crate) use resolve::ResolveArgs;

/// Arguments shared by every command.
#[derive(Args)]
pub(crate) struct GlobalArgs {
    /// Path to configuration file (default: auto-discover wm.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Site bundle to load (overrides config).
    #[arg(short, long, global = true, env = "WM_BUNDLE")]
    bundle: Option<PathBuf>,

    /// Disable the resolution cache.
    #[arg(long, global = true)]
    no_cache: bool,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    fn load_config(&self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            bundle_path: self.bundle.clone(),
            cache_enabled: self.no_cache.then_some(false),
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }

    /// Build an engine over the configured site bundle.
    ///
    /// With `validate`, the bundle is loaded through a validated write and an
    /// invalid view aborts loading. Otherwise it is committed as-is.
    pub(crate) fn open(&self, validate: bool) -> Result<ViewEngine, CliError> {
        let config = self.load_config()?;
        open_site(&config, validate)
    }
}

fn open_site(config: &Config, validate: bool) -> Result<ViewEngine, CliError> {
    let store = Arc::new(MemoryStore::new());
    let engine_config = engine_config(config)?;
    let engine = if config.cache.enabled {
        ViewEngine::new(
            Arc::clone(&store) as Arc<dyn Store>,
            &MemoryCache::new(),
            engine_config,
        )
    } else {
        ViewEngine::new(
            Arc::clone(&store) as Arc<dyn Store>,
            &NullCache,
            engine_config,
        )
    };

    let bundle = Bundle::load(&config.bundle_path)?;
    let base_dir = config.bundle_path.parent().unwrap_or(Path::new("."));
    let summary = if validate {
        engine.write(|txn| Ok::<_, CliError>(bundle.apply(base_dir, txn)?))?
    } else {
        let mut txn = store.begin();
        let summary = bundle.apply(base_dir, txn.as_mut())?;
        txn.commit()?;
        summary
    };

    tracing::info!(
        bundle = %config.bundle_path.display(),
        websites = summary.websites,
        menus = summary.menus,
        views = summary.views,
        cache = config.cache.enabled,
        "Loaded site bundle"
    );
    Ok(engine)
}

fn engine_config(config: &Config) -> Result<EngineConfig, CliError> {
    let threshold = &config.validation.grammar_version_threshold;
    let grammar_version_threshold = ArchVersion::parse(threshold).ok_or_else(|| {
        CliError::Validation(format!("Invalid grammar_version_threshold: {threshold:?}"))
    })?;
    Ok(EngineConfig {
        default_website_id: WebsiteId(config.websites.default_website_id),
        default_namespace: config.websites.default_namespace.clone(),
        grammar_version_threshold,
    })
}

/// Session for a request on `host`, or a website-less session without one.
fn session<'a>(engine: &'a ViewEngine, host: Option<&str>, scope: Scope) -> Session<'a> {
    match host {
        Some(host) => engine.enter(host, scope),
        None => engine.session(scope),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use wm_storage::ViewId;
    use wm_views::ViewError;

    use super::*;

    const BUNDLE: &str = r#"
websites:
  - name: main.com
  - name: shop.com
views:
  - xml_id: website.layout
    arch: <main><p>Welcome</p></main>
  - xml_id: website.layout_shop
    inherit: website.layout
    website: shop.com
    arch: <xpath expr="//p" position="after"><nav/></xpath>
"#;

    fn config_for(dir: &Path, bundle: &str) -> Config {
        let bundle_path = dir.join("site.yaml");
        fs::write(&bundle_path, bundle).unwrap();
        let config_path = dir.join("wm.toml");
        fs::write(&config_path, "[bundle]\npath = \"site.yaml\"\n").unwrap();
        Config::load(Some(&config_path), None).unwrap()
    }

    #[test]
    fn test_engine_config_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path(), "");

        let engine_config = engine_config(&config).unwrap();

        assert_eq!(engine_config.default_website_id, WebsiteId(1));
        assert_eq!(engine_config.default_namespace, "website");
        assert_eq!(
            engine_config.grammar_version_threshold,
            ArchVersion::from_parts([7])
        );
    }

    #[test]
    fn test_open_site_renders_per_host() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path(), BUNDLE);
        let engine = open_site(&config, true).unwrap();

        let main = session(&engine, Some("main.com"), Scope::default())
            .read_template("website.layout")
            .unwrap();
        let shop = session(&engine, Some("shop.com:8080"), Scope::default())
            .read_template("website.layout")
            .unwrap();

        assert!(main.ends_with("<templates><main><p>Welcome</p></main></templates>"));
        assert!(shop.ends_with("<templates><main><p>Welcome</p><nav/></main></templates>"));
    }

    #[test]
    fn test_open_site_validation() {
        let dir = tempfile::tempdir().unwrap();
        let broken = "views:\n  - xml_id: website.broken\n    arch: <table><td colspan=\"x\"/></table>\n";
        let config = config_for(dir.path(), broken);

        let err = open_site(&config, true).err().unwrap();
        assert!(matches!(err, CliError::View(ViewError::Validation { .. })));

        let engine = open_site(&config, false).unwrap();
        assert!(engine.validate(&[ViewId(1)]).is_err());
    }
}
