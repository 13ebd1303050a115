//! YAML site bundles.
//!
//! A bundle describes websites, menus, views, model fields, translations and
//! external ids in one YAML document and seeds a store through a
//! [`Transaction`]. Records reference each other by name (websites) or by
//! dotted external id (views, menus), never by numeric id.
//!
//! ```yaml
//! websites:
//!   - name: example.com
//! views:
//!   - xml_id: website.layout
//!     arch: "<html><body/></html>"
//!   - xml_id: website.layout_footer
//!     inherit: website.layout
//!     website: example.com
//!     arch_file: views/footer.xml
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::record::{
    ExternalRef, MenuId, NewMenu, NewView, NewWebsite, UserId, ViewId, ViewType, WEBSITE_MODEL,
    WebsiteId,
};
use crate::storage::{StorageError, Transaction};

/// Error loading or applying a bundle.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid bundle: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Unknown website: {0}")]
    UnknownWebsite(String),
    #[error("Unknown view: {0}")]
    UnknownView(String),
    #[error("Unknown menu: {0}")]
    UnknownMenu(String),
    #[error("View {0} has neither arch nor arch_file")]
    MissingArch(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Parsed site bundle.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Bundle {
    pub websites: Vec<BundleWebsite>,
    pub menus: Vec<BundleMenu>,
    pub views: Vec<BundleView>,
    /// Declared fields per model name.
    pub models: HashMap<String, Vec<String>>,
    /// Translated terms per language.
    pub translations: HashMap<String, HashMap<String, String>>,
    /// Additional external ids (e.g. users).
    pub external_ids: HashMap<String, ExternalRef>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleWebsite {
    pub name: String,
    #[serde(default)]
    pub xml_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleMenu {
    pub name: String,
    #[serde(default)]
    pub xml_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    /// External id of the parent menu.
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub sequence: i32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleView {
    pub xml_id: String,
    /// Defaults to `xml_id`.
    #[serde(default)]
    pub name: Option<String>,
    /// Defaults to `xml_id`.
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    /// External id of the extended view.
    #[serde(default)]
    pub inherit: Option<String>,
    #[serde(default, rename = "type")]
    pub view_type: ViewType,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub page: bool,
    #[serde(default)]
    pub arch: Option<String>,
    /// Path relative to the bundle file.
    #[serde(default)]
    pub arch_file: Option<PathBuf>,
}

/// Counts of records created by [`Bundle::apply`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BundleSummary {
    pub websites: usize,
    pub menus: usize,
    pub views: usize,
}

impl Bundle {
    /// Parse a bundle from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, BundleError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Read and parse a bundle file.
    pub fn load(path: &Path) -> Result<Self, BundleError> {
        let content = std::fs::read_to_string(path).map_err(|source| BundleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Create every record of the bundle in `txn`.
    ///
    /// `base_dir` resolves relative `arch_file` paths. The transaction is left
    /// uncommitted.
    pub fn apply(
        &self,
        base_dir: &Path,
        txn: &mut dyn Transaction,
    ) -> Result<BundleSummary, BundleError> {
        let mut summary = BundleSummary::default();

        let mut websites: HashMap<&str, WebsiteId> = HashMap::new();
        for website in &self.websites {
            let id = txn.create_website(NewWebsite {
                name: website.name.clone(),
                user_id: website.user_id,
                company_id: None,
            })?;
            if let Some(xml_id) = &website.xml_id {
                txn.set_xml_id(
                    xml_id,
                    ExternalRef {
                        model: WEBSITE_MODEL.to_owned(),
                        res_id: id.0,
                    },
                )?;
            }
            websites.insert(&website.name, id);
            summary.websites += 1;
        }
        let website_ref = |name: &Option<String>| -> Result<Option<WebsiteId>, BundleError> {
            name.as_deref()
                .map(|name| {
                    websites
                        .get(name)
                        .copied()
                        .ok_or_else(|| BundleError::UnknownWebsite(name.to_owned()))
                })
                .transpose()
        };

        let mut menus: HashMap<&str, MenuId> = HashMap::new();
        for menu in &self.menus {
            let parent_id = menu
                .parent
                .as_deref()
                .map(|parent| {
                    menus
                        .get(parent)
                        .copied()
                        .ok_or_else(|| BundleError::UnknownMenu(parent.to_owned()))
                })
                .transpose()?;
            let id = txn.create_menu(NewMenu {
                name: menu.name.clone(),
                url: menu.url.clone(),
                website_id: website_ref(&menu.website)?,
                parent_id,
                sequence: menu.sequence,
            })?;
            if let Some(xml_id) = &menu.xml_id {
                menus.insert(xml_id, id);
            }
            summary.menus += 1;
        }

        for view in &self.views {
            let inherit_id = match view.inherit.as_deref() {
                Some(parent) => Some(resolve_view(txn, parent)?),
                None => None,
            };
            let arch = match (&view.arch, &view.arch_file) {
                (Some(arch), _) => arch.clone(),
                (None, Some(file)) => {
                    let path = base_dir.join(file);
                    std::fs::read_to_string(&path)
                        .map_err(|source| BundleError::Io { path, source })?
                }
                (None, None) => return Err(BundleError::MissingArch(view.xml_id.clone())),
            };

            let mut new_view = NewView {
                name: view.name.clone().unwrap_or_else(|| view.xml_id.clone()),
                key: Some(view.key.clone().unwrap_or_else(|| view.xml_id.clone())),
                website_id: website_ref(&view.website)?,
                arch,
                model: view.model.clone(),
                view_type: view.view_type,
                inherit_id,
                page: view.page,
                ..NewView::default()
            };
            if let Some(priority) = view.priority {
                new_view.priority = priority;
            }

            let id = txn.create_view(new_view)?;
            txn.set_xml_id(&view.xml_id, ExternalRef::view(id))?;
            summary.views += 1;
        }

        for (model, fields) in &self.models {
            txn.set_model_fields(model, fields.clone());
        }
        for (lang, terms) in &self.translations {
            for (source, value) in terms {
                txn.set_translation(lang, source, value);
            }
        }
        for (xml_id, target) in &self.external_ids {
            txn.set_xml_id(xml_id, target.clone())?;
        }

        tracing::info!(
            websites = summary.websites,
            menus = summary.menus,
            views = summary.views,
            "Applied bundle"
        );
        Ok(summary)
    }
}

fn resolve_view(txn: &dyn Transaction, xml_id: &str) -> Result<ViewId, BundleError> {
    let target = txn
        .records()
        .resolve_xml_id(xml_id)
        .map_err(|_| BundleError::UnknownView(xml_id.to_owned()))?;
    if target.model != crate::record::VIEW_MODEL {
        return Err(BundleError::UnknownView(xml_id.to_owned()));
    }
    Ok(ViewId(target.res_id))
}
