//! Record types stored by the view store.
//!
//! Views and websites are plain records: website ownership is an explicit
//! `website_id` field rather than a specialization of the view type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Model name of view records in the external id namespace.
pub const VIEW_MODEL: &str = "ir.ui.view";
/// Model name of user records in the external id namespace.
pub const USER_MODEL: &str = "res.users";
/// Model name of website records in the external id namespace.
pub const WEBSITE_MODEL: &str = "website";

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

record_id!(
    /// Identifier of a [`View`].
    ViewId
);
record_id!(
    /// Identifier of a [`Website`].
    WebsiteId
);
record_id!(
    /// Identifier of a [`Menu`].
    MenuId
);
record_id!(
    /// Identifier of a user (acting identity).
    UserId
);
record_id!(
    /// Identifier of a company.
    CompanyId
);

/// Store generation, bumped by every committed transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Generation(pub u64);

impl Generation {
    /// The generation following this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// View type discriminator.
///
/// `Qweb` views are markup templates; every other type is a structured view
/// bound to a model and validated against its fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    #[default]
    Qweb,
    Form,
    Tree,
    Search,
    Kanban,
}

impl ViewType {
    /// True for markup-templating views.
    #[must_use]
    pub fn is_template(self) -> bool {
        matches!(self, Self::Qweb)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Qweb => "qweb",
            Self::Form => "form",
            Self::Tree => "tree",
            Self::Search => "search",
            Self::Kanban => "kanban",
        }
    }
}

/// A stored markup fragment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    pub id: ViewId,
    /// Display name.
    pub name: String,
    /// Symbolic name, unique per website.
    pub key: Option<String>,
    /// Owning website. `None` means shared by every website.
    pub website_id: Option<WebsiteId>,
    /// Markup payload.
    pub arch: String,
    /// Model rendered by the view. Fragments only extend views of the same model.
    pub model: Option<String>,
    #[serde(rename = "type")]
    pub view_type: ViewType,
    /// View extended by this fragment. `None` for root views.
    pub inherit_id: Option<ViewId>,
    /// Application order among fragments of the same parent (lower first).
    pub priority: u32,
    /// Standalone addressable page rather than a reusable fragment.
    pub page: bool,
}

/// Values for a view about to be created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewView {
    pub name: String,
    pub key: Option<String>,
    pub website_id: Option<WebsiteId>,
    pub arch: String,
    pub model: Option<String>,
    pub view_type: ViewType,
    pub inherit_id: Option<ViewId>,
    pub priority: u32,
    pub page: bool,
}

impl Default for NewView {
    fn default() -> Self {
        Self {
            name: String::new(),
            key: None,
            website_id: None,
            arch: String::new(),
            model: None,
            view_type: ViewType::default(),
            inherit_id: None,
            priority: 16,
            page: false,
        }
    }
}

impl NewView {
    /// A markup template with the given name and arch.
    #[must_use]
    pub fn qweb(name: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arch: arch.into(),
            ..Self::default()
        }
    }

    /// A structured view of `view_type` rendering `model`.
    #[must_use]
    pub fn structured(
        name: impl Into<String>,
        view_type: ViewType,
        model: impl Into<String>,
        arch: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            arch: arch.into(),
            model: Some(model.into()),
            view_type,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_website(mut self, website_id: WebsiteId) -> Self {
        self.website_id = Some(website_id);
        self
    }

    #[must_use]
    pub fn inheriting(mut self, parent: ViewId) -> Self {
        self.inherit_id = Some(parent);
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn as_page(mut self) -> Self {
        self.page = true;
        self
    }

    pub(crate) fn into_view(self, id: ViewId) -> View {
        View {
            id,
            name: self.name,
            key: self.key,
            website_id: self.website_id,
            arch: self.arch,
            model: self.model,
            view_type: self.view_type,
            inherit_id: self.inherit_id,
            priority: self.priority,
            page: self.page,
        }
    }
}

/// Partial update of a view. `None` leaves the field unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewUpdate {
    pub name: Option<String>,
    pub key: Option<Option<String>>,
    pub website_id: Option<Option<WebsiteId>>,
    pub arch: Option<String>,
    pub priority: Option<u32>,
    pub page: Option<bool>,
}

impl ViewUpdate {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn key(mut self, key: Option<String>) -> Self {
        self.key = Some(key);
        self
    }

    #[must_use]
    pub fn website(mut self, website_id: Option<WebsiteId>) -> Self {
        self.website_id = Some(website_id);
        self
    }

    #[must_use]
    pub fn arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = Some(arch.into());
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn page(mut self, page: bool) -> Self {
        self.page = Some(page);
        self
    }

    pub(crate) fn apply(&self, view: &mut View) {
        if let Some(name) = &self.name {
            view.name.clone_from(name);
        }
        if let Some(key) = &self.key {
            view.key.clone_from(key);
        }
        if let Some(website_id) = self.website_id {
            view.website_id = website_id;
        }
        if let Some(arch) = &self.arch {
            view.arch.clone_from(arch);
        }
        if let Some(priority) = self.priority {
            view.priority = priority;
        }
        if let Some(page) = self.page {
            view.page = page;
        }
    }
}

/// A tenant identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Website {
    pub id: WebsiteId,
    /// Host name matched against inbound requests.
    pub name: String,
    /// Acting identity for anonymous visitors.
    pub user_id: Option<UserId>,
    pub company_id: Option<CompanyId>,
}

/// Values for a website about to be created.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewWebsite {
    pub name: String,
    pub user_id: Option<UserId>,
    pub company_id: Option<CompanyId>,
}

impl NewWebsite {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// Navigation menu entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    pub id: MenuId,
    pub name: String,
    pub url: Option<String>,
    pub website_id: Option<WebsiteId>,
    pub parent_id: Option<MenuId>,
    pub sequence: i32,
}

/// Values for a menu about to be created.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewMenu {
    pub name: String,
    pub url: Option<String>,
    pub website_id: Option<WebsiteId>,
    pub parent_id: Option<MenuId>,
    pub sequence: i32,
}

/// Partial update of a menu.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MenuUpdate {
    pub name: Option<String>,
    pub website_id: Option<Option<WebsiteId>>,
    pub parent_id: Option<Option<MenuId>>,
    pub sequence: Option<i32>,
}

impl MenuUpdate {
    pub(crate) fn apply(&self, menu: &mut Menu) {
        if let Some(name) = &self.name {
            menu.name.clone_from(name);
        }
        if let Some(website_id) = self.website_id {
            menu.website_id = website_id;
        }
        if let Some(parent_id) = self.parent_id {
            menu.parent_id = parent_id;
        }
        if let Some(sequence) = self.sequence {
            menu.sequence = sequence;
        }
    }
}

/// Target of a dotted external id (`module.name`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRef {
    pub model: String,
    pub res_id: u64,
}

impl ExternalRef {
    #[must_use]
    pub fn view(id: ViewId) -> Self {
        Self {
            model: VIEW_MODEL.to_owned(),
            res_id: id.0,
        }
    }

    #[must_use]
    pub fn user(id: UserId) -> Self {
        Self {
            model: USER_MODEL.to_owned(),
            res_id: id.0,
        }
    }
}

/// A view extending another, as returned by the inheritance chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    pub view_id: ViewId,
    pub website_id: Option<WebsiteId>,
    pub arch: String,
}
