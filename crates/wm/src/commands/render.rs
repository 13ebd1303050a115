//! `wm render` command implementation.

use std::io::Write;

use clap::Args;
use wm_views::{Scope, TemplateRef};

use super::{GlobalArgs, session};
use crate::error::CliError;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Template key (`module.name`) or view id.
    template: String,

    /// Request host; without it only shared views and fragments apply.
    #[arg(long)]
    host: Option<String>,

    /// Translate into this language.
    #[arg(long)]
    lang: Option<String>,

    /// Emit editor branding markers.
    #[arg(long)]
    branding: bool,
}

impl RenderArgs {
    /// Execute the render command.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let engine = global.open(true)?;

        let mut scope = Scope::default().with_branding(self.branding);
        if let Some(lang) = self.lang {
            scope = scope.with_lang(lang);
        }
        let session = session(&engine, self.host.as_deref(), scope);
        let rendered = session.read_template(TemplateRef::parse(&self.template))?;

        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{rendered}")?;
        Ok(())
    }
}
