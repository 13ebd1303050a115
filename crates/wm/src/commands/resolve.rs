//! `wm resolve` command implementation.

use std::io::Write;

use clap::Args;
use wm_views::{Scope, TemplateRef, ViewError};

use super::{GlobalArgs, session};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the resolve command.
#[derive(Args)]
pub(crate) struct ResolveArgs {
    /// Template key (`module.name`) or view id.
    template: String,

    /// Request host; without it only shared views and external ids are used.
    #[arg(long)]
    host: Option<String>,
}

impl ResolveArgs {
    /// Execute the resolve command.
    ///
    /// Prints the resolved view id on stdout and its details on stderr.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let engine = global.open(true)?;
        let session = session(&engine, self.host.as_deref(), Scope::default());

        let template = TemplateRef::parse(&self.template);
        template.require_qualified()?;
        let view_id = session.resolve(template)?;
        let view = session
            .records()
            .view(view_id)
            .ok_or_else(|| ViewError::NotFound(view_id.to_string()))?;

        writeln!(std::io::stdout().lock(), "{view_id}")?;

        output.highlight(&format!("{} ({})", view.name, view.view_type.as_str()));
        output.info(&format!("Key: {}", view.key.as_deref().unwrap_or("-")));
        match view.website_id {
            Some(website_id) => output.info(&format!("Website: {website_id}")),
            None => output.info("Website: shared"),
        }
        if view.page {
            output.info("Page: yes");
        }
        Ok(())
    }
}
