//! `wm check` command implementation.

use clap::Args;
use wm_storage::ViewQuery;
use wm_views::Scope;

use super::GlobalArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Stop at the first invalid view.
    #[arg(long)]
    fail_fast: bool,
}

impl CheckArgs {
    /// Execute the check command.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundle cannot be loaded or any view is invalid.
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let engine = global.open(false)?;
        let view_ids = engine
            .session(Scope::default())
            .records()
            .search_views(&ViewQuery::default());

        let mut failed = 0;
        for view_id in &view_ids {
            if let Err(err) = engine.validate(&[*view_id]) {
                output.error(&err.to_string());
                failed += 1;
                if self.fail_fast {
                    break;
                }
            }
        }

        if failed > 0 {
            return Err(CliError::Validation(format!(
                "{failed} of {} views are invalid",
                view_ids.len()
            )));
        }
        output.success(&format!("All {} views are valid", view_ids.len()));
        Ok(())
    }
}
