use clap::Subcommand;
use serde_json::json;

use super::{open_context, print_json, CliResult};

#[derive(Subcommand)]
pub enum SessionsAction {
    /// Print every saved session as JSON
    List,
    /// Delete the whole session history
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: SessionsAction) -> CliResult {
    let ctx = open_context()?;

    match action {
        SessionsAction::List => print_json(&ctx.try_sessions()?)?,
        SessionsAction::Clear { yes } => {
            if !yes {
                return Err("refusing to clear sessions without --yes".into());
            }
            let removed = ctx.sessions().len();
            if !ctx.clear_sessions() {
                return Err("failed to clear sessions".into());
            }
            print_json(&json!({ "cleared": removed }))?;
        }
    }
    Ok(())
}
