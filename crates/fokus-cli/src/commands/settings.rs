use clap::{Subcommand, ValueEnum};

use super::{open_context, print_json, CliResult};

#[derive(Clone, Copy, ValueEnum)]
pub enum Step {
    #[value(alias = "+")]
    Up,
    #[value(alias = "-")]
    Down,
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the current settings as JSON
    Show,
    /// Step the work duration by 5 minutes
    Work {
        #[arg(value_enum)]
        step: Step,
    },
    /// Step the break duration by 1 minute
    Break {
        #[arg(value_enum)]
        step: Step,
    },
    /// Switch between dark and light theme
    Theme,
    /// Pick the category for the next sessions
    Category {
        /// One of the configured categories
        name: String,
    },
}

pub fn run(action: SettingsAction) -> CliResult {
    let mut ctx = open_context()?;

    match action {
        SettingsAction::Show => {}
        SettingsAction::Work { step } => {
            ctx.adjust_work(matches!(step, Step::Up));
        }
        SettingsAction::Break { step } => {
            ctx.adjust_break(matches!(step, Step::Up));
        }
        SettingsAction::Theme => {
            ctx.toggle_theme();
        }
        SettingsAction::Category { name } => {
            let categories = &ctx.config().categories;
            if !categories.iter().any(|c| *c == name) {
                return Err(format!(
                    "unknown category: {name} (expected one of: {})",
                    categories.join(", ")
                )
                .into());
            }
            ctx.set_category(&name);
        }
    }
    print_json(ctx.settings())
}
