use anyhow::Result;
use clap::{Args, Subcommand};
use humantime::format_rfc3339_seconds;

use civic_core_types::Draft;

use super::report::{lifecycle_failure, ReportFormArgs};
use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct DraftArgs {
    #[command(subcommand)]
    pub action: DraftAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum DraftAction {
    /// Save the form as a draft without validating it
    Save(ReportFormArgs),

    /// List saved drafts
    List,

    /// Validate and submit a draft; it is removed on success
    Submit {
        /// Draft id or unique prefix
        id: String,
    },

    /// Delete a draft
    Discard {
        /// Draft id or unique prefix
        id: String,
    },
}

fn print_draft_line(draft: &Draft) {
    let title = if draft.fields.title.is_empty() {
        "(untitled)"
    } else {
        draft.fields.title.as_str()
    };
    println!(
        "{:<8}  {}  {}",
        draft.id.0.get(..8).unwrap_or(&draft.id.0),
        format_rfc3339_seconds(draft.saved_at.into()),
        title
    );
}

pub fn cmd_draft(args: DraftArgs, ctx: &CliContext) -> Result<()> {
    let engine = ctx.engine();
    match args.action {
        DraftAction::Save(form) => {
            let draft = engine.save_draft(&form.to_fields());
            ctx.output().emit(&draft, |draft| {
                println!("Your report has been saved as a draft ({}).", draft.id)
            })
        }
        DraftAction::List => {
            let drafts = engine.repository().drafts();
            ctx.output().emit(&drafts, |drafts| {
                if drafts.is_empty() {
                    println!("No drafts saved.");
                }
                for draft in drafts {
                    print_draft_line(draft);
                }
            })
        }
        DraftAction::Submit { id } => {
            let id = ctx.resolve_draft(&id)?;
            let report = engine.submit_draft(&id).map_err(lifecycle_failure)?;
            ctx.output().emit(&report, |report| {
                println!(
                    "Draft submitted as report {} and routed to {}.",
                    report.id.short(),
                    report.assigned_to().unwrap_or("nobody")
                )
            })
        }
        DraftAction::Discard { id } => {
            let id = ctx.resolve_draft(&id)?;
            let draft = engine.discard_draft(&id).map_err(lifecycle_failure)?;
            ctx.output()
                .emit(&draft, |draft| println!("Draft {} discarded.", draft.id))
        }
    }
}
