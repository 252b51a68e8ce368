use anyhow::{bail, Result};
use clap::Args;
use humantime::format_rfc3339_seconds;
use serde::Serialize;

use civic_core_types::{Category, Report, ReportFields, ReportStatus};
use civic_intake::{route, routing_table};
use civic_lifecycle::{AdvanceOutcome, LifecycleError};
use civic_report_store::ReportFilter;

use crate::cli::context::CliContext;

/// Form fields shared by `submit` and `draft save`.
#[derive(Args, Clone, Debug, Default)]
pub struct ReportFormArgs {
    /// Short summary of the issue
    #[arg(long, default_value = "")]
    pub title: String,

    /// Category, e.g. infrastructure, public-safety, environment
    #[arg(long, default_value = "")]
    pub category: String,

    /// What happened and why it matters
    #[arg(long, default_value = "")]
    pub description: String,

    /// Where the issue is
    #[arg(long, default_value = "")]
    pub location: String,

    /// low, medium or high (defaults to medium)
    #[arg(long, default_value = "")]
    pub priority: String,

    /// Make the report visible to other citizens
    #[arg(long)]
    pub public: bool,

    /// Do not attach the signed-in user to the report
    #[arg(long)]
    pub anonymous: bool,
}

impl ReportFormArgs {
    pub fn to_fields(&self) -> ReportFields {
        ReportFields {
            title: self.title.clone(),
            category: self.category.clone(),
            priority: self.priority.clone(),
            location: self.location.clone(),
            description: self.description.clone(),
            is_public: self.public,
            is_anonymous: self.anonymous,
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub form: ReportFormArgs,
}

#[derive(Args, Clone, Debug)]
pub struct ListArgs {
    /// Case-insensitive text found in the title or id
    #[arg(long)]
    pub search: Option<String>,

    /// Only reports in this status (e.g. under-review)
    #[arg(long, value_parser = parse_status)]
    pub status: Option<ReportStatus>,

    /// Only reports in this category
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Args, Clone, Debug)]
pub struct ShowArgs {
    /// Report id or unique prefix
    pub id: String,
}

#[derive(Args, Clone, Debug)]
pub struct AdvanceArgs {
    /// Report id or unique prefix
    pub id: String,
}

#[derive(Args, Clone, Debug)]
pub struct RemoveArgs {
    /// Report id or unique prefix
    pub id: String,
}

#[derive(Args, Clone, Debug)]
pub struct RouteArgs {
    /// Category to look up
    pub category: String,
}

fn parse_status(raw: &str) -> Result<ReportStatus, String> {
    ReportStatus::parse(raw).ok_or_else(|| {
        format!("unknown status `{raw}`; expected submitted, under-review, in-progress or resolved")
    })
}

/// Reports a lifecycle error in the citizen-facing wording.
pub fn lifecycle_failure(err: LifecycleError) -> anyhow::Error {
    match err {
        LifecycleError::Validation(validation) => {
            anyhow::anyhow!("Validation Error: {}", validation.errors.join(", "))
        }
        other => other.into(),
    }
}

pub fn print_report_line(report: &Report) {
    println!(
        "{:<8}  {:<13}  {:<16}  {:<6}  {}",
        report.id.short(),
        report.status().label(),
        report.category().label(),
        report.details.priority.label(),
        report.title()
    );
}

pub fn print_report_detail(report: &Report) {
    println!("{}  [{}]", report.title(), report.id);
    println!("  status:       {}", report.status().label());
    println!("  category:     {}", report.category().label());
    println!("  priority:     {}", report.details.priority.label());
    if !report.details.location.is_empty() {
        println!("  location:     {}", report.details.location);
    }
    println!(
        "  assigned to:  {}",
        report.assigned_to().unwrap_or("(not routed)")
    );
    println!("  submitted by: {}", report.submitted_by);
    println!(
        "  submitted at: {}",
        format_rfc3339_seconds(report.submitted_at().into())
    );
    println!("  {}", report.details.description);
    println!("  timeline:");
    for entry in report.timeline() {
        println!(
            "    {}  {:<13}  {}",
            format_rfc3339_seconds(entry.timestamp.into()),
            entry.status.label(),
            entry.description
        );
    }
}

pub fn cmd_submit(args: SubmitArgs, ctx: &CliContext) -> Result<()> {
    let report = ctx
        .engine()
        .submit(&args.form.to_fields())
        .map_err(lifecycle_failure)?;
    ctx.output().emit(&report, |report| {
        println!(
            "Your report has been submitted with ID: {}. You can track its progress with `civic show {}`.",
            report.id.short(),
            report.id.short()
        );
        if let Some(authority) = report.assigned_to() {
            println!("Routed to {authority}.");
        }
    })
}

pub fn cmd_list(args: ListArgs, ctx: &CliContext) -> Result<()> {
    let filter = ReportFilter {
        text: args.search,
        status: args.status,
        category: args.category.as_deref().map(Category::parse),
    };
    let reports = ctx.engine().repository().search(&filter);
    ctx.output().emit(&reports, |reports| {
        if reports.is_empty() {
            println!("No reports found.");
            return;
        }
        for report in reports {
            print_report_line(report);
        }
    })
}

pub fn cmd_show(args: ShowArgs, ctx: &CliContext) -> Result<()> {
    let id = ctx.resolve_report(&args.id)?;
    let Some(report) = ctx.engine().repository().find(&id) else {
        bail!("report not found: {id}");
    };
    ctx.output().emit(&report, print_report_detail)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdvanceView {
    #[serde(flatten)]
    outcome: AdvanceOutcome,
    report: Report,
}

pub fn cmd_advance(args: AdvanceArgs, ctx: &CliContext) -> Result<()> {
    let id = ctx.resolve_report(&args.id)?;
    let outcome = ctx.engine().advance(&id).map_err(lifecycle_failure)?;
    let Some(report) = ctx.engine().repository().find(&id) else {
        bail!("report not found: {id}");
    };
    ctx.output()
        .emit(&AdvanceView { outcome, report }, |view| match view.outcome {
            AdvanceOutcome::Advanced { from, to } => println!(
                "Report {} moved from {} to {}.",
                view.report.id.short(),
                from.label(),
                to.label()
            ),
            AdvanceOutcome::AlreadyResolved => println!(
                "Report {} is already resolved; nothing to do.",
                view.report.id.short()
            ),
        })
}

pub fn cmd_remove(args: RemoveArgs, ctx: &CliContext) -> Result<()> {
    let id = ctx.resolve_report(&args.id)?;
    let report = ctx.engine().remove(&id).map_err(lifecycle_failure)?;
    ctx.output().emit(&report, |report| {
        println!("Removed report {} ({}).", report.id.short(), report.title())
    })
}

#[derive(Serialize)]
struct RouteView {
    category: String,
    known: bool,
    authority: &'static str,
}

pub fn cmd_route(args: RouteArgs, ctx: &CliContext) -> Result<()> {
    let category = Category::parse(&args.category);
    let view = RouteView {
        authority: route(&category),
        known: category.is_known(),
        category: category.as_str().to_string(),
    };
    ctx.output().emit(&view, |view| {
        if view.known {
            println!("{} -> {}", view.category, view.authority);
        } else {
            println!(
                "{} (unrecognized category) -> {}",
                view.category, view.authority
            );
        }
    })
}

#[derive(Serialize)]
struct AuthorityRow {
    category: String,
    label: String,
    authority: &'static str,
}

pub fn cmd_authorities(ctx: &CliContext) -> Result<()> {
    let rows: Vec<AuthorityRow> = routing_table()
        .into_iter()
        .map(|(category, authority)| AuthorityRow {
            label: category.label(),
            category: category.as_str().to_string(),
            authority,
        })
        .collect();
    ctx.output().emit(&rows, |rows| {
        for row in rows {
            println!("{:<16}  {}", row.label, row.authority);
        }
    })
}
