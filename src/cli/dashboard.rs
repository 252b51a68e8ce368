use anyhow::Result;
use humantime::format_rfc3339_seconds;

use civic_core_types::Category;

use crate::cli::context::CliContext;

pub fn cmd_dashboard(ctx: &CliContext) -> Result<()> {
    let stats = ctx.engine().repository().stats();
    ctx.output().emit(&stats, |stats| {
        println!(
            "Total reports: {}   Resolved: {}   Pending: {}",
            stats.total, stats.resolved, stats.pending
        );
        if !stats.by_category.is_empty() {
            println!();
            println!("Reports by category:");
            for (category, count) in &stats.by_category {
                println!("  {:<16} {}", Category::parse(category).label(), count);
            }
        }
        println!();
        println!("Recent activity:");
        if stats.recent.is_empty() {
            println!("  No recent activity");
        }
        for item in &stats.recent {
            println!(
                "  {}  {:<13}  {}",
                format_rfc3339_seconds(item.submitted_at.into()),
                item.status.label(),
                item.title
            );
        }
    })
}
