use anyhow::Result;
use serde_json::json;

use crate::cli::context::CliContext;

pub fn cmd_seed(ctx: &CliContext) -> Result<()> {
    let inserted = ctx.engine().seed_demo()?;
    let payload = json!({ "inserted": inserted, "total": ctx.engine().repository().len() });
    ctx.output().emit(&payload, |_| {
        if inserted == 0 {
            println!("Store already holds reports; demo data not added.");
        } else {
            println!("Added {inserted} demo reports.");
        }
    })
}
