use super::account::{cmd_logout, cmd_register, cmd_settings};
use super::config::cmd_config;
use super::dashboard::cmd_dashboard;
use super::demo::cmd_seed;
use super::draft::cmd_draft;
use super::env::CliArgs;
use super::report::{
    cmd_advance, cmd_authorities, cmd_list, cmd_remove, cmd_route, cmd_show, cmd_submit,
};
use super::simulate::cmd_simulate;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Submit(args) => cmd_submit(args, ctx),
        Commands::Draft(args) => cmd_draft(args, ctx),
        Commands::List(args) => cmd_list(args, ctx),
        Commands::Show(args) => cmd_show(args, ctx),
        Commands::Advance(args) => cmd_advance(args, ctx),
        Commands::Remove(args) => cmd_remove(args, ctx),
        Commands::Simulate(args) => cmd_simulate(args, ctx).await,
        Commands::Dashboard => cmd_dashboard(ctx),
        Commands::Route(args) => cmd_route(args, ctx),
        Commands::Authorities => cmd_authorities(ctx),
        Commands::Register(args) => cmd_register(args, ctx),
        Commands::Settings(args) => cmd_settings(args, ctx),
        Commands::Logout => cmd_logout(ctx),
        Commands::Seed => cmd_seed(ctx),
        Commands::Config(args) => cmd_config(args, ctx),
    }
}
