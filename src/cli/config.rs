use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use civic_connect_cli::AppConfig;

use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the configuration in effect
    Show,

    /// Print where configuration and data are read from
    Paths,
}

#[derive(Serialize)]
struct PathsView {
    config: String,
    config_exists: bool,
    data: String,
    data_exists: bool,
}

pub fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let effective = AppConfig {
                data_path: Some(ctx.data_path().to_path_buf()),
                offline: ctx.engine().is_offline(),
                ..ctx.config().clone()
            };
            ctx.output().emit(&effective, |config| {
                println!("Current configuration ({}):", ctx.config_path().display());
                match serde_yaml::to_string(config) {
                    Ok(yaml) => print!("{yaml}"),
                    Err(err) => println!("  <unprintable: {err}>"),
                }
            })
        }
        ConfigAction::Paths => {
            let view = PathsView {
                config: ctx.config_path().display().to_string(),
                config_exists: ctx.config_path().exists(),
                data: ctx.data_path().display().to_string(),
                data_exists: ctx.data_path().exists(),
            };
            ctx.output().emit(&view, |view| {
                println!(
                    "config: {}{}",
                    view.config,
                    if view.config_exists { "" } else { " (missing, defaults used)" }
                );
                println!(
                    "data:   {}{}",
                    view.data,
                    if view.data_exists { "" } else { " (not created yet)" }
                );
            })
        }
    }
}
