use clap::Subcommand;

use super::account::{RegisterArgs, SettingsArgs};
use super::config::ConfigArgs;
use super::draft::DraftArgs;
use super::report::{
    AdvanceArgs, ListArgs, RemoveArgs, RouteArgs, ShowArgs, SubmitArgs,
};
use super::simulate::SimulateArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Submit a new report; it is validated and routed immediately
    Submit(SubmitArgs),

    /// Save, list, submit or discard drafts
    Draft(DraftArgs),

    /// List reports, newest first
    List(ListArgs),

    /// Show one report with its timeline
    Show(ShowArgs),

    /// Move a report one step along its lifecycle
    Advance(AdvanceArgs),

    /// Delete a report
    Remove(RemoveArgs),

    /// Let the scheduler advance every pending report, staggered
    Simulate(SimulateArgs),

    /// Totals, per-category counts and recent activity
    Dashboard,

    /// Show which authority handles a category
    Route(RouteArgs),

    /// Print the category routing table
    Authorities,

    /// Register and sign in
    Register(RegisterArgs),

    /// Show or change accessibility and notification settings
    Settings(SettingsArgs),

    /// Sign out and wipe local data
    Logout,

    /// Insert the demo reports into an empty store
    Seed,

    /// Inspect the effective configuration
    Config(ConfigArgs),
}
