use anyhow::Result;
use clap::Args;
use serde_json::json;

use civic_core_types::Settings;
use civic_intake::Registration;

use super::report::lifecycle_failure;
use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct RegisterArgs {
    /// Full name
    #[arg(long, default_value = "")]
    pub name: String,

    /// Contact e-mail
    #[arg(long, default_value = "")]
    pub email: String,

    #[arg(long)]
    pub phone: Option<String>,

    /// Home area or ward
    #[arg(long)]
    pub location: Option<String>,
}

#[derive(Args, Clone, Debug, Default)]
pub struct SettingsArgs {
    #[arg(long)]
    pub high_contrast: Option<bool>,

    #[arg(long)]
    pub large_text: Option<bool>,

    #[arg(long)]
    pub screen_reader: Option<bool>,

    /// Interface language code, e.g. en, es, fr
    #[arg(long)]
    pub language: Option<String>,

    #[arg(long)]
    pub email_notifications: Option<bool>,

    #[arg(long)]
    pub sms_notifications: Option<bool>,
}

impl SettingsArgs {
    fn is_empty(&self) -> bool {
        self.high_contrast.is_none()
            && self.large_text.is_none()
            && self.screen_reader.is_none()
            && self.language.is_none()
            && self.email_notifications.is_none()
            && self.sms_notifications.is_none()
    }

    fn apply(self, mut settings: Settings) -> Settings {
        if let Some(value) = self.high_contrast {
            settings.high_contrast = value;
        }
        if let Some(value) = self.large_text {
            settings.large_text = value;
        }
        if let Some(value) = self.screen_reader {
            settings.screen_reader = value;
        }
        if let Some(language) = self.language.filter(|lang| !lang.trim().is_empty()) {
            settings.language = language.trim().to_string();
        }
        if let Some(value) = self.email_notifications {
            settings.email_notifications = value;
        }
        if let Some(value) = self.sms_notifications {
            settings.sms_notifications = value;
        }
        settings
    }
}

pub fn cmd_register(args: RegisterArgs, ctx: &CliContext) -> Result<()> {
    let registration = Registration {
        name: args.name,
        email: args.email,
        phone: args.phone,
        location: args.location,
    };
    let user = ctx
        .engine()
        .register_user(&registration)
        .map_err(lifecycle_failure)?;
    ctx.output().emit(&user, |user| {
        println!(
            "Welcome, {}! Your account has been created and verified.",
            user.name
        )
    })
}

pub fn cmd_settings(args: SettingsArgs, ctx: &CliContext) -> Result<()> {
    let repo = ctx.engine().repository();
    let settings = if args.is_empty() {
        repo.settings()
    } else {
        let updated = args.apply(repo.settings());
        ctx.engine().update_settings(updated.clone());
        updated
    };
    ctx.output().emit(&settings, |settings| {
        let flag = |on: bool| if on { "on" } else { "off" };
        println!("high contrast:        {}", flag(settings.high_contrast));
        println!("large text:           {}", flag(settings.large_text));
        println!("screen reader:        {}", flag(settings.screen_reader));
        println!("language:             {}", settings.language);
        println!("email notifications:  {}", flag(settings.email_notifications));
        println!("sms notifications:    {}", flag(settings.sms_notifications));
    })
}

pub fn cmd_logout(ctx: &CliContext) -> Result<()> {
    ctx.engine().logout().map_err(lifecycle_failure)?;
    let payload = json!({ "loggedOut": true });
    ctx.output()
        .emit(&payload, |_| println!("Signed out. Local data has been cleared."))
}
