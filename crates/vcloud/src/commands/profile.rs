//! Profile store commands. None of these contact the remote.

use vcloud_core::{ProfileField, TabularResult};

use crate::cli::{ProfileArgs, ProfileOperation};
use crate::context::CommandContext;
use crate::error::CliError;

use super::util;

const COLUMNS: [&str; 6] = ["active", "name", "host", "org", "user", "vdc"];

pub fn handle(args: ProfileArgs, ctx: &mut CommandContext) -> Result<(), CliError> {
    match args.operation {
        ProfileOperation::List => {
            let active = ctx.store.active_name();
            let mut result = TabularResult::new(COLUMNS);
            for p in ctx.store.profiles() {
                let marker = if Some(p.name.as_str()) == active { "*" } else { "" };
                result.push_row([
                    marker,
                    p.name.as_str(),
                    p.host.as_str(),
                    p.org.as_str(),
                    p.user.as_str(),
                    p.vdc.as_str(),
                ])?;
            }
            let message = format!("{} profile(s)", result.len());
            ctx.renderer.emit(&result, &message)
        }

        ProfileOperation::Show => {
            let profile = match args.name.as_deref() {
                Some(name) => ctx.named_profile(name)?,
                None => ctx.require_profile()?,
            };
            let result = TabularResult::from_pairs([
                ("name", profile.name.clone()),
                ("host", profile.host.clone()),
                ("org", profile.org.clone()),
                ("user", profile.user.clone()),
                ("token", profile.token.clone()),
                ("api_version", profile.api_version.clone()),
                ("verify", profile.verify.to_string()),
                ("disable_warnings", profile.disable_warnings.to_string()),
                ("debug", profile.debug.to_string()),
                ("vdc", profile.vdc.clone()),
            ]);
            ctx.renderer.emit(&result, "")
        }

        ProfileOperation::Get => {
            let name = util::required(args.name.as_deref(), "name")?;
            let field = ProfileField::parse(util::required(args.field.as_deref(), "field")?)?;
            let value = ctx.store.get(name, field);
            let result = TabularResult::from_pairs([(field.to_string(), value)]);
            ctx.renderer.emit(&result, "")
        }

        ProfileOperation::Set => {
            let name = util::required(args.name.as_deref(), "name")?;
            let field = ProfileField::parse(util::required(args.field.as_deref(), "field")?)?;
            let value = args
                .value
                .as_deref()
                .ok_or_else(|| CliError::validation("value", "a value is required for set"))?;
            if ctx.store.profile(name).is_none() {
                return Err(CliError::ProfileNotFound {
                    name: name.to_owned(),
                    available: ctx.available_profiles(),
                });
            }
            ctx.store.set(name, field, value)?;
            ctx.renderer.emit_message(&format!("{name}: {field} updated"))
        }

        ProfileOperation::Use => {
            let name = util::required(args.name.as_deref(), "name")?;
            ctx.named_profile(name)?;
            ctx.store.activate(name)?;
            ctx.renderer.emit_message(&format!("active profile is now '{name}'"))
        }

        ProfileOperation::Delete => {
            let name = util::required(args.name.as_deref(), "name")?;
            ctx.named_profile(name)?;
            if !util::confirm(&format!("Delete profile '{name}'?"), ctx.global.yes)? {
                return Ok(());
            }
            ctx.store.remove(name)?;
            let message = match ctx.store.active_name() {
                Some(active) => format!("profile '{name}' deleted; active profile is '{active}'"),
                None => format!("profile '{name}' deleted; no profiles left"),
            };
            ctx.renderer.emit_message(&message)
        }
    }
}
