//! Session commands: login, logout, status.

use secrecy::SecretString;
use tracing::debug;
use vcloud_core::{Credentials, Profile, ProfileField, TabularResult};

use crate::cli::LoginArgs;
use crate::context::{CommandContext, Connection};
use crate::error::CliError;

pub async fn login(args: LoginArgs, ctx: &mut CommandContext) -> Result<(), CliError> {
    let name = args.profile_name.trim().to_owned();
    if name.is_empty() {
        return Err(CliError::validation("profile-name", "cannot be empty"));
    }

    let mut profile = ctx
        .store
        .profile(&name)
        .cloned()
        .unwrap_or_else(|| Profile::new(&name));

    // A different endpoint invalidates the remembered VDC.
    if profile.host != args.host || profile.org != args.org {
        profile.vdc.clear();
    }
    profile.host = args.host;
    profile.org.clone_from(&args.org);
    profile.user.clone_from(&args.user);
    profile.api_version = args.api_version;
    profile.verify = !args.insecure;
    profile.disable_warnings = args.disable_warnings;
    profile.debug = args.debug;

    let credentials = match args.token {
        Some(token) => Credentials::Token(SecretString::from(token)),
        None => {
            let password = match args.password {
                Some(pw) => pw,
                None => rpassword::prompt_password(format!("{}@{} password: ", args.user, args.org))?,
            };
            Credentials::Password {
                user: args.user,
                org: args.org,
                password: SecretString::from(password),
            }
        }
    };

    let conn = Connection::open(ctx, profile.clone())?;
    let outcome = conn.sessions().login(&profile, credentials).await?;
    debug!(profile = %name, "persisting session token");
    ctx.store.upsert(outcome.profile)?;

    let session = outcome.session;
    let result = TabularResult::from_pairs([
        ("profile", name.clone()),
        ("host", session.host().to_owned()),
        ("org", session.org().to_owned()),
        ("user", session.user().to_owned()),
        ("roles", session.roles().join(", ")),
    ]);
    ctx.renderer.emit(
        &result,
        &format!("{} logged in, profile '{name}'", session.user()),
    )
}

pub async fn logout(ctx: &mut CommandContext) -> Result<(), CliError> {
    let profile = ctx.require_profile()?;
    let conn = Connection::open(ctx, profile.clone())?;
    conn.sessions().logout(&profile).await?;
    ctx.store.set(&profile.name, ProfileField::Token, "")?;
    ctx.renderer
        .emit_message(&format!("{} logged out, profile '{}'", profile.user, profile.name))
}

pub async fn status(ctx: &mut CommandContext) -> Result<(), CliError> {
    let conn = Connection::authorize(ctx).await?;
    let Some(session) = conn.session() else {
        return Err(CliError::Internal("authorized connection has no session".into()));
    };

    let profile = conn.profile();
    let result = TabularResult::from_pairs([
        ("profile", profile.name.clone()),
        ("host", session.host().to_owned()),
        ("org", session.org().to_owned()),
        ("user", session.user().to_owned()),
        ("vdc", session.vdc().unwrap_or_default().to_owned()),
        ("api_version", profile.api_version.clone()),
        ("session", conn.sessions().state(&profile.name).await.to_string()),
        ("verified_at", session.established_at().to_rfc3339()),
    ]);
    ctx.renderer.emit(&result, "session is valid")
}
