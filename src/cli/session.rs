use clap::Args;
use stockroom::{
    auth::{Caller, Permission, models::NewUser},
    context::AppContext,
};

use super::output;

#[derive(Debug, Args)]
pub(crate) struct RegisterArgs {
    #[arg(long)]
    username: String,

    #[arg(long, env = "STOCKROOM_PASSWORD", hide_env_values = true)]
    password: String,

    /// Comma separated permission names, e.g. cart:add,cart:view
    #[arg(long, value_delimiter = ',')]
    permissions: Vec<String>,
}

#[derive(Debug, Args)]
pub(crate) struct LoginArgs {
    #[arg(long)]
    username: String,

    #[arg(long, env = "STOCKROOM_PASSWORD", hide_env_values = true)]
    password: String,
}

pub(crate) async fn register(ctx: &AppContext, args: RegisterArgs) -> Result<(), String> {
    let user = ctx
        .auth
        .register(NewUser {
            username: args.username,
            password: args.password,
            permissions: args.permissions,
        })
        .await
        .map_err(|error| format!("failed to register user: {error}"))?;

    output::line(&format!("user_id: {}", user.user_id));
    output::line(&format!("username: {}", user.username));

    Ok(())
}

pub(crate) async fn login(ctx: &AppContext, args: LoginArgs) -> Result<(), String> {
    let user = ctx
        .auth
        .login(args.username, args.password)
        .await
        .map_err(|error| format!("failed to log in: {error}"))?;

    output::line(&format!("logged in as {}", user.username));

    Ok(())
}

pub(crate) async fn logout(ctx: &AppContext) -> Result<(), String> {
    ctx.auth
        .logout()
        .await
        .map_err(|error| format!("failed to log out: {error}"))?;

    output::line("logged out");

    Ok(())
}

/// The session user, provided they hold `permission`.
pub(crate) async fn authorize(ctx: &AppContext, permission: Permission) -> Result<Caller, String> {
    let user = ctx
        .auth
        .session_user()
        .await
        .map_err(|error| format!("failed to read session: {error}"))?
        .ok_or_else(|| "you must be logged in".to_string())?;

    if !ctx.auth.has_permission(permission).await {
        return Err(format!("permission denied: {permission} is required"));
    }

    Ok(Caller::from(&user))
}

/// Checks that an "act on behalf of" target exists.
pub(crate) async fn resolve_target(
    ctx: &AppContext,
    target: Option<String>,
) -> Result<Option<String>, String> {
    match target {
        Some(target) => ctx
            .auth
            .resolve_user_id(target)
            .await
            .map(Some)
            .map_err(|error| format!("failed to find target user: {error}")),
        None => Ok(None),
    }
}
