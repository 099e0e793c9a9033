use tracing::{debug, warn};

use crate::api::types::Health;
use crate::{Context, Error};

/// Responds with "Pong!", echoing an optional message
#[poise::command(prefix_command)]
pub async fn ping(ctx: Context<'_>, #[rest] msg: Option<String>) -> Result<(), Error> {
    debug!("Pong!");
    match msg {
        Some(msg) => ctx.say(format!("Pong!\n{}", msg)).await?,
        None => ctx.say("Pong!").await?,
    };
    Ok(())
}

/// Check the backend API. Verbosity 2 lists providers, 3 also checks local inference.
#[poise::command(prefix_command)]
pub async fn health(ctx: Context<'_>, verbosity: Option<i64>) -> Result<(), Error> {
    let verbosity = verbosity.unwrap_or(1);
    match ctx.data().api.health(verbosity).await {
        Ok(report) => {
            let word = match report.health {
                Health::Healthy => "Healthy",
                Health::Unhealthy => "Unhealthy",
            };
            let reply = match report.providers {
                Some(providers) => format!("{}\nProviders: {}", word, providers.join(", ")),
                None => word.to_string(),
            };
            ctx.say(reply).await?;
        }
        Err(e) => {
            warn!("Health check against {} failed: {}", ctx.data().api.base_url(), e);
            ctx.say(format!("Unhealthy ({})", e)).await?;
        }
    }
    Ok(())
}
