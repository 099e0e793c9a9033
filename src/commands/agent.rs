use tracing::{info, warn};

use super::send_chunked;
use crate::api::types::QueryRequest;
use crate::discord_text::{parse_key_values, preview};
use crate::{Context, Error};

const MODEL_USAGE: &str = "Usage: `model` to show the current model, or `model llm=<provider> model=<name>` to switch.";

/// Ask the selected LLM a question
#[poise::command(prefix_command, broadcast_typing)]
pub async fn query(
    ctx: Context<'_>,
    #[rest]
    #[description = "Your question"]
    prompt: String,
) -> Result<(), Error> {
    let request = {
        let selection = ctx.data().selection.read().await;
        QueryRequest {
            content: prompt,
            llm: selection.llm.clone(),
            model: selection.model.clone(),
            show_thoughts: false,
        }
    };

    info!(
        llm = %request.llm,
        model = %request.model,
        "Queried agent: {}",
        preview(&request.content, 100)
    );

    match ctx.data().api.query(&request).await {
        Ok(response) => send_chunked(ctx, &response).await?,
        Err(e) => {
            warn!("Query failed: {}", e);
            ctx.say(format!("❌ LLM Error: {}", e)).await?;
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ModelArgs {
    Show,
    Switch {
        llm: Option<String>,
        model: Option<String>,
    },
    Invalid,
}

pub(crate) fn parse_model_args(input: &str) -> ModelArgs {
    if input.trim().is_empty() {
        return ModelArgs::Show;
    }
    let mut args = parse_key_values(input);
    let llm = args.remove("llm");
    let model = args.remove("model");
    if llm.is_none() && model.is_none() {
        return ModelArgs::Invalid;
    }
    ModelArgs::Switch { llm, model }
}

/// Show or switch the LLM used by `query`
#[poise::command(prefix_command)]
pub async fn model(
    ctx: Context<'_>,
    #[rest]
    #[description = "llm=<provider> model=<name>"]
    args: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();

    match parse_model_args(args.as_deref().unwrap_or("")) {
        ModelArgs::Show => {
            let current = data.selection.read().await.clone();
            let available = match data.api.models().await {
                Ok(models) if !models.is_empty() => models.join(", "),
                Ok(_) => "none installed".to_string(),
                Err(e) => {
                    warn!("Could not list models: {}", e);
                    "unavailable".to_string()
                }
            };
            ctx.say(format!(
                "Current model: **{}** via **{}**\nLocal models: {}\nProviders: {}",
                current.model,
                current.llm,
                available,
                data.providers.names().join(", ")
            ))
            .await?;
        }
        ModelArgs::Switch { llm, model } => {
            if let Some(llm) = &llm {
                if !data.providers.contains(llm) {
                    ctx.say(format!(
                        "Unknown provider `{}`. Available: {}",
                        llm,
                        data.providers.names().join(", ")
                    ))
                    .await?;
                    return Ok(());
                }
            }

            let updated = {
                let mut selection = data.selection.write().await;
                if let Some(llm) = llm {
                    selection.llm = llm.trim().to_lowercase();
                }
                if let Some(model) = model {
                    selection.model = model;
                }
                selection.clone()
            };
            info!("Switched model to {} via {}", updated.model, updated.llm);
            ctx.say(format!(
                "Now using **{}** via **{}**",
                updated.model, updated.llm
            ))
            .await?;
        }
        ModelArgs::Invalid => {
            ctx.say(MODEL_USAGE).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_args() {
        assert_eq!(parse_model_args("   "), ModelArgs::Show);
        assert_eq!(
            parse_model_args("llm=openai model=gpt-4o"),
            ModelArgs::Switch {
                llm: Some("openai".to_string()),
                model: Some("gpt-4o".to_string()),
            }
        );
        assert_eq!(
            parse_model_args("model=llama3:8b"),
            ModelArgs::Switch {
                llm: None,
                model: Some("llama3:8b".to_string()),
            }
        );
        assert_eq!(parse_model_args("openai gpt-4o"), ModelArgs::Invalid);
        assert_eq!(parse_model_args("temperature=1"), ModelArgs::Invalid);
    }
}
