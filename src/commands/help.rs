use poise::builtins::HelpConfiguration;

use crate::commands::context::Context;
use crate::error::Result;

/// Show the list of commands
#[poise::command(slash_command)]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Command to show the help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> Result<()> {
    let config = HelpConfiguration {
        extra_text_at_bottom: "Start a giveaway with `/giveaway start` and join it with the 🎉 reaction.",
        ephemeral: true,
        ..Default::default()
    };

    poise::builtins::help(ctx, command.as_deref(), config).await?;
    Ok(())
}
