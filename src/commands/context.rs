use poise::Context as PoiseContext;

use crate::error::Error;
use crate::state::BotState;

// Generic context available across Poise commands
pub type Context<'a> = PoiseContext<'a, BotState, Error>;
