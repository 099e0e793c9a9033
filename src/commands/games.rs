use rand::seq::SliceRandom;
use tracing::info;

use crate::{Context, Error};

/// Flip a coin
#[poise::command(prefix_command)]
pub async fn coinflip(ctx: Context<'_>) -> Result<(), Error> {
    let result = if rand::random::<bool>() { "Heads" } else { "Tails" };
    ctx.say(format!("The coin landed on **{}**", result)).await?;
    info!("The coin landed on {}", result);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hand {
    Rock,
    Paper,
    Scissors,
}

impl Hand {
    const ALL: [Hand; 3] = [Hand::Rock, Hand::Paper, Hand::Scissors];

    fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "rock" => Some(Hand::Rock),
            "paper" => Some(Hand::Paper),
            "scissors" => Some(Hand::Scissors),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Hand::Rock => "rock",
            Hand::Paper => "paper",
            Hand::Scissors => "scissors",
        }
    }

    fn beats(&self, other: Hand) -> bool {
        matches!(
            (self, other),
            (Hand::Rock, Hand::Scissors) | (Hand::Paper, Hand::Rock) | (Hand::Scissors, Hand::Paper)
        )
    }
}

pub(crate) fn rps_outcome(player: Hand, bot: Hand) -> &'static str {
    if player == bot {
        "It's a tie!"
    } else if player.beats(bot) {
        "You won!"
    } else {
        "I win!"
    }
}

/// Play rock-paper-scissors against the bot
#[poise::command(prefix_command, user_cooldown = 5)]
pub async fn rps(ctx: Context<'_>, choice: String) -> Result<(), Error> {
    let Some(player) = Hand::parse(&choice) else {
        ctx.say("Please choose 'rock', 'paper', or 'scissors'.").await?;
        return Ok(());
    };

    let bot = *Hand::ALL
        .choose(&mut rand::thread_rng())
        .unwrap_or(&Hand::Rock);
    let outcome = rps_outcome(player, bot);

    ctx.say(format!(
        "You chose **{}**, I chose **{}**. {}",
        player.as_str(),
        bot.as_str(),
        outcome
    ))
    .await?;
    info!(
        "{} chose {}, I chose {}. {}",
        ctx.author().name,
        player.as_str(),
        bot.as_str(),
        outcome
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rps_outcomes() {
        assert_eq!(rps_outcome(Hand::Rock, Hand::Scissors), "You won!");
        assert_eq!(rps_outcome(Hand::Paper, Hand::Rock), "You won!");
        assert_eq!(rps_outcome(Hand::Scissors, Hand::Paper), "You won!");
        assert_eq!(rps_outcome(Hand::Rock, Hand::Paper), "I win!");
        assert_eq!(rps_outcome(Hand::Scissors, Hand::Scissors), "It's a tie!");
    }

    #[test]
    fn test_hand_parsing_ignores_case() {
        assert_eq!(Hand::parse(" ROCK "), Some(Hand::Rock));
        assert_eq!(Hand::parse("Scissors"), Some(Hand::Scissors));
        assert_eq!(Hand::parse("lizard"), None);
    }
}
