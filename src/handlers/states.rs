use std::sync::Arc;

use teloxide::{
    dispatching::{UpdateFilterExt, UpdateHandler},
    prelude::*,
    types::Update,
    utils::command::BotCommands,
};

use crate::{
    funnel::{session::InMemSessionStore, Funnel, Sender},
    telegram::{render, TelegramPlatform},
};

use super::{admin, visitor};

pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type HandlerResult = Result<(), HandlerError>;
pub type AppFunnel = Arc<Funnel<InMemSessionStore, TelegramPlatform>>;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    /// Get a free reading.
    Start(String),
    /// Go to admin panel.
    Admin,
    /// Publish the post to the channel.
    Publish,
}

async fn command(funnel: AppFunnel, sender: Sender, cmd: Command) -> HandlerResult {
    match cmd {
        Command::Start(payload) => visitor::start(funnel, sender, payload).await,
        Command::Admin => admin::panel(funnel, sender).await,
        Command::Publish => admin::publish(funnel, sender).await,
    }
}

async fn callback(funnel: AppFunnel, q: CallbackQuery) -> HandlerResult {
    let sender = Sender::from(&q.from);
    match q.data.as_deref() {
        Some(render::CHECK_SUBSCRIPTION) => visitor::recheck(funnel, sender, q.id).await,
        Some(render::PUBLISH) => admin::publish_button(funnel, sender, q.id).await,
        _ => {
            log::warn!("unknown callback data {:?} from user {}", q.data, sender.id.0);
            Ok(())
        }
    }
}

pub fn schema() -> UpdateHandler<HandlerError> {
    let command_handler = teloxide::filter_command::<Command, _>().endpoint(command);

    let message_handler = Update::filter_message()
        .filter(|msg: Message| msg.chat.is_private())
        .filter_map(|msg: Message| msg.from().map(Sender::from))
        .branch(command_handler)
        .branch(dptree::endpoint(visitor::message));

    let callback_handler = Update::filter_callback_query().endpoint(callback);

    dptree::entry()
        .branch(message_handler)
        .branch(callback_handler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_start_with_and_without_payload() {
        assert_eq!(
            Command::parse("/start", "matrix_bot").unwrap(),
            Command::Start(String::new())
        );
        assert_eq!(
            Command::parse("/start from_channel", "matrix_bot").unwrap(),
            Command::Start("from_channel".into())
        );
        assert_eq!(Command::parse("/admin", "matrix_bot").unwrap(), Command::Admin);
        assert_eq!(
            Command::parse("/publish@matrix_bot", "matrix_bot").unwrap(),
            Command::Publish
        );
    }

    #[test]
    fn free_text_is_not_a_command() {
        assert!(Command::parse("15.08.1990", "matrix_bot").is_err());
    }
}
