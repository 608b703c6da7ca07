use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{ChatId, ParseMode, Recipient, UserId},
};
use url::Url;

use crate::{
    config::{Config, PostTemplate},
    funnel::{lead::Lead, CHANNEL_MARKER},
    platform::{MembershipStatus, Platform, PlatformResult, Reply},
};

use self::render::Links;

pub mod render;

/// `Platform` backed by the Telegram Bot API.
pub struct TelegramPlatform {
    bot: Bot,
    channel: Recipient,
    admin: UserId,
    links: Links,
    post: PostTemplate,
}

impl TelegramPlatform {
    pub fn new(bot: Bot, config: &Config, bot_username: &str) -> Result<Self, url::ParseError> {
        let mut deep_link = Url::parse("https://t.me/")?.join(bot_username)?;
        deep_link.query_pairs_mut().append_pair("start", CHANNEL_MARKER);

        Ok(Self {
            bot,
            channel: config.channel.clone(),
            admin: config.admin_id,
            links: Links {
                channel: config.channel_url.clone(),
                deep_link,
            },
            post: config.post.clone(),
        })
    }
}

#[async_trait]
impl Platform for TelegramPlatform {
    async fn membership(&self, user: UserId) -> PlatformResult<MembershipStatus> {
        let member = self
            .bot
            .get_chat_member(self.channel.clone(), user)
            .await?;
        Ok(member.kind.status().into())
    }

    async fn send(&self, to: UserId, reply: Reply) -> PlatformResult<()> {
        let (text, markup) = render::reply(&reply, &self.links);
        let request = self
            .bot
            .send_message(ChatId(to.0 as i64), text)
            .parse_mode(ParseMode::Html);
        match markup {
            Some(markup) => request.reply_markup(markup).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn answer(&self, query_id: &str, notice: Option<Reply>) -> PlatformResult<()> {
        let request = self.bot.answer_callback_query(query_id);
        match notice {
            Some(notice) => request.text(render::notice(&notice)).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn forward_lead(&self, lead: &Lead) -> PlatformResult<()> {
        self.bot
            .send_message(ChatId(self.admin.0 as i64), render::lead(lead))
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn publish_post(&self) -> PlatformResult<()> {
        self.bot
            .send_message(self.channel.clone(), &self.post.text)
            .parse_mode(ParseMode::Html)
            .reply_markup(render::post_keyboard(&self.post.button, &self.links.deep_link))
            .await?;
        Ok(())
    }
}
