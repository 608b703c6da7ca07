use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{Local, NaiveDate};
use teloxide::types::{User, UserId};

use crate::{
    error::PlatformError,
    platform::{Platform, PlatformResult, Reply},
};

use self::{
    date::{parse_birth_date, BirthDate},
    lead::Lead,
    session::{SessionStore, Stage},
};

pub mod date;
pub mod lead;
pub mod session;

/// `/start` payload carried by the channel post's deep link.
pub const CHANNEL_MARKER: &str = "from_channel";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: UserId,
    pub username: Option<String>,
}

impl From<&User> for Sender {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySource {
    Organic,
    Channel,
}

impl EntrySource {
    pub fn from_payload(payload: &str) -> Self {
        if payload.trim() == CHANNEL_MARKER {
            EntrySource::Channel
        } else {
            EntrySource::Organic
        }
    }
}

/// Tracks each user's stage and drives them from the subscription gate to a
/// forwarded lead.
pub struct Funnel<S, P> {
    sessions: S,
    platform: P,
    admin: UserId,
    collect_question: bool,
    leads: AtomicUsize,
}

impl<S: SessionStore, P: Platform> Funnel<S, P> {
    pub fn new(sessions: S, platform: P, admin: UserId, collect_question: bool) -> Self {
        Self {
            sessions,
            platform,
            admin,
            collect_question,
            leads: AtomicUsize::new(0),
        }
    }

    pub fn is_admin(&self, user: UserId) -> bool {
        user == self.admin
    }

    pub async fn on_start(&self, sender: &Sender, source: EntrySource) -> PlatformResult<()> {
        if self.is_admin(sender.id) && source == EntrySource::Organic {
            return self.on_admin_panel(sender).await;
        }
        log::info!("user {} entered the funnel ({source:?})", sender.id.0);
        self.enter(sender).await
    }

    pub async fn on_recheck(&self, sender: &Sender, query_id: &str) -> PlatformResult<()> {
        match self.platform.membership(sender.id).await {
            Ok(status) if status.is_subscribed() => {
                if let Err(e) = self.platform.answer(query_id, None).await {
                    report("button answer", sender, &e);
                }
                self.advance(sender, Reply::DatePrompt, Stage::AwaitingDate).await
            }
            Ok(status) => {
                log::info!("user {} is still not subscribed ({status:?})", sender.id.0);
                self.platform
                    .answer(query_id, Some(Reply::NotSubscribed))
                    .await
            }
            Err(e) => {
                report("membership check", sender, &e);
                self.platform.answer(query_id, Some(Reply::TryLater)).await
            }
        }
    }

    pub async fn on_text(&self, sender: &Sender, text: &str) -> PlatformResult<()> {
        match self.sessions.stage(sender.id).await {
            Stage::AwaitingDate => self.receive_date(sender, text).await,
            Stage::AwaitingQuestion { birth_date } => {
                self.receive_question(sender, birth_date, text).await
            }
            Stage::New | Stage::Done => self.restart(sender).await,
        }
    }

    /// Non-text input: repeat the current step's prompt.
    pub async fn on_unsupported(&self, sender: &Sender) -> PlatformResult<()> {
        match self.sessions.stage(sender.id).await {
            Stage::AwaitingDate => self.reply(sender, Reply::InvalidDate).await,
            Stage::AwaitingQuestion { .. } => self.reply(sender, Reply::QuestionPrompt).await,
            Stage::New | Stage::Done => self.restart(sender).await,
        }
    }

    pub async fn on_admin_panel(&self, sender: &Sender) -> PlatformResult<()> {
        if !self.is_admin(sender.id) {
            log::warn!("user {} requested the admin panel", sender.id.0);
            return Ok(());
        }
        let stages = self.sessions.counts().await;
        let leads = self.leads.load(Ordering::Relaxed);
        self.reply(sender, Reply::AdminPanel { stages, leads }).await
    }

    pub async fn on_publish(&self, sender: &Sender) -> PlatformResult<()> {
        if !self.is_admin(sender.id) {
            log::warn!("user {} tried to publish the channel post", sender.id.0);
            return Ok(());
        }
        match self.platform.publish_post().await {
            Ok(()) => {
                log::info!("channel post published");
                self.reply(sender, Reply::Published).await
            }
            Err(e) => self.try_later(sender, "publishing", e).await,
        }
    }

    pub async fn on_publish_button(&self, sender: &Sender, query_id: &str) -> PlatformResult<()> {
        if let Err(e) = self.platform.answer(query_id, None).await {
            report("button answer", sender, &e);
        }
        self.on_publish(sender).await
    }

    /// Unrecognized input outside of a pending step sends the user back to
    /// `Stage::New` and replays the start command.
    async fn restart(&self, sender: &Sender) -> PlatformResult<()> {
        self.sessions.clear(sender.id).await;
        self.on_start(sender, EntrySource::Organic).await
    }

    async fn enter(&self, sender: &Sender) -> PlatformResult<()> {
        match self.platform.membership(sender.id).await {
            Ok(status) if status.is_subscribed() => {
                self.advance(sender, Reply::DatePrompt, Stage::AwaitingDate).await
            }
            Ok(status) => {
                log::info!("user {} is not subscribed ({status:?})", sender.id.0);
                self.reply(sender, Reply::SubscribePrompt).await
            }
            Err(e) => self.try_later(sender, "membership check", e).await,
        }
    }

    async fn receive_date(&self, sender: &Sender, text: &str) -> PlatformResult<()> {
        let birth_date = match parse_birth_date(text, today()) {
            Ok(birth_date) => birth_date,
            Err(e) => {
                log::debug!("user {} sent invalid date {text:?}: {e}", sender.id.0);
                return self.reply(sender, Reply::InvalidDate).await;
            }
        };

        if self.collect_question {
            self.advance(
                sender,
                Reply::QuestionPrompt,
                Stage::AwaitingQuestion { birth_date },
            )
            .await
        } else {
            self.complete(sender, birth_date, None).await
        }
    }

    async fn receive_question(
        &self,
        sender: &Sender,
        birth_date: BirthDate,
        text: &str,
    ) -> PlatformResult<()> {
        let question = text.trim();
        if question.is_empty() {
            return self.reply(sender, Reply::QuestionPrompt).await;
        }
        self.complete(sender, birth_date, Some(question.to_owned()))
            .await
    }

    async fn complete(
        &self,
        sender: &Sender,
        birth_date: BirthDate,
        question: Option<String>,
    ) -> PlatformResult<()> {
        let lead = Lead::new(sender, birth_date, question);
        if let Err(e) = self.platform.forward_lead(&lead).await {
            return self.try_later(sender, "lead forwarding", e).await;
        }
        let total = self.leads.fetch_add(1, Ordering::Relaxed) + 1;
        log::info!("lead from {} forwarded ({total} total)", lead.contact);
        self.sessions.set_stage(sender.id, Stage::Done).await;
        self.reply(sender, Reply::LeadAccepted).await
    }

    /// Sends `prompt` and moves the user to `stage` only if it was delivered.
    async fn advance(&self, sender: &Sender, prompt: Reply, stage: Stage) -> PlatformResult<()> {
        match self.platform.send(sender.id, prompt).await {
            Ok(()) => {
                self.sessions.set_stage(sender.id, stage).await;
                Ok(())
            }
            Err(e) => self.try_later(sender, "sending prompt", e).await,
        }
    }

    async fn reply(&self, sender: &Sender, reply: Reply) -> PlatformResult<()> {
        match self.platform.send(sender.id, reply).await {
            Ok(()) => Ok(()),
            Err(e) => self.try_later(sender, "sending reply", e).await,
        }
    }

    async fn try_later(
        &self,
        sender: &Sender,
        action: &str,
        error: PlatformError,
    ) -> PlatformResult<()> {
        report(action, sender, &error);
        self.platform.send(sender.id, Reply::TryLater).await
    }
}

fn report(action: &str, sender: &Sender, error: &PlatformError) {
    if error.kind.is_transient() {
        log::warn!("{action} failed for user {}: {error}", sender.id.0);
    } else {
        log::error!("{action} failed for user {}: {error}", sender.id.0);
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
