use async_trait::async_trait;
use teloxide::types::{ChatMemberStatus, UserId};

use crate::{
    error::PlatformError,
    funnel::{lead::Lead, session::StageCounts},
};

pub type PlatformResult<T> = Result<T, PlatformError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipStatus {
    Owner,
    Administrator,
    Member,
    Restricted,
    Left,
    Banned,
}

impl MembershipStatus {
    pub fn is_subscribed(self) -> bool {
        matches!(
            self,
            MembershipStatus::Owner | MembershipStatus::Administrator | MembershipStatus::Member
        )
    }
}

impl From<ChatMemberStatus> for MembershipStatus {
    fn from(status: ChatMemberStatus) -> Self {
        match status {
            ChatMemberStatus::Owner => MembershipStatus::Owner,
            ChatMemberStatus::Administrator => MembershipStatus::Administrator,
            ChatMemberStatus::Member => MembershipStatus::Member,
            ChatMemberStatus::Restricted => MembershipStatus::Restricted,
            ChatMemberStatus::Left => MembershipStatus::Left,
            ChatMemberStatus::Banned => MembershipStatus::Banned,
        }
    }
}

/// Everything the bot can say to a user. Rendering is up to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    DatePrompt,
    SubscribePrompt,
    NotSubscribed,
    InvalidDate,
    QuestionPrompt,
    LeadAccepted,
    TryLater,
    AdminPanel { stages: StageCounts, leads: usize },
    Published,
}

/// Messaging platform operations the funnel depends on.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Status of `user` in the configured channel.
    async fn membership(&self, user: UserId) -> PlatformResult<MembershipStatus>;

    async fn send(&self, to: UserId, reply: Reply) -> PlatformResult<()>;

    /// Acknowledges a button press, optionally with a transient notice.
    async fn answer(&self, query_id: &str, notice: Option<Reply>) -> PlatformResult<()>;

    async fn forward_lead(&self, lead: &Lead) -> PlatformResult<()>;

    async fn publish_post(&self) -> PlatformResult<()>;
}
