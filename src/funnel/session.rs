use std::collections::HashMap;

use async_trait::async_trait;
use teloxide::types::UserId;
use tokio::sync::Mutex;

use super::date::BirthDate;

/// Position of a user within the funnel. The pending birth date lives inside
/// `AwaitingQuestion`, so a user is always in exactly one stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    New,
    AwaitingDate,
    AwaitingQuestion {
        birth_date: BirthDate,
    },
    Done,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub awaiting_date: usize,
    pub awaiting_question: usize,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Unknown users are `Stage::New`.
    async fn stage(&self, user: UserId) -> Stage;

    async fn set_stage(&self, user: UserId, stage: Stage);

    async fn clear(&self, user: UserId);

    async fn counts(&self) -> StageCounts;
}

/// `Done` entries stay until the user's next message clears them, so the map
/// holds at most one entry per user seen since startup.
#[derive(Default)]
pub struct InMemSessionStore {
    sessions: Mutex<HashMap<UserId, Stage>>,
}

#[async_trait]
impl SessionStore for InMemSessionStore {
    async fn stage(&self, user: UserId) -> Stage {
        self.sessions
            .lock()
            .await
            .get(&user)
            .cloned()
            .unwrap_or_default()
    }

    async fn set_stage(&self, user: UserId, stage: Stage) {
        let mut sessions = self.sessions.lock().await;
        if stage == Stage::New {
            sessions.remove(&user);
        } else {
            sessions.insert(user, stage);
        }
    }

    async fn clear(&self, user: UserId) {
        self.sessions.lock().await.remove(&user);
    }

    async fn counts(&self) -> StageCounts {
        self.sessions
            .lock()
            .await
            .values()
            .fold(StageCounts::default(), |mut counts, stage| {
                match stage {
                    Stage::AwaitingDate => counts.awaiting_date += 1,
                    Stage::AwaitingQuestion { .. } => counts.awaiting_question += 1,
                    Stage::New | Stage::Done => {}
                }
                counts
            })
    }
}
