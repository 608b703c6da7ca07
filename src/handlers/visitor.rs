use teloxide::prelude::*;

use crate::funnel::{EntrySource, Sender};

use super::states::{AppFunnel, HandlerResult};

pub async fn start(funnel: AppFunnel, sender: Sender, payload: String) -> HandlerResult {
    funnel
        .on_start(&sender, EntrySource::from_payload(&payload))
        .await?;
    Ok(())
}

pub async fn recheck(funnel: AppFunnel, sender: Sender, query_id: String) -> HandlerResult {
    funnel.on_recheck(&sender, &query_id).await?;
    Ok(())
}

pub async fn message(funnel: AppFunnel, sender: Sender, msg: Message) -> HandlerResult {
    match msg.text() {
        Some(text) => funnel.on_text(&sender, text).await?,
        None => funnel.on_unsupported(&sender).await?,
    }
    Ok(())
}
