use crate::funnel::Sender;

use super::states::{AppFunnel, HandlerResult};

pub async fn panel(funnel: AppFunnel, sender: Sender) -> HandlerResult {
    funnel.on_admin_panel(&sender).await?;
    Ok(())
}

pub async fn publish(funnel: AppFunnel, sender: Sender) -> HandlerResult {
    funnel.on_publish(&sender).await?;
    Ok(())
}

pub async fn publish_button(funnel: AppFunnel, sender: Sender, query_id: String) -> HandlerResult {
    funnel.on_publish_button(&sender, &query_id).await?;
    Ok(())
}
