use std::{fmt::Debug, future::Future, net::SocketAddr, sync::Arc};

use axum::Router;
use teloxide::{
    dispatching::DefaultKey,
    prelude::*,
    update_listeners::{webhooks, Polling, UpdateListener},
    Bot,
};
use url::Url;

use crate::{
    config::Config,
    error::ListenerError,
    funnel::{session::InMemSessionStore, Funnel},
    handlers::{schema, AppFunnel, HandlerError},
    telegram::TelegramPlatform,
};

mod config;
mod error;
mod funnel;
mod handlers;
mod health;
mod platform;
mod telegram;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    pretty_env_logger::init();

    let config = Config::from_env().map_err(|e| {
        log::error!("configuration: {e}");
        e
    })?;

    let bot = Bot::new(&config.token);
    let me = bot.get_me().await?;
    log::info!("authorized as @{}", me.username());

    let platform = TelegramPlatform::new(bot.clone(), &config, me.username())?;
    let funnel: AppFunnel = Arc::new(Funnel::new(
        InMemSessionStore::default(),
        platform,
        config.admin_id,
        config.collect_question,
    ));

    let dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![funnel])
        .enable_ctrlc_handler()
        .build();

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();

    match &config.webhook_host {
        Some(host) => {
            let (listener, stop_flag, router) = webhook(bot, &config.token, host, addr).await?;
            serve(dispatcher, listener, router.merge(health::router()), addr, stop_flag).await;
        }
        None => {
            log::info!("no BOT_HOST set, using long polling");
            let listener = Polling::builder(bot).drop_pending_updates().build();
            serve(
                dispatcher,
                listener,
                health::router(),
                addr,
                futures::future::pending(),
            )
            .await;
        }
    }

    Ok(())
}

async fn webhook(
    bot: Bot,
    token: &str,
    host: &Url,
    addr: SocketAddr,
) -> Result<
    (
        impl UpdateListener<Err = std::convert::Infallible>,
        impl Future<Output = ()> + Send + 'static,
        Router,
    ),
    ListenerError,
> {
    let bot_id = token
        .split(':')
        .next()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ListenerError::IdParse(token.to_owned()))?;

    let url = format!("{}/bot/{}", host.as_str().trim_end_matches('/'), bot_id)
        .parse()
        .map_err(ListenerError::UrlParse)?;

    let setup = webhooks::axum_to_router(bot, webhooks::Options::new(addr, url))
        .await
        .map_err(ListenerError::Webhook)?;
    log::info!("webhook for bot {bot_id} set up");
    Ok(setup)
}

/// Runs the axum server alongside the dispatcher. A server failure stops the
/// update listener, which ends the dispatcher.
async fn serve<L>(
    mut dispatcher: Dispatcher<Bot, HandlerError, DefaultKey>,
    mut listener: L,
    router: Router,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) where
    L: UpdateListener + Send,
    L::Err: Debug,
{
    let stop_token = listener.stop_token();

    let server_handle = tokio::spawn(async move {
        log::info!("http server listening on {addr}");
        let _ = axum::Server::bind(&addr)
            .serve(router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await
            .map(|_| log::info!("http server stopped"))
            .map_err(|e| {
                log::error!("http server error: {e}, stopping bot");
                stop_token.stop();
            });
    });

    dispatcher
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("update listener error"),
        )
        .await;

    server_handle.abort();
}
