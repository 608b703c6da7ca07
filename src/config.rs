use teloxide::types::{ChatId, Recipient, UserId};
use url::Url;

use crate::error::ConfigError;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_POST_TEXT: &str = "🔮 <b>Бесплатный расчёт по матрице судьбы!</b>\n\n\
    Узнайте о своих талантах, предназначении и кармических задачах. \
    Нажмите на кнопку ниже и отправьте дату рождения.";
const DEFAULT_POST_BUTTON: &str = "✨ Получить расчёт";

#[derive(Debug, Clone)]
pub struct PostTemplate {
    pub text: String,
    pub button: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub channel: Recipient,
    pub channel_url: Url,
    pub admin_id: UserId,
    pub port: u16,
    pub webhook_host: Option<Url>,
    pub collect_question: bool,
    pub post: PostTemplate,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        let token = required("BOT_TOKEN")?;

        let channel_id = required("CHANNEL_ID")?;
        let channel_link = var("CHANNEL_LINK")
            .map(|link| Url::parse(link.trim()))
            .transpose()
            .map_err(|e| ConfigError::invalid("CHANNEL_LINK", e))?;
        let (channel, channel_url) = parse_channel(channel_id.trim(), channel_link)?;

        let admin_id = required("ADMIN_ID")?
            .trim()
            .parse::<u64>()
            .map(UserId)
            .map_err(|e| ConfigError::invalid("ADMIN_ID", e))?;

        let port = var("PORT")
            .map(|port| port.trim().parse::<u16>())
            .transpose()
            .map_err(|e| ConfigError::invalid("PORT", e))?
            .unwrap_or(DEFAULT_PORT);

        let webhook_host = var("BOT_HOST")
            .map(|host| Url::parse(host.trim().trim_end_matches('/')))
            .transpose()
            .map_err(|e| ConfigError::invalid("BOT_HOST", e))?;

        let collect_question = var("COLLECT_QUESTION")
            .map(|flag| {
                parse_flag(&flag).ok_or_else(|| {
                    ConfigError::invalid("COLLECT_QUESTION", format!("not a boolean: {flag}"))
                })
            })
            .transpose()?
            .unwrap_or(false);

        let post = PostTemplate {
            text: var("POST_TEXT").unwrap_or_else(|| DEFAULT_POST_TEXT.to_owned()),
            button: var("POST_BUTTON").unwrap_or_else(|| DEFAULT_POST_BUTTON.to_owned()),
        };

        Ok(Self {
            token,
            channel,
            channel_url,
            admin_id,
            port,
            webhook_host,
            collect_question,
            post,
        })
    }
}

fn parse_channel(id: &str, link: Option<Url>) -> Result<(Recipient, Url), ConfigError> {
    if let Some(name) = id.strip_prefix('@') {
        if name.is_empty() {
            return Err(ConfigError::invalid("CHANNEL_ID", "empty channel username"));
        }
        let url = match link {
            Some(url) => url,
            None => Url::parse(&format!("https://t.me/{name}"))
                .map_err(|e| ConfigError::invalid("CHANNEL_ID", e))?,
        };
        return Ok((Recipient::ChannelUsername(id.to_owned()), url));
    }

    let chat_id = id
        .parse::<i64>()
        .map_err(|_| ConfigError::invalid("CHANNEL_ID", "expected @username or numeric chat id"))?;
    let url = link.ok_or(ConfigError::Missing("CHANNEL_LINK"))?;
    Ok((Recipient::Id(ChatId(chat_id)), url))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    const BASE: [(&str, &str); 3] = [
        ("BOT_TOKEN", "123456:secret"),
        ("CHANNEL_ID", "@matrix_channel"),
        ("ADMIN_ID", "42"),
    ];

    #[test]
    fn loads_minimal_config_with_defaults() {
        let config = load(&BASE).unwrap();

        assert_eq!(config.token, "123456:secret");
        assert_eq!(
            config.channel,
            Recipient::ChannelUsername("@matrix_channel".into())
        );
        assert_eq!(config.channel_url.as_str(), "https://t.me/matrix_channel");
        assert_eq!(config.admin_id, UserId(42));
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.webhook_host.is_none());
        assert!(!config.collect_question);
        assert_eq!(config.post.button, DEFAULT_POST_BUTTON);
    }

    #[test]
    fn missing_variables_are_fatal() {
        for skipped in ["BOT_TOKEN", "CHANNEL_ID", "ADMIN_ID"] {
            let vars: Vec<_> = BASE.iter().copied().filter(|(k, _)| *k != skipped).collect();
            match load(&vars) {
                Err(ConfigError::Missing(var)) => assert_eq!(var, skipped),
                other => panic!("expected missing {skipped}, got {other:?}"),
            }
        }
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut vars = BASE.to_vec();
        vars[0] = ("BOT_TOKEN", "  ");
        assert!(matches!(load(&vars), Err(ConfigError::Missing("BOT_TOKEN"))));
    }

    #[test]
    fn malformed_admin_id_is_rejected() {
        let mut vars = BASE.to_vec();
        vars[2] = ("ADMIN_ID", "admin");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { var: "ADMIN_ID", .. })
        ));
    }

    #[test]
    fn numeric_channel_requires_link() {
        let mut vars = BASE.to_vec();
        vars[1] = ("CHANNEL_ID", "-1001234567890");
        assert!(matches!(load(&vars), Err(ConfigError::Missing("CHANNEL_LINK"))));

        vars.push(("CHANNEL_LINK", "https://t.me/+invite"));
        let config = load(&vars).unwrap();
        assert_eq!(config.channel, Recipient::Id(ChatId(-1001234567890)));
        assert_eq!(config.channel_url.as_str(), "https://t.me/+invite");
    }

    #[test]
    fn garbage_channel_is_rejected() {
        let mut vars = BASE.to_vec();
        vars[1] = ("CHANNEL_ID", "matrix_channel");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { var: "CHANNEL_ID", .. })
        ));
    }

    #[test]
    fn optional_values_are_parsed() {
        let mut vars = BASE.to_vec();
        vars.extend([
            ("PORT", "10000"),
            ("BOT_HOST", "https://bot.example.com/"),
            ("COLLECT_QUESTION", "yes"),
            ("POST_TEXT", "hello"),
        ]);
        let config = load(&vars).unwrap();

        assert_eq!(config.port, 10000);
        assert_eq!(
            config.webhook_host.unwrap().as_str(),
            "https://bot.example.com/"
        );
        assert!(config.collect_question);
        assert_eq!(config.post.text, "hello");
    }

    #[test]
    fn malformed_optional_values_are_fatal() {
        for (var, value) in [
            ("PORT", "eighty"),
            ("COLLECT_QUESTION", "maybe"),
            ("BOT_HOST", "not a url"),
        ] {
            let mut vars = BASE.to_vec();
            vars.push((var, value));
            match load(&vars) {
                Err(ConfigError::Invalid { var: got, .. }) => assert_eq!(got, var),
                other => panic!("expected invalid {var}, got {other:?}"),
            }
        }
    }
}
