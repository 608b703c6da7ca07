use teloxide::{
    types::{InlineKeyboardButton, InlineKeyboardMarkup},
    utils::html,
};
use url::Url;

use crate::{funnel::lead::Lead, platform::Reply};

pub const CHECK_SUBSCRIPTION: &str = "check_subscription";
pub const PUBLISH: &str = "publish";

pub struct Links {
    pub channel: Url,
    pub deep_link: Url,
}

pub fn reply(reply: &Reply, links: &Links) -> (String, Option<InlineKeyboardMarkup>) {
    match reply {
        Reply::DatePrompt => (
            "✨ Отлично! Чтобы сделать расчёт по матрице судьбы, \
             напишите вашу дату рождения в формате:\n\n\
             <code>дд.мм.гггг</code>\n\n\
             Например: <code>15.08.1990</code>"
                .to_owned(),
            None,
        ),
        Reply::SubscribePrompt => (
            "🙏 Пожалуйста, подпишитесь на канал, \
             чтобы получить бесплатный расчёт по матрице судьбы!"
                .to_owned(),
            Some(subscribe_keyboard(&links.channel)),
        ),
        Reply::InvalidDate => (
            "❌ Пожалуйста, введите реальную дату рождения в формате <code>дд.мм.гггг</code>, \
             например <code>15.08.1990</code>"
                .to_owned(),
            None,
        ),
        Reply::QuestionPrompt => (
            "📝 Спасибо! Теперь напишите одним сообщением, какой вопрос вас волнует больше всего."
                .to_owned(),
            None,
        ),
        Reply::LeadAccepted => (
            "✅ Спасибо! Ваша заявка принята. Скоро я свяжусь с вами для расчёта.".to_owned(),
            None,
        ),
        Reply::AdminPanel { stages, leads } => (
            format!(
                "🛠 <b>Панель администратора</b>\n\n\
                 Ждут ввода даты: {}\n\
                 Ждут ввода вопроса: {}\n\
                 Заявок с момента запуска: {}\n\n\
                 Ссылка для поста: {}",
                stages.awaiting_date,
                stages.awaiting_question,
                leads,
                html::escape(links.deep_link.as_str()),
            ),
            Some(InlineKeyboardMarkup::new(vec![vec![
                InlineKeyboardButton::callback("📢 Опубликовать пост в канал", PUBLISH),
            ]])),
        ),
        Reply::NotSubscribed | Reply::TryLater | Reply::Published => (notice(reply), None),
    }
}

/// Short plain-text form, used for button press notices.
pub fn notice(reply: &Reply) -> String {
    match reply {
        Reply::NotSubscribed => "Вы ещё не подписались на канал 🙏".to_owned(),
        Reply::TryLater => "Произошла ошибка. Попробуйте позже.".to_owned(),
        Reply::Published => "✅ Пост опубликован в канале.".to_owned(),
        Reply::LeadAccepted => "✅ Заявка принята.".to_owned(),
        Reply::DatePrompt
        | Reply::SubscribePrompt
        | Reply::InvalidDate
        | Reply::QuestionPrompt
        | Reply::AdminPanel { .. } => String::new(),
    }
}

pub fn lead(lead: &Lead) -> String {
    let mut text = format!(
        "🆕 Новый лид!\n\n\
         Пользователь: {}\n\
         Дата рождения: <code>{}</code>\n",
        html::escape(&lead.contact),
        lead.birth_date,
    );
    if let Some(question) = &lead.question {
        text.push_str(&format!("Вопрос: {}\n", html::escape(question)));
    }
    text.push_str("\nТеперь вы можете написать ему вручную.");
    text
}

pub fn post_keyboard(button: &str, deep_link: &Url) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url(
        button.to_owned(),
        deep_link.clone(),
    )]])
}

fn subscribe_keyboard(channel: &Url) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::url(
            "Подписаться на канал",
            channel.clone(),
        )],
        vec![InlineKeyboardButton::callback(
            "🔄 Я подписался, проверить",
            CHECK_SUBSCRIPTION,
        )],
    ])
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use teloxide::types::{InlineKeyboardButtonKind, UserId};

    use super::*;
    use crate::funnel::{date::parse_birth_date, session::StageCounts, Sender};

    fn links() -> Links {
        Links {
            channel: Url::parse("https://t.me/matrix_channel").unwrap(),
            deep_link: Url::parse("https://t.me/matrix_bot?start=from_channel").unwrap(),
        }
    }

    #[test]
    fn subscribe_prompt_links_channel_and_offers_recheck() {
        let (_, markup) = reply(&Reply::SubscribePrompt, &links());
        let buttons: Vec<_> = markup.unwrap().inline_keyboard.into_iter().flatten().collect();

        assert_eq!(buttons.len(), 2);
        assert!(matches!(
            &buttons[0].kind,
            InlineKeyboardButtonKind::Url(url) if url.as_str() == "https://t.me/matrix_channel"
        ));
        assert!(matches!(
            &buttons[1].kind,
            InlineKeyboardButtonKind::CallbackData(data) if data == CHECK_SUBSCRIPTION
        ));
    }

    #[test]
    fn admin_panel_shows_counts_and_publish_button() {
        let stages = StageCounts {
            awaiting_date: 3,
            awaiting_question: 1,
        };
        let (text, markup) = reply(&Reply::AdminPanel { stages, leads: 12 }, &links());

        assert!(text.contains("Ждут ввода даты: 3"));
        assert!(text.contains("Ждут ввода вопроса: 1"));
        assert!(text.contains("Заявок с момента запуска: 12"));
        assert!(text.contains("start=from_channel"));
        let buttons: Vec<_> = markup.unwrap().inline_keyboard.into_iter().flatten().collect();
        assert!(matches!(
            &buttons[0].kind,
            InlineKeyboardButtonKind::CallbackData(data) if data == PUBLISH
        ));
    }

    #[test]
    fn lead_message_escapes_user_text() {
        let sender = Sender {
            id: UserId(5),
            username: Some("alice".into()),
        };
        let birth_date =
            parse_birth_date("15.08.1990", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).unwrap();
        let text = lead(&Lead::new(&sender, birth_date, Some("<b>love</b> & money".into())));

        assert!(text.contains("Пользователь: @alice"));
        assert!(text.contains("<code>15.08.1990</code>"));
        assert!(text.contains("Вопрос: &lt;b&gt;love&lt;/b&gt; &amp; money"));
    }

    #[test]
    fn lead_without_question_has_no_question_line() {
        let sender = Sender {
            id: UserId(5),
            username: None,
        };
        let birth_date =
            parse_birth_date("01.01.2000", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).unwrap();
        let text = lead(&Lead::new(&sender, birth_date, None));

        assert!(text.contains("Пользователь: ID5"));
        assert!(!text.contains("Вопрос"));
    }
}
