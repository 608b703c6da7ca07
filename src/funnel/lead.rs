use super::{date::BirthDate, Sender};

/// A completed funnel submission, forwarded to the administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lead {
    pub contact: String,
    pub birth_date: BirthDate,
    pub question: Option<String>,
}

impl Lead {
    pub fn new(sender: &Sender, birth_date: BirthDate, question: Option<String>) -> Self {
        let contact = match &sender.username {
            Some(username) => format!("@{username}"),
            None => format!("ID{}", sender.id.0),
        };
        Self {
            contact,
            birth_date,
            question,
        }
    }
}
