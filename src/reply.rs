//! USSD response protocol. `CON ` keeps the dialog open, `END ` closes it.

use serde::Serialize;

/// A single response to the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UssdReply {
    /// Body shown on the handset, without the protocol prefix.
    pub text: String,
    /// Whether the handset should wait for more input.
    pub continues: bool,
}

impl UssdReply {
    /// A response expecting more input.
    pub fn con(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            continues: true,
        }
    }

    /// A final response.
    pub fn end(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            continues: false,
        }
    }

    pub fn prefix(&self) -> &'static str {
        if self.continues { "CON" } else { "END" }
    }

    /// Wire form: prefix, one space, then the body.
    pub fn render(&self) -> String {
        format!("{} {}", self.prefix(), self.text)
    }
}

impl std::fmt::Display for UssdReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.prefix(), self.text)
    }
}
