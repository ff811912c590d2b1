use std::fmt;

/// Errors raised while running a download command.
#[derive(Debug)]
pub enum CommandError {
    /// A required argument was not given.
    MissingArgument(&'static str),
    /// An argument was given but is unusable.
    BadArgument(String),
    /// Cobalt could not be reached or the body could not be read.
    Http(reqwest::Error),
    /// Cobalt answered with something that isn't JSON, usually a captcha page.
    UpstreamParse(serde_json::Error),
    /// The chat platform rejected our reply.
    Reply(String),
}

impl CommandError {
    /// Text shown to the user in the chat.
    pub fn user_message(&self, operator_contact: &str) -> String {
        match self {
            Self::UpstreamParse(_) => format!(
                "the api returned an unparseable response (probably a captcha page), \
                 it's not your fault. please contact {operator_contact} about this"
            ),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArgument(name) => {
                write!(f, "{name} is a required argument that is missing.")
            }
            Self::BadArgument(msg) => write!(f, "{msg}"),
            Self::Http(e) => write!(f, "{e}"),
            Self::UpstreamParse(e) => write!(f, "upstream returned an unparseable response: {e}"),
            Self::Reply(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::UpstreamParse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CommandError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(e: serde_json::Error) -> Self {
        Self::UpstreamParse(e)
    }
}
