//! Command routing table and trigger parsing.

use crate::markup::escape_html;
use crate::surface::{HelpCard, Origin};

const SUPPORTED_SERVICES_URL: &str = "https://github.com/wukko/cobalt#supported-services";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Audio,
    Video,
    Help,
}

pub struct Route {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub command: Command,
}

pub const ROUTES: &[Route] = &[
    Route {
        name: "audio",
        aliases: &["aud"],
        description: "download audio from a link",
        command: Command::Audio,
    },
    Route {
        name: "video",
        aliases: &["vid"],
        description: "download video from a link (will return audio if video not available)",
        command: Command::Video,
    },
    Route {
        name: "help",
        // Telegram clients send /start when a chat is opened.
        aliases: &["start"],
        description: "info and commands",
        command: Command::Help,
    },
];

impl Command {
    pub fn lookup(name: &str) -> Option<Command> {
        let name = name.to_lowercase();
        ROUTES
            .iter()
            .find(|r| r.name == name || r.aliases.contains(&name.as_str()))
            .map(|r| r.command)
    }

    pub fn name(self) -> &'static str {
        ROUTES
            .iter()
            .find(|r| r.command == self)
            .map(|r| r.name)
            .unwrap_or("unknown")
    }
}

/// One user-triggered command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub args: Vec<String>,
    pub origin: Origin,
}

/// Matches message text against the routing table.
pub struct CommandParser {
    prefixes: Vec<String>,
    /// Lowercase, without `@`.
    bot_username: Option<String>,
}

impl CommandParser {
    pub fn new(prefixes: Vec<String>, bot_username: Option<String>) -> Self {
        Self {
            prefixes: prefixes.into_iter().filter(|p| !p.is_empty()).collect(),
            bot_username: bot_username.map(|u| u.trim_start_matches('@').to_lowercase()),
        }
    }

    /// Returns `None` for anything that isn't addressed to us as a known command.
    pub fn parse(&self, text: &str, origin: Origin) -> Option<Invocation> {
        let body = self.strip_trigger(text.trim_start())?;
        let mut words = body.split_whitespace();
        let head = words.next()?;

        // `/audio@this_bot` form; a command for another bot is not ours.
        let name = match head.split_once('@') {
            Some((name, target)) => {
                let ours = self
                    .bot_username
                    .as_deref()
                    .is_some_and(|me| me == target.to_lowercase());
                if !ours {
                    return None;
                }
                name
            }
            None => head,
        };

        let command = Command::lookup(name)?;
        Some(Invocation {
            command,
            args: words.map(str::to_string).collect(),
            origin,
        })
    }

    fn strip_trigger<'a>(&self, text: &'a str) -> Option<&'a str> {
        if let Some(me) = &self.bot_username
            && let Some(rest) = text.strip_prefix('@')
        {
            let (mention, tail) = rest.split_at(rest.find(char::is_whitespace).unwrap_or(rest.len()));
            if mention.to_lowercase() == *me {
                return Some(tail.trim_start());
            }
        }

        self.prefixes
            .iter()
            .find_map(|p| text.strip_prefix(p.as_str()))
            .filter(|rest| !rest.starts_with(char::is_whitespace))
    }

    /// Prefix used when showing usage, e.g. `.audio [url]`.
    pub fn display_prefix(&self) -> &str {
        self.prefixes.first().map(String::as_str).unwrap_or("/")
    }
}

/// Usage card listing the download commands.
pub fn help_card(bot_username: Option<&str>, site_url: &str, prefix: &str) -> HelpCard {
    let name = bot_username
        .map(|u| format!("@{}", escape_html(u)))
        .unwrap_or_else(|| "this bot".to_string());

    HelpCard {
        title: "info and commands.".to_string(),
        description: format!(
            "{name} is an unofficial bot that uses <a href=\"{site}\">cobalt</a>'s api.\n\
             see the supported services <a href=\"{SUPPORTED_SERVICES_URL}\">here</a>",
            site = escape_html(site_url),
        ),
        fields: ROUTES
            .iter()
            .filter(|r| r.command != Command::Help)
            .map(|r| (format!("{prefix}{} [url]", r.name), format!("{}.", r.description)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::recording::origin;

    fn parser() -> CommandParser {
        CommandParser::new(vec![".".to_string(), "/".to_string()], Some("CobaltBot".to_string()))
    }

    fn parse(text: &str) -> Option<(Command, Vec<String>)> {
        parser().parse(text, origin()).map(|i| (i.command, i.args))
    }

    #[test]
    fn test_prefix_and_aliases() {
        let url = "https://example.com/clip".to_string();
        assert_eq!(parse(".audio https://example.com/clip"), Some((Command::Audio, vec![url.clone()])));
        assert_eq!(parse(".aud https://example.com/clip"), Some((Command::Audio, vec![url.clone()])));
        assert_eq!(parse("/video https://example.com/clip"), Some((Command::Video, vec![url.clone()])));
        assert_eq!(parse(".vid https://example.com/clip"), Some((Command::Video, vec![url])));
        assert_eq!(parse(".help"), Some((Command::Help, vec![])));
        assert_eq!(parse(".HELP"), Some((Command::Help, vec![])));
        assert_eq!(parse("/start"), Some((Command::Help, vec![])));
    }

    #[test]
    fn test_mention_trigger() {
        assert_eq!(
            parse("@cobaltbot video https://example.com/clip"),
            Some((Command::Video, vec!["https://example.com/clip".to_string()]))
        );
        assert_eq!(parse("@someoneelse video https://example.com/clip"), None);
    }

    #[test]
    fn test_bot_suffix() {
        assert_eq!(parse("/help@CobaltBot"), Some((Command::Help, vec![])));
        assert_eq!(parse("/help@OtherBot"), None);
    }

    #[test]
    fn test_missing_args_still_routes() {
        assert_eq!(parse(".audio"), Some((Command::Audio, vec![])));
    }

    #[test]
    fn test_ignored_messages() {
        assert_eq!(parse("audio https://example.com"), None);
        assert_eq!(parse(". audio https://example.com"), None);
        assert_eq!(parse(".download https://example.com"), None);
        assert_eq!(parse("..."), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn test_without_username_mentions_are_ignored() {
        let parser = CommandParser::new(vec![".".to_string()], None);
        assert!(parser.parse("@cobaltbot help", origin()).is_none());
        assert!(parser.parse("/help", origin()).is_none());
        assert!(parser.parse(".help", origin()).is_some());
    }

    #[test]
    fn test_help_card_lists_download_commands() {
        let card = help_card(Some("cobaltbot"), "https://cobalt.tools/", ".");
        assert_eq!(card.title, "info and commands.");
        assert!(card.description.starts_with("@cobaltbot is an unofficial bot"));
        assert!(card.description.contains("<a href=\"https://cobalt.tools/\">cobalt</a>"));
        assert_eq!(
            card.fields,
            vec![
                (".audio [url]".to_string(), "download audio from a link.".to_string()),
                (
                    ".video [url]".to_string(),
                    "download video from a link (will return audio if video not available).".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_command_names() {
        assert_eq!(Command::Audio.name(), "audio");
        assert_eq!(Command::lookup("vid"), Some(Command::Video));
        assert_eq!(Command::lookup("nope"), None);
        assert_eq!(parser().display_prefix(), ".");
    }
}
