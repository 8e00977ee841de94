//! Command parser for the : command system

use super::PageId;

/// Parsed command from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Navigation commands
    Go(PageId),
    Back,
    Forward,
    Refresh,

    // Backend settings
    Url(String),
    Key(String),

    // Backend actions
    Approve(String),
    Reject { id: String, feedback: String },
    Revise { id: String, feedback: String },
    Dismiss(String),
    DismissAll,
    RunDaily,
    Trigger,

    // App
    Export,
    Help,
    Quit,

    // Unknown command
    Unknown(String),
}

/// Parse a command string (without the leading :)
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let mut parts = input.splitn(2, ' ');
    let cmd = parts.next().unwrap_or("");
    let args = parts
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    match cmd.to_lowercase().as_str() {
        // Navigation
        "go" | "page" | "open" => match args {
            Some(page) => Command::Go(PageId::from(page.as_str())),
            None => Command::Unknown(input.to_string()),
        },
        "back" | "b" => Command::Back,
        "forward" | "fwd" => Command::Forward,
        "refresh" | "reload" | "r" => Command::Refresh,

        // Settings
        "url" | "base" => match args {
            Some(url) => Command::Url(url),
            None => Command::Unknown(input.to_string()),
        },
        "key" | "apikey" => Command::Key(args.unwrap_or_default()),

        // Backend actions
        "approve" => match args {
            Some(id) => Command::Approve(id),
            None => Command::Unknown(input.to_string()),
        },
        "reject" => match args {
            Some(rest) => {
                let mut rest = rest.splitn(2, ' ');
                let id = rest.next().unwrap_or("").to_string();
                let feedback = rest.next().map(|s| s.trim().to_string()).unwrap_or_default();
                Command::Reject { id, feedback }
            }
            None => Command::Unknown(input.to_string()),
        },
        "revise" | "revision" => match args.as_deref().map(|rest| rest.split_once(' ')) {
            Some(Some((id, feedback))) if !feedback.trim().is_empty() => Command::Revise {
                id: id.to_string(),
                feedback: feedback.trim().to_string(),
            },
            _ => Command::Unknown(input.to_string()),
        },
        "dismiss" => match args {
            Some(id) => Command::Dismiss(id),
            None => Command::Unknown(input.to_string()),
        },
        "dismiss-all" | "dismissall" => Command::DismissAll,
        "run-daily" | "daily" => Command::RunDaily,
        "trigger" | "scheduler" => Command::Trigger,

        // App
        "export" => Command::Export,
        "help" | "h" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,

        _ => Command::Unknown(input.to_string()),
    }
}
