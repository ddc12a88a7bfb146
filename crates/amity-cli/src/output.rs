//! Output formatting utilities

use std::process::ExitCode;

use amity_core::Error;
use amity_engine::FriendList;
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Table,
        }
    }
}

/// Successful result of a relationship command
#[derive(Debug)]
pub enum Outcome {
    Done,
    Friends(FriendList),
    Recipients(Vec<String>),
}

#[derive(Serialize)]
struct SuccessBody {
    success: bool,
}

#[derive(Serialize)]
struct FriendsBody<'a> {
    success: bool,
    friends: &'a [String],
    count: usize,
}

#[derive(Serialize)]
struct RecipientsBody<'a> {
    success: bool,
    recipients: &'a [String],
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    kind: &'static str,
    errors: Vec<String>,
}

/// Format output based on format type
pub fn format_output<T: Serialize>(data: &T, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Table => toml::to_string(data).unwrap_or_default(),
    }
}

pub fn render_outcome(outcome: &Outcome, format: OutputFormat) -> String {
    match (outcome, format) {
        (Outcome::Done, OutputFormat::Json) => format_output(&SuccessBody { success: true }, format),
        (Outcome::Done, OutputFormat::Table) => "success".to_string(),
        (Outcome::Friends(list), OutputFormat::Json) => format_output(
            &FriendsBody {
                success: true,
                friends: &list.friends,
                count: list.count,
            },
            format,
        ),
        (Outcome::Friends(list), OutputFormat::Table) => {
            let mut lines: Vec<String> = list.friends.iter().map(|f| format!("  {}", f)).collect();
            lines.insert(0, format!("Friends ({}):", list.count));
            lines.join("\n")
        }
        (Outcome::Recipients(recipients), OutputFormat::Json) => format_output(
            &RecipientsBody {
                success: true,
                recipients,
            },
            format,
        ),
        (Outcome::Recipients(recipients), OutputFormat::Table) => {
            if recipients.is_empty() {
                "No recipients".to_string()
            } else {
                let mut lines: Vec<String> = recipients.iter().map(|r| format!("  {}", r)).collect();
                lines.insert(0, format!("Recipients ({}):", recipients.len()));
                lines.join("\n")
            }
        }
    }
}

pub fn render_error(err: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_output(
            &ErrorBody {
                success: false,
                kind: err.kind().as_str(),
                errors: err.messages(),
            },
            format,
        ),
        OutputFormat::Table => err
            .messages()
            .iter()
            .map(|m| format!("error ({}): {}", err.kind(), m))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Print the result of a command and pick the exit code
///
/// JSON bodies always go to stdout; table-mode errors go to stderr.
pub fn report(result: amity_core::Result<Outcome>, format: OutputFormat, quiet: bool) -> ExitCode {
    match result {
        Ok(outcome) => {
            if !quiet || format == OutputFormat::Json {
                println!("{}", render_outcome(&outcome, format));
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::debug!("Command failed: {}", err);
            let body = render_error(&err, format);
            match format {
                OutputFormat::Json => println!("{}", body),
                OutputFormat::Table => eprintln!("{}", body),
            }
            ExitCode::FAILURE
        }
    }
}
