//! Subscription, block and recipient commands

use std::process::ExitCode;

use clap::{Args, Subcommand};

use crate::output::{report, Outcome};
use crate::{AppContext, Cli};
use amity_core::validation::{validate_emails, validate_text};
use amity_core::{Error, Result};

#[derive(Args)]
pub struct NotifyArgs {
    #[command(subcommand)]
    pub command: NotifyCommands,
}

#[derive(Subcommand)]
pub enum NotifyCommands {
    /// Subscribe to updates from a target
    Subscribe {
        /// Subscribing user
        requestor: String,
        /// User whose updates are wanted
        target: String,
    },
    /// Block a target
    Block {
        /// Blocking user
        requestor: String,
        /// User being blocked
        target: String,
    },
    /// List who receives an update from a sender
    Recipients {
        /// Sending user
        sender: String,
        /// Update text; mentioned addresses also receive it
        #[arg(short, long, default_value = "")]
        text: String,
    },
}

fn validate_pair(requestor: &str, target: &str) -> Result<()> {
    validate_emails(&[("requestor", requestor), ("target", target)])
}

fn validate_update(sender: &str, text: &str) -> Result<()> {
    let mut messages = match validate_emails(&[("sender", sender)]) {
        Ok(()) => Vec::new(),
        Err(e) => e.messages(),
    };
    if let Err(e) = validate_text(text) {
        messages.push(e.to_string());
    }

    if messages.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidRequest(messages))
    }
}

pub async fn run(args: &NotifyArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<ExitCode> {
    let result = execute(&args.command, ctx).await;
    Ok(report(result, cli.output_format(), cli.quiet))
}

async fn execute(command: &NotifyCommands, ctx: &AppContext) -> Result<Outcome> {
    match command {
        NotifyCommands::Subscribe { requestor, target } => {
            validate_pair(requestor, target)?;
            ctx.relations.subscribe(requestor, target).await?;
            Ok(Outcome::Done)
        }
        NotifyCommands::Block { requestor, target } => {
            validate_pair(requestor, target)?;
            ctx.relations.block(requestor, target).await?;
            Ok(Outcome::Done)
        }
        NotifyCommands::Recipients { sender, text } => {
            validate_update(sender, text)?;
            ctx.queries
                .get_notification_recipients(sender, text)
                .await
                .map(Outcome::Recipients)
        }
    }
}
