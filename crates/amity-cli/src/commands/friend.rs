//! Friend commands

use std::process::ExitCode;

use clap::{Args, Subcommand};

use crate::output::{report, Outcome};
use crate::{AppContext, Cli};
use amity_core::validation::validate_emails;
use amity_core::Result;

#[derive(Args)]
pub struct FriendArgs {
    #[command(subcommand)]
    pub command: FriendCommands,
}

#[derive(Subcommand)]
pub enum FriendCommands {
    /// Make two users friends
    Connect {
        /// First email address
        email_a: String,
        /// Second email address
        email_b: String,
    },
    /// List a user's friends
    List {
        /// Email address
        email: String,
    },
    /// List friends shared by two users
    Common {
        /// First email address
        email_a: String,
        /// Second email address
        email_b: String,
    },
}

pub async fn run(args: &FriendArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<ExitCode> {
    let result = execute(&args.command, ctx).await;
    Ok(report(result, cli.output_format(), cli.quiet))
}

async fn execute(command: &FriendCommands, ctx: &AppContext) -> Result<Outcome> {
    match command {
        FriendCommands::Connect { email_a, email_b } => {
            validate_emails(&[("friends[0]", email_a.as_str()), ("friends[1]", email_b.as_str())])?;
            tracing::debug!("Connecting {} and {}", email_a, email_b);
            ctx.relations.connect(email_a, email_b).await?;
            Ok(Outcome::Done)
        }
        FriendCommands::List { email } => {
            validate_emails(&[("email", email.as_str())])?;
            ctx.queries.get_friends(email).await.map(Outcome::Friends)
        }
        FriendCommands::Common { email_a, email_b } => {
            validate_emails(&[("friends[0]", email_a.as_str()), ("friends[1]", email_b.as_str())])?;
            ctx.queries
                .get_common_friends(email_a, email_b)
                .await
                .map(Outcome::Friends)
        }
    }
}
