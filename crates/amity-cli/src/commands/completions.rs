//! `amity completions <shell>`

use std::io::{self, Write};

use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};

use crate::Cli;

#[derive(Args)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the completion script for `shell` to `out`
pub fn write_completions(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, out);
}

pub fn run(args: &CompletionsArgs) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    write_completions(args.shell, &mut out);
    out.flush()?;
    Ok(())
}
