use crate::cli::args::{Cli, CompletionCommands};
use crate::utils::paths::PROGRAM_NAME;
use clap::CommandFactory;
use clap_complete::generate;
use std::io::{self, Write};

pub fn handle_completion_command(command: &CompletionCommands) {
    write_completion(command, &mut io::stdout());
}

pub fn write_completion<W: Write>(command: &CompletionCommands, out: &mut W) {
    let mut cmd = Cli::command();
    generate(command.shell(), &mut cmd, PROGRAM_NAME, out);
}
