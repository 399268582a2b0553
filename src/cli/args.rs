use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "usercert-rs")]
#[command(version = "1.0.0")]
#[command(about = "Per-user certificate and keystore management")]
#[command(long_about = None)]
pub struct Cli {
    /// Config file path (default: ~/.config/usercert-rs/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Enable verbose logging (repeat for more verbosity: -v INFO, -vv DEBUG, -vvv TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output raw tab-separated values (no formatting)
    #[arg(short, long, global = true)]
    pub raw: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct PasswordArgs {
    /// Keystore password (prompted when not given)
    #[arg(long, env = "USERCERT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a key pair and certificate for a user, replacing any existing one
    Create {
        /// User reference, resolved through the profiles file
        user: String,
        #[command(flatten)]
        password: PasswordArgs,
    },
    /// Describe the certificate inside a user's keystore
    Info {
        user_id: String,
        #[command(flatten)]
        password: PasswordArgs,
    },
    /// Print a user's certificate as PEM (no password needed)
    Show {
        user_id: String,
        /// Include a text summary before the PEM data
        #[arg(long)]
        text: bool,
    },
    /// Check whether a user has a certificate entry
    Exists { user_id: String },
    /// Delete a user's certificate entry
    Delete { user_id: String },
    /// Write a user's password-protected PKCS#12 keystore to a file
    Export {
        user_id: String,
        /// Destination file
        #[arg(long, short = 'o', value_hint = clap::ValueHint::FilePath)]
        output: String,
    },
    /// Generate shell completion scripts
    Completion {
        #[command(subcommand)]
        command: CompletionCommands,
    },
}

#[derive(Subcommand)]
pub enum CompletionCommands {
    /// Generate bash completion script
    Bash,
    /// Generate zsh completion script
    Zsh,
    /// Generate fish completion script
    Fish,
    /// Generate PowerShell completion script
    PowerShell,
}

impl CompletionCommands {
    pub fn shell(&self) -> Shell {
        match self {
            CompletionCommands::Bash => Shell::Bash,
            CompletionCommands::Zsh => Shell::Zsh,
            CompletionCommands::Fish => Shell::Fish,
            CompletionCommands::PowerShell => Shell::PowerShell,
        }
    }
}
