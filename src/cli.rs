use clap::{Parser, Subcommand};

/// CodeXI — Personal Access Token service
#[derive(Parser)]
#[command(name = "codexi-pat", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the token service
    Serve {
        /// Port to bind
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Manage personal access tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Issue a new token (prints the cleartext once)
    Issue {
        #[arg(long)]
        owner_id: String,
        #[arg(long)]
        name: String,
        /// Granted llm actions (e.g. use)
        #[arg(long, value_delimiter = ',')]
        llm: Option<Vec<String>>,
        /// Granted agent actions
        #[arg(long, value_delimiter = ',')]
        agent: Option<Vec<String>>,
        /// Granted project actions
        #[arg(long, value_delimiter = ',')]
        project: Option<Vec<String>>,
        /// Granted cli actions
        #[arg(long, value_delimiter = ',')]
        cli: Option<Vec<String>>,
        /// Expiry as RFC 3339, omit for a token that never expires
        #[arg(long)]
        expires: Option<String>,
    },
    /// List an owner's tokens
    List {
        #[arg(long)]
        owner_id: String,
    },
    /// Revoke a token
    Revoke {
        #[arg(long)]
        id: String,
        #[arg(long)]
        owner_id: String,
    },
}
