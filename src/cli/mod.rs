//! CLI entry point for devtrex-auth.

pub mod auth;

use clap::{Parser, Subcommand};

/// devtrex LinkedIn sign-in
#[derive(Parser, Debug)]
#[command(name = "devtrex-auth", version, about = "LinkedIn sign-in for devtrex")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authentication management
    Auth(AuthArgs),
}

/// Arguments for the `auth` subcommand group.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

/// Auth subcommands.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Sign in with LinkedIn
    Login(LoginArgs),
    /// Show whether tokens are stored
    Status(StatusArgs),
    /// Fetch the signed-in LinkedIn profile
    Whoami(WhoamiArgs),
    /// Remove stored tokens
    Logout,
}

/// Arguments for `devtrex-auth auth login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Paste the redirect URL instead of listening on the loopback redirect URI
    #[arg(long)]
    pub paste: bool,
}

/// Arguments for `devtrex-auth auth status`.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Treat an expired token as signed out
    #[arg(long)]
    pub check_expiry: bool,
}

/// Arguments for `devtrex-auth auth whoami`.
#[derive(Parser, Debug)]
pub struct WhoamiArgs {
    /// Print the profile as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
