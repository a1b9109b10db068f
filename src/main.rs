//! devtrex-auth CLI binary entry point.

use devtrex_auth::cli::{AuthCommands, Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("devtrex_auth=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse_args();

    let result = match cli.command {
        Commands::Auth(auth_args) => match auth_args.command {
            AuthCommands::Login(args) => devtrex_auth::cli::auth::handle_login(args.paste).await,
            AuthCommands::Status(args) => {
                devtrex_auth::cli::auth::handle_status(args.check_expiry).await
            }
            AuthCommands::Whoami(args) => devtrex_auth::cli::auth::handle_whoami(args.json).await,
            AuthCommands::Logout => devtrex_auth::cli::auth::handle_logout().await,
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        if let Some(hint) = e.recovery_hint() {
            eprintln!("Hint: {hint}");
        }
        std::process::exit(1);
    }
}
