//! User provisioning tool.
//!
//! Creates a user that can authenticate against the sync endpoint. Runs
//! out-of-band from the server; there is no HTTP path for user creation.

use clap::Parser;
use tillsync::auth::Role;
use tillsync::storage::StorageBuilder;

/// Provision a tillsync user
#[derive(Parser, Debug)]
#[command(name = "add-user", version, about, long_about = None)]
struct Cli {
    /// Username to create
    username: String,

    /// Password (stored as a bcrypt hash)
    password: String,

    /// Role granted to the user (admin | staff)
    #[arg(long, default_value = "admin")]
    role: String,

    /// Database file path
    #[arg(long, default_value = "sales.db", env = "TILLSYNC_DB_PATH")]
    db: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let role: Role = cli
        .role
        .parse()
        .map_err(|_| format!("invalid role {:?} (expected admin or staff)", cli.role))?;

    let handles = StorageBuilder::new(&cli.db).pool_size(1).build().await?;
    handles.users.create(&cli.username, &cli.password, role).await?;
    handles.shutdown().await;

    println!("User '{}' added with role '{role}'", cli.username);
    Ok(())
}
