use clap::Parser;
use sqlx::SqlitePool;
use vigil_core::repositories::RepositoryProvider;
use vigil_storage_sqlite::SqliteRepositoryProvider;

/// Command line interface for Vigil
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database connection string
    #[arg(long, env = "VIGIL_DB_URL")]
    db_url: String,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(clap::Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate => {
            println!("Running migrations...");
            let pool = SqlitePool::connect(&cli.db_url).await.unwrap();
            let repositories = SqliteRepositoryProvider::new(pool);
            repositories.migrate().await.unwrap();
        }
        Commands::Version => {
            println!("Vigil v{}", env!("CARGO_PKG_VERSION"));
        }
    }
}
