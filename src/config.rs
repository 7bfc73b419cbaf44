use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_DATABASE: &str = "bookstore.db";
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Parser, Debug)]
#[command(name = "bookstore", version)]
#[command(about = "Catalog browsing site for a bookstore", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// SQLite database file
    #[arg(long, env = "BOOKSTORE_DATABASE", default_value = DEFAULT_DATABASE)]
    pub database: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the catalog over HTTP
    Serve {
        #[command(flatten)]
        db: DatabaseArgs,

        /// Address to listen on
        #[arg(long, env = "BOOKSTORE_BIND", default_value = DEFAULT_BIND)]
        bind: SocketAddr,

        /// Use a throwaway in-memory catalog holding the sample data
        #[arg(long)]
        memory: bool,
    },

    /// Create the sample publisher, author and book if missing
    Seed {
        #[command(flatten)]
        db: DatabaseArgs,
    },

    /// Request the main pages of a running server and print their status
    CheckUrls {
        /// Base URL of the server
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,
    },
}
