use std::sync::Arc;

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod forms;
pub mod models;
pub mod pages;
pub mod render;
pub mod server;
pub mod store;
pub mod validation;

use config::{Cli, Commands};
use error::{CatalogError, Result};
use server::AppState;
use store::{CatalogStore, MemoryStore, SqliteStore};

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve { db, bind, memory } => {
            let store: Arc<dyn CatalogStore> = if memory {
                let store = MemoryStore::new();
                commands::seed(&store)?;
                log::info!("serving the in-memory sample catalog");
                Arc::new(store)
            } else {
                Arc::new(SqliteStore::open(&db.database)?)
            };
            let state = AppState::new(store)?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(server::serve(state, bind))
        }
        Commands::Seed { db } => {
            let store = SqliteStore::open(&db.database)?;
            let report = commands::seed(&store)?;
            println!("{}", report);
            Ok(())
        }
        Commands::CheckUrls { base_url } => {
            let checks = commands::check_urls(&base_url)?;
            for check in &checks {
                println!("{}", check);
            }
            let failed = checks.iter().filter(|c| c.outcome.is_err()).count();
            if failed > 0 {
                return Err(CatalogError::UrlCheck {
                    failed,
                    total: checks.len(),
                });
            }
            Ok(())
        }
    }
}
