//! Command dispatch: bridges CLI args -> store calls -> output formatting.

pub mod export;
pub mod import;
pub mod records;
pub mod upsert;
pub mod util;
pub mod wipe;

use macdb_core::MacStore;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a store-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, store: MacStore, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::UpsertOne(args) => upsert::handle(&store, args, global).await,
        Command::ImportCsv { file } => import::handle(&store, &file, global).await,
        Command::ExportCsv => export::handle(&store, global).await,
        Command::WipeAll => wipe::wipe_all(&store, global).await,
        Command::Destroy => wipe::destroy(store, global).await,
        Command::Show { mac } => records::show(&store, &mac, global).await,
        Command::Remove { mac } => records::remove(&store, &mac, global).await,
        Command::List => records::list(&store, global).await,
        Command::Count => records::count(&store, global).await,
        // Handled before a store is opened.
        Command::Completions(_) => Ok(()),
    }
}
