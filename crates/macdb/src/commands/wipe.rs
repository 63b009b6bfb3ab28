//! `wipe-all` and `destroy`.

use macdb_core::MacStore;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn wipe_all(store: &MacStore, global: &GlobalOpts) -> Result<(), CliError> {
    store.clean().await?;
    output::print_output("Database was cleaned.", global.quiet);
    Ok(())
}

pub async fn destroy(store: MacStore, global: &GlobalOpts) -> Result<(), CliError> {
    let collection = store.collection().to_owned();
    if !util::confirm(
        &format!("Delete every record and drop database '{collection}'?"),
        "destroy",
        global.yes,
    )? {
        return Ok(());
    }

    store.terminate().await?;
    output::print_output(&format!("Database '{collection}' was dropped."), global.quiet);
    Ok(())
}
