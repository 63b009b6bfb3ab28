//! `upsert-one`: add or update a single record.

use macdb_core::{MacRecord, MacStore};
use tracing::debug;

use crate::cli::{GlobalOpts, UpsertArgs};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(store: &MacStore, args: UpsertArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let record = MacRecord::new(
        &args.mac,
        args.connection_type,
        args.device_code,
        args.info,
    );
    util::warn_unknown_codes(&record);

    let outcome = store.put(&args.mac, &record).await?;
    debug!(?outcome, %record, "upserted");

    output::print_output("Added 1 MAC entry.", global.quiet);
    Ok(())
}
