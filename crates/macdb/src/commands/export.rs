//! `export-csv`: every record to stdout, sorted by MAC.

use std::io::{self, Write};

use macdb_core::MacStore;
use macdb_core::csv::format_line;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub async fn handle(store: &MacStore, global: &GlobalOpts) -> Result<(), CliError> {
    let records = store.list_all().await?;

    let mut stdout = io::stdout().lock();
    for record in &records {
        writeln!(stdout, "{}", format_line(record))?;
    }
    stdout.flush()?;

    // Summary goes to stderr so stdout stays valid CSV.
    if !global.quiet {
        eprintln!("Processed {} entries.", records.len());
    }
    Ok(())
}
