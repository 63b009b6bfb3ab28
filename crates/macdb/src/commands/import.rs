//! `import-csv`: upsert every line of a CSV file.
//!
//! Lines are applied one by one. A store failure on a line is logged and the
//! import moves on; a malformed line stops it.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use macdb_core::csv::CsvReader;
use macdb_core::{CoreError, MacStore};
use tracing::{info, warn};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(store: &MacStore, file: &Path, global: &GlobalOpts) -> Result<(), CliError> {
    let path = file.display().to_string();
    let reader = File::open(file)
        .map(BufReader::new)
        .map_err(|source| CliError::ReadFile {
            path: path.clone(),
            source,
        })?;

    let mut processed = 0usize;
    let mut failed = 0usize;
    for (index, record) in CsvReader::new(reader).enumerate() {
        let record = record.map_err(|e| match e {
            CoreError::MalformedCsv { line, fields } => CliError::MalformedCsv {
                path: path.clone(),
                line,
                fields,
            },
            other => other.into(),
        })?;
        util::warn_unknown_codes(&record);
        match store.put(&record.mac, &record).await {
            Ok(_) => processed += 1,
            Err(e) => {
                warn!(line = index + 1, mac = %record.mac, error = %e, "line not imported");
                failed += 1;
            }
        }
    }

    info!(file = %path, processed, failed, "import finished");
    let summary = if failed == 0 {
        format!("Processed {processed} entries.")
    } else {
        format!("Processed {processed} entries, {failed} failed.")
    };
    output::print_output(&summary, global.quiet);
    Ok(())
}
