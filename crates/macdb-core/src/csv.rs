// ── Line-oriented CSV codec ──
//
// `MAC,WE,code,info` per line, split on every comma. No quoting and no
// escaping, so a field containing a comma cannot round-trip. Import stops at
// the first empty line.

use std::io::BufRead;

use tracing::warn;

use crate::error::CoreError;
use crate::model::MacRecord;

/// Parse one stripped input line. `line_no` is 1-based and only used for
/// error reporting.
///
/// Fields past the fourth are logged and dropped.
pub fn parse_line(line_no: usize, line: &str) -> Result<MacRecord, CoreError> {
    let fields: Vec<&str> = line.split(',').collect();
    match fields.as_slice() {
        [mac, connection_type, device_code, info, rest @ ..] => {
            if !rest.is_empty() {
                warn!(
                    line = line_no,
                    ignored = rest.len(),
                    "ignoring fields after the fourth"
                );
            }
            Ok(MacRecord::new(mac, *connection_type, *device_code, *info))
        }
        _ => Err(CoreError::MalformedCsv {
            line: line_no,
            fields: fields.len(),
        }),
    }
}

/// Render `record` as `MAC,WE,code,info`.
pub fn format_line(record: &MacRecord) -> String {
    format!(
        "{},{},{},{}",
        record.mac, record.connection_type, record.device_code, record.info
    )
}

/// Iterator over the records in a CSV stream.
///
/// Each line is stripped of surrounding whitespace before parsing. Iteration
/// ends at end of input or at the first line that is empty after stripping;
/// anything below that line is never read.
pub struct CsvReader<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
    done: bool,
}

impl<R: BufRead> CsvReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for CsvReader<R> {
    type Item = Result<MacRecord, CoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let line = match self.lines.next() {
            None => {
                self.done = true;
                return None;
            }
            Some(Err(e)) => {
                self.done = true;
                return Some(Err(e.into()));
            }
            Some(Ok(line)) => line,
        };
        self.line_no += 1;

        let line = line.trim();
        if line.is_empty() {
            self.done = true;
            return None;
        }
        Some(parse_line(self.line_no, line))
    }
}
