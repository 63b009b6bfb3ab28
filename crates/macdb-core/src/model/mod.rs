// ── Domain model ──
//
// `MacRecord` is the only persisted entity. The code enums classify its
// free-form fields for display and warnings; they never reject input.

pub mod codes;
pub mod record;

pub use codes::{ConnectionType, DeviceCode};
pub use record::MacRecord;
