//! Service layer used by client apps.

mod records;

pub use records::RecordService;
