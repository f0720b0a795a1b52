/// Business logic services
pub mod archives;
pub mod export;
pub mod ingest;
pub mod repair;

pub use archives::ArchiveService;
pub use export::{ExportService, ExportStatus, PendingExport, PendingExports};
pub use ingest::{IngestOutcome, IngestService};
pub use repair::{RepairReport, RepairService};
