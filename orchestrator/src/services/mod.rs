//! Service implementations
//!
//! Real implementations of the adapter traits plus report output. These
//! handle the actual I/O: helper programs, measurement tools and files.

pub mod command;
pub mod device;
pub mod metrics;
pub mod progress_store;
pub mod report_writer;

pub use command::ExternalCommand;
pub use device::CommandDevice;
pub use metrics::CommandMetrics;
pub use progress_store::FileProgressStore;
pub use report_writer::ReportWriter;
