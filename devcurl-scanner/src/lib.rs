pub mod error;
pub mod map;
pub mod result;
pub mod scanner;
pub mod source;

pub use error::ScanError;
pub use map::PageMapStore;
pub use result::{ApiRecord, PageMap, PageRecord};
pub use scanner::{ScanPhase, ScanReport, Scanner};
pub use source::{BodyRetriever, CaptureLog, CaptureSource, PageInspector};
