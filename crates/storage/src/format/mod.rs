//! On-disk format of the value log
//!
//! - `segment`: segment files and their 32-byte header
//! - `record`: one checksummed record per committed transaction

pub mod record;
pub mod segment;

pub use record::{entry_size, LogRecord, RecordError, RECORD_FORMAT_VERSION};
pub use segment::{Segment, SegmentHeader, SEGMENT_HEADER_SIZE, SEGMENT_MAGIC};
