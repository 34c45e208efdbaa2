//! Value log segment files.
//!
//! Segments are named `vlog-NNNNNN.seg` where `NNNNNN` is a zero-padded segment number.
//!
//! # Segment Layout
//!
//! ```text
//! ┌────────────────────────────────────┐
//! │ Segment Header (32 bytes)          │
//! ├────────────────────────────────────┤
//! │ Record 1                           │
//! ├────────────────────────────────────┤
//! │ Record 2                           │
//! ├────────────────────────────────────┤
//! │ ...                                │
//! └────────────────────────────────────┘
//! ```

use byteorder::{ByteOrder, LittleEndian};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Magic bytes identifying a value log segment: "VTXT"
pub const SEGMENT_MAGIC: [u8; 4] = *b"VTXT";

/// Current segment format version
pub const SEGMENT_FORMAT_VERSION: u32 = 1;

/// Size of segment header in bytes
pub const SEGMENT_HEADER_SIZE: usize = 32;

const SEGMENT_PREFIX: &str = "vlog-";
const SEGMENT_SUFFIX: &str = ".seg";

/// Segment header (32 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHeader {
    /// Magic bytes: "VTXT"
    pub magic: [u8; 4],
    /// Format version for forward compatibility
    pub format_version: u32,
    /// Segment number (monotonically increasing)
    pub segment_number: u64,
    /// Store UUID shared by every segment of one store
    pub store_uuid: [u8; 16],
}

impl SegmentHeader {
    /// Create a new segment header.
    pub fn new(segment_number: u64, store_uuid: [u8; 16]) -> Self {
        SegmentHeader {
            magic: SEGMENT_MAGIC,
            format_version: SEGMENT_FORMAT_VERSION,
            segment_number,
            store_uuid,
        }
    }

    /// Serialize header to bytes.
    pub fn to_bytes(&self) -> [u8; SEGMENT_HEADER_SIZE] {
        let mut bytes = [0u8; SEGMENT_HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        LittleEndian::write_u32(&mut bytes[4..8], self.format_version);
        LittleEndian::write_u64(&mut bytes[8..16], self.segment_number);
        bytes[16..32].copy_from_slice(&self.store_uuid);
        bytes
    }

    /// Deserialize header from bytes.
    pub fn from_bytes(bytes: &[u8; SEGMENT_HEADER_SIZE]) -> Self {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        let mut store_uuid = [0u8; 16];
        store_uuid.copy_from_slice(&bytes[16..32]);
        SegmentHeader {
            magic,
            format_version: LittleEndian::read_u32(&bytes[4..8]),
            segment_number: LittleEndian::read_u64(&bytes[8..16]),
            store_uuid,
        }
    }

    /// Validate magic bytes and format version.
    pub fn is_valid(&self) -> bool {
        self.magic == SEGMENT_MAGIC && self.format_version == SEGMENT_FORMAT_VERSION
    }
}

/// Handle to the writable (active) segment.
pub struct Segment {
    file: File,
    segment_number: u64,
    write_position: u64,
    path: PathBuf,
    /// Set when a failed append could not be rolled back
    poisoned: bool,
    #[cfg(test)]
    fault: Option<Fault>,
}

/// Failure injected into the next append
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    /// Write only the first `n` bytes, then fail
    ShortWrite(usize),
    /// Write everything, then fail the sync
    Sync,
}

impl Segment {
    /// Create a new segment file and write its header.
    pub fn create(dir: &Path, segment_number: u64, store_uuid: [u8; 16]) -> std::io::Result<Self> {
        let path = Self::segment_path(dir, segment_number);

        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .read(true)
            .open(&path)?;

        let header = SegmentHeader::new(segment_number, store_uuid);
        if let Err(e) = file
            .write_all(&header.to_bytes())
            .and_then(|()| file.sync_all())
        {
            drop(file);
            let _ = std::fs::remove_file(&path);
            return Err(e);
        }

        Ok(Segment {
            file,
            segment_number,
            write_position: SEGMENT_HEADER_SIZE as u64,
            path,
            poisoned: false,
            #[cfg(test)]
            fault: None,
        })
    }

    /// Open an existing segment for appending at `valid_end`.
    ///
    /// Anything past `valid_end` (a torn tail record) is truncated away.
    pub fn open_append(dir: &Path, segment_number: u64, valid_end: u64) -> std::io::Result<Self> {
        let path = Self::segment_path(dir, segment_number);
        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;

        let len = file.metadata()?.len();
        if len > valid_end {
            file.set_len(valid_end)?;
            file.sync_all()?;
        }
        file.seek(SeekFrom::Start(valid_end))?;

        Ok(Segment {
            file,
            segment_number,
            write_position: valid_end,
            path,
            poisoned: false,
            #[cfg(test)]
            fault: None,
        })
    }

    /// Read a whole segment file: header plus the raw bytes after it.
    pub fn read_all(path: &Path) -> std::io::Result<(SegmentHeader, Vec<u8>)> {
        let mut file = File::open(path)?;
        let mut header_bytes = [0u8; SEGMENT_HEADER_SIZE];
        file.read_exact(&mut header_bytes)?;
        let mut body = Vec::new();
        file.read_to_end(&mut body)?;
        Ok((SegmentHeader::from_bytes(&header_bytes), body))
    }

    /// Segment file path: `vlog-NNNNNN.seg`.
    pub fn segment_path(dir: &Path, segment_number: u64) -> PathBuf {
        dir.join(format!("{}{:06}{}", SEGMENT_PREFIX, segment_number, SEGMENT_SUFFIX))
    }

    /// Parse a segment number out of a file name, if it is a segment file.
    pub fn parse_segment_number(file_name: &str) -> Option<u64> {
        file_name
            .strip_prefix(SEGMENT_PREFIX)?
            .strip_suffix(SEGMENT_SUFFIX)?
            .parse()
            .ok()
    }

    /// List segment numbers present in `dir`, ascending.
    pub fn list(dir: &Path) -> std::io::Result<Vec<u64>> {
        let mut numbers = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if let Some(n) = entry.file_name().to_str().and_then(Self::parse_segment_number) {
                numbers.push(n);
            }
        }
        numbers.sort_unstable();
        Ok(numbers)
    }

    /// Get segment number.
    pub fn segment_number(&self) -> u64 {
        self.segment_number
    }

    /// Current segment size in bytes, header included.
    pub fn size(&self) -> u64 {
        self.write_position
    }

    /// Get the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append bytes, syncing them if `sync` is set; returns the offset they
    /// were written at.
    ///
    /// On failure the file is truncated back to its previous end, so a
    /// failed append leaves nothing behind. If that truncation also fails
    /// the segment is poisoned and refuses every later append.
    pub fn append(&mut self, data: &[u8], sync: bool) -> std::io::Result<u64> {
        if self.poisoned {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("segment {} is poisoned by a failed rollback", self.segment_number),
            ));
        }

        let offset = self.write_position;
        match self.write_at_end(data, sync) {
            Ok(()) => {
                self.write_position += data.len() as u64;
                Ok(offset)
            }
            Err(e) => {
                if let Err(rollback) = self.rollback(offset) {
                    self.poisoned = true;
                    tracing::error!(
                        target: "vectext::store",
                        segment = self.segment_number,
                        error = %rollback,
                        "Failed to roll back a failed append"
                    );
                }
                Err(e)
            }
        }
    }

    fn write_at_end(&mut self, data: &[u8], sync: bool) -> std::io::Result<()> {
        #[cfg(test)]
        if let Some(fault) = self.fault.take() {
            return inject(&mut self.file, fault, data);
        }
        self.file.write_all(data)?;
        if sync {
            self.file.sync_data()?;
        }
        Ok(())
    }

    fn rollback(&mut self, offset: u64) -> std::io::Result<()> {
        self.file.set_len(offset)?;
        self.file.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Make the next append fail with `fault`.
    #[cfg(test)]
    pub(crate) fn inject_fault(&mut self, fault: Fault) {
        self.fault = Some(fault);
    }

    /// Sync segment data to disk.
    pub fn sync(&mut self) -> std::io::Result<()> {
        self.file.sync_data()
    }
}

#[cfg(test)]
fn inject(file: &mut File, fault: Fault, data: &[u8]) -> std::io::Result<()> {
    match fault {
        Fault::ShortWrite(n) => {
            file.write_all(&data[..n.min(data.len())])?;
            Err(std::io::Error::new(std::io::ErrorKind::WriteZero, "short write"))
        }
        Fault::Sync => {
            file.write_all(data)?;
            Err(std::io::Error::new(std::io::ErrorKind::Other, "sync failed"))
        }
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segment")
            .field("segment_number", &self.segment_number)
            .field("write_position", &self.write_position)
            .field("path", &self.path)
            .field("poisoned", &self.poisoned)
            .finish()
    }
}
