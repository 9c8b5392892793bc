//! The block device capability the core consumes.
//!
//! `spec.md` §4.2 treats the backend as an external collaborator: the core
//! only ever calls `init`/`read_block`/`write_block`/`sync`/`deinit` through
//! this trait and never assumes retries. [`MemBlockDevice`] is an in-memory
//! implementation for unit and property tests; production backends (e.g.
//! `mirrorlog-backend-file`'s `FileBlockDevice`) live in their own crates.

use crate::SECTOR_SIZE;

/// A raw block device: fixed-size sector reads and writes, plus capacity
/// reporting and lifecycle hooks.
pub trait BlockDevice {
    /// The backend's own error type. The core never inspects it beyond
    /// `Display`; it collapses every variant to [`crate::Error::Driver`].
    type Error: std::error::Error;

    /// Opens the backend and populates its capacity fields.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Reads exactly [`SECTOR_SIZE`] bytes at LBA `lba`.
    fn read_block(&mut self, lba: u32, buf: &mut [u8; SECTOR_SIZE]) -> Result<(), Self::Error>;

    /// Writes exactly [`SECTOR_SIZE`] bytes at LBA `lba`. Not guaranteed
    /// durable until [`BlockDevice::sync`].
    fn write_block(&mut self, lba: u32, buf: &[u8; SECTOR_SIZE]) -> Result<(), Self::Error>;

    /// Flushes pending writes.
    fn sync(&mut self) -> Result<(), Self::Error>;

    /// Releases backend resources. Infallible by contract: a backend that
    /// can fail to close should do so in `Drop` and log, not here.
    fn deinit(&mut self);

    /// Total number of [`SECTOR_SIZE`]-byte sectors the backend exposes.
    fn total_sectors(&self) -> u32;

    /// Human-readable backend identifier, for log context.
    fn name(&self) -> &str;
}

/// In-memory [`BlockDevice`], for tests. Never fails except on an
/// out-of-range LBA, and exposes [`MemBlockDevice::corrupt_byte`] so tests
/// can simulate bit rot / partial writes without going through the trait.
pub struct MemBlockDevice {
    name: String,
    sectors: Vec<[u8; SECTOR_SIZE]>,
}

/// Error returned by [`MemBlockDevice`] when an LBA is out of range.
#[derive(Debug, thiserror::Error)]
pub enum MemDeviceError {
    #[error("lba {lba} out of range (total_sectors={total})")]
    OutOfRange { lba: u32, total: u32 },
}

impl MemBlockDevice {
    /// Creates a zeroed device with `total_sectors` sectors.
    pub fn new(total_sectors: u32) -> Self {
        Self {
            name: "mem".to_string(),
            sectors: vec![[0u8; SECTOR_SIZE]; total_sectors as usize],
        }
    }

    /// Overwrites a single byte of sector `lba`, simulating bit rot. Panics
    /// if `lba` or `offset` is out of range — this is a test helper, not a
    /// public-contract operation.
    pub fn corrupt_byte(&mut self, lba: u32, offset: usize, value: u8) {
        self.sectors[lba as usize][offset] = value;
    }

    /// Returns a copy of the raw bytes at `lba`, bypassing CRC validation.
    /// Test-only escape hatch for asserting on-disk layout directly.
    pub fn raw_sector(&self, lba: u32) -> [u8; SECTOR_SIZE] {
        self.sectors[lba as usize]
    }
}

impl BlockDevice for MemBlockDevice {
    type Error = MemDeviceError;

    fn init(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn read_block(&mut self, lba: u32, buf: &mut [u8; SECTOR_SIZE]) -> Result<(), Self::Error> {
        let sector = self.sectors.get(lba as usize).ok_or(MemDeviceError::OutOfRange {
            lba,
            total: self.sectors.len() as u32,
        })?;
        buf.copy_from_slice(sector);
        Ok(())
    }

    fn write_block(&mut self, lba: u32, buf: &[u8; SECTOR_SIZE]) -> Result<(), Self::Error> {
        let total = self.sectors.len() as u32;
        let sector = self
            .sectors
            .get_mut(lba as usize)
            .ok_or(MemDeviceError::OutOfRange { lba, total })?;
        sector.copy_from_slice(buf);
        Ok(())
    }

    fn sync(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn deinit(&mut self) {}

    fn total_sectors(&self) -> u32 {
        self.sectors.len() as u32
    }

    fn name(&self) -> &str {
        &self.name
    }
}
