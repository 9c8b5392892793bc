//! Append-only, N-way mirrored block-level logging store.
//!
//! The store owns a raw block device (see [`device::BlockDevice`]) and writes
//! fixed-shape, CRC-32-protected sectors sequentially into `N` identical
//! mirror slices of the device's LBA space. A replicated "supersector" holds
//! the log's head pointer. See `SPEC_FULL.md` at the workspace root for the
//! full behavioral contract.

pub mod append;
pub mod crc;
pub mod device;
pub mod error;
pub mod geometry;
pub mod legacy_msg;
pub mod reader;
pub mod sector;
pub mod supersector;

pub use append::append;
pub use device::{BlockDevice, MemBlockDevice, MemDeviceError};
pub use error::Error;
pub use geometry::MirrorGeometry;
pub use legacy_msg::push_message;
pub use reader::{read_all, SectorReport, Status};
pub use supersector::{get_head, init_log, set_head, SuperMeta};

/// Bytes per sector exchanged with the block device.
pub const SECTOR_SIZE: usize = 512;
/// Bytes of caller payload carried by one data sector.
pub const PAYLOAD_SIZE: usize = SECTOR_SIZE - CRC_SIZE - HEADER_SIZE;
/// Size of the caller-supplied tag byte in a data sector.
pub const HEADER_SIZE: usize = 1;
/// Size of the little-endian CRC-32 trailer.
pub const CRC_SIZE: usize = 4;
/// Number of replicated mirror copies of the live span.
pub const MIRROR_COUNT: u32 = 3;

/// Offset within a sector where the CRC-32 domain ends (and the stored CRC begins).
pub(crate) const CRC_DOMAIN_LEN: usize = SECTOR_SIZE - CRC_SIZE;
