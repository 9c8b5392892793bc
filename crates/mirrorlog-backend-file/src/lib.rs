//! A POSIX file/loopback-device [`BlockDevice`] backend, grounded on
//! `examples/original_source/src/drivers/linux/linux_driver.c`: open the
//! path read-write, `pread`/`pwrite` at `lba * SECTOR_SIZE`, `fsync` on
//! sync. Works equally against a plain file, a loopback device
//! (`/dev/loopN`), or a raw partition.

use std::fs::{File, OpenOptions};
use std::path::Path;

use mirrorlog_core::{BlockDevice, SECTOR_SIZE};
use tracing::{debug, info};

/// Errors a [`FileBlockDevice`] can surface. Collapsed to
/// `mirrorlog_core::Error::Driver` by the core at the `BlockDevice`
/// boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to open {path}: {source}")]
    Open { path: String, #[source] source: std::io::Error },

    #[error("I/O error at lba {lba}: {source}")]
    Io { lba: u32, #[source] source: std::io::Error },

    #[error("short read/write at lba {lba}: expected {expected} bytes, got {actual}")]
    ShortTransfer { lba: u32, expected: usize, actual: usize },

    #[error("lba {lba} is out of range (total_sectors={total})")]
    OutOfRange { lba: u32, total: u32 },

    #[error("failed to determine device size for {path}: {source}")]
    Size { path: String, #[source] source: std::io::Error },
}

/// A file- or loopback-device-backed block device.
///
/// Capacity is derived from the file's length at [`FileBlockDevice::init`]
/// time, rounded down to a whole number of sectors. The stdlib has no
/// portable way to query a raw block special file's size (no `ioctl`
/// wrapper), so callers targeting a raw device should pass an explicit
/// `total_sectors` override via [`FileBlockDevice::with_total_sectors`].
pub struct FileBlockDevice {
    path: String,
    file: Option<File>,
    total_sectors: u32,
    total_sectors_override: Option<u32>,
}

impl FileBlockDevice {
    /// Prepares (but does not yet open) a backend for `path`. Call
    /// [`BlockDevice::init`] before use.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().display().to_string(),
            file: None,
            total_sectors: 0,
            total_sectors_override: None,
        }
    }

    /// Overrides capacity detection, for raw block devices whose size can't
    /// be read back from the filesystem layer.
    pub fn with_total_sectors(mut self, total_sectors: u32) -> Self {
        self.total_sectors_override = Some(total_sectors);
        self
    }

    /// Creates (or truncates) a plain file of `total_sectors * SECTOR_SIZE`
    /// bytes and opens it, calling [`BlockDevice::init`] internally. Used by
    /// the CLI's `init` subcommand and by tests.
    pub fn create(path: impl AsRef<Path>, total_sectors: u32) -> Result<Self, Error> {
        let path_ref = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path_ref)
            .map_err(|source| Error::Open {
                path: path_ref.display().to_string(),
                source,
            })?;
        file.set_len(u64::from(total_sectors) * SECTOR_SIZE as u64)
            .map_err(|source| Error::Open {
                path: path_ref.display().to_string(),
                source,
            })?;
        info!(path = %path_ref.display(), total_sectors, "created file-backed device");
        Ok(Self {
            path: path_ref.display().to_string(),
            file: Some(file),
            total_sectors,
            total_sectors_override: Some(total_sectors),
        })
    }

    fn file_mut(&mut self) -> &mut File {
        self.file.as_mut().expect("FileBlockDevice used before init()")
    }

    #[cfg(unix)]
    fn pread(&mut self, lba: u32, buf: &mut [u8; SECTOR_SIZE]) -> Result<(), Error> {
        use std::os::unix::fs::FileExt;
        let offset = u64::from(lba) * SECTOR_SIZE as u64;
        self.file_mut()
            .read_exact_at(buf, offset)
            .map_err(|source| Error::Io { lba, source })
    }

    #[cfg(not(unix))]
    fn pread(&mut self, lba: u32, buf: &mut [u8; SECTOR_SIZE]) -> Result<(), Error> {
        use std::io::{Read, Seek, SeekFrom};
        let offset = u64::from(lba) * SECTOR_SIZE as u64;
        let file = self.file_mut();
        file.seek(SeekFrom::Start(offset)).map_err(|source| Error::Io { lba, source })?;
        file.read_exact(buf).map_err(|source| Error::Io { lba, source })
    }

    #[cfg(unix)]
    fn pwrite(&mut self, lba: u32, buf: &[u8; SECTOR_SIZE]) -> Result<(), Error> {
        use std::os::unix::fs::FileExt;
        let offset = u64::from(lba) * SECTOR_SIZE as u64;
        self.file_mut()
            .write_all_at(buf, offset)
            .map_err(|source| Error::Io { lba, source })
    }

    #[cfg(not(unix))]
    fn pwrite(&mut self, lba: u32, buf: &[u8; SECTOR_SIZE]) -> Result<(), Error> {
        use std::io::{Seek, SeekFrom, Write};
        let offset = u64::from(lba) * SECTOR_SIZE as u64;
        let file = self.file_mut();
        file.seek(SeekFrom::Start(offset)).map_err(|source| Error::Io { lba, source })?;
        file.write_all(buf).map_err(|source| Error::Io { lba, source })
    }
}

impl BlockDevice for FileBlockDevice {
    type Error = Error;

    fn init(&mut self) -> Result<(), Self::Error> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|source| Error::Open {
                path: self.path.clone(),
                source,
            })?;

        self.total_sectors = match self.total_sectors_override {
            Some(n) => n,
            None => {
                let len = file
                    .metadata()
                    .map_err(|source| Error::Size {
                        path: self.path.clone(),
                        source,
                    })?
                    .len();
                (len / SECTOR_SIZE as u64) as u32
            }
        };

        debug!(path = %self.path, total_sectors = self.total_sectors, "opened block device");
        self.file = Some(file);
        Ok(())
    }

    fn read_block(&mut self, lba: u32, buf: &mut [u8; SECTOR_SIZE]) -> Result<(), Self::Error> {
        if lba >= self.total_sectors {
            return Err(Error::OutOfRange { lba, total: self.total_sectors });
        }
        self.pread(lba, buf)
    }

    fn write_block(&mut self, lba: u32, buf: &[u8; SECTOR_SIZE]) -> Result<(), Self::Error> {
        if lba >= self.total_sectors {
            return Err(Error::OutOfRange { lba, total: self.total_sectors });
        }
        self.pwrite(lba, buf)
    }

    fn sync(&mut self) -> Result<(), Self::Error> {
        self.file_mut().sync_data().map_err(|source| Error::Io { lba: 0, source })
    }

    fn deinit(&mut self) {
        self.file = None;
    }

    fn total_sectors(&self) -> u32 {
        self.total_sectors
    }

    fn name(&self) -> &str {
        &self.path
    }
}
