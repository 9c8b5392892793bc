//! The legacy byte-granular message path, grounded on
//! `examples/original_source/src/core/storage.c`'s `save_msg`. Orthogonal to
//! the sector-granular append path: it packs single bytes into the raw
//! sector immediately after mirror 0's supersector (physical LBA 1), with
//! the cursor (`msg_idx`/`first_log_full`) living in the supersector itself.
//!
//! Unlike the append path, this sector is **not** mirrored across all `N`
//! copies — the original source never replicated it, predating the RAID
//! mirroring work, and this crate preserves that asymmetry rather than
//! silently "fixing" it.
//!
//! This module does **not** reproduce `save_msg` bit-for-bit, though: its
//! steady-state branch (not yet wrapped, cursor not at capacity) never
//! touches the dedicated message sector at all — it writes the message byte
//! into the supersector buffer already in hand and persists that back to
//! the supersector itself, stomping reserved/CRC bytes as the cursor grows.
//! That is a genuine bug in the original, not an equally-valid alternative
//! reading, and `spec.md` explicitly treats these fields as opaque/omittable
//! rather than demanding byte-exact reproduction. `push_message` below fixes
//! it: every call, from the first, writes to the dedicated message sector.
//! See `SPEC_FULL.md` §9 and `DESIGN.md`'s Open Question resolutions.

use crate::device::BlockDevice;
use crate::error::driver_err;
use crate::supersector::{self, SuperMeta};
use crate::{Error, MirrorGeometry, SECTOR_SIZE};

fn message_sector_lba(geo: &MirrorGeometry) -> u32 {
    geo.physical(0, 0) + 1
}

fn write_message_byte<B: BlockDevice>(dev: &mut B, geo: &MirrorGeometry, offset: u16, byte: u8) -> Result<(), Error> {
    let lba = message_sector_lba(geo);
    let mut sector = [0u8; SECTOR_SIZE];
    dev.read_block(lba, &mut sector).map_err(driver_err)?;
    sector[offset as usize] = byte;
    dev.write_block(lba, &sector).map_err(driver_err)
}

/// Appends one byte to the legacy message log.
///
/// Matches `save_msg`'s pre-increment cursor semantics: the cursor is
/// incremented *before* the byte is stored, so message bytes occupy offsets
/// `[1, 512)` of the message sector, not `[0, 512)`. Fails with
/// [`Error::LogFull`] once a wrapped cursor reaches 512 again without
/// advancing the cursor.
///
/// Unlike `save_msg`, every call writes the byte to the dedicated message
/// sector, not just post-wrap calls — see the module docs for why.
pub fn push_message<B: BlockDevice>(dev: &mut B, geo: &MirrorGeometry, byte: u8) -> Result<(), Error> {
    let SuperMeta {
        head,
        msg_idx,
        first_log_full,
    } = supersector::get_meta(dev, geo)?;

    let mut msg_idx = msg_idx + 1;
    let mut first_log_full = first_log_full;

    if first_log_full && msg_idx as usize == SECTOR_SIZE {
        return Err(Error::LogFull);
    }
    if !first_log_full && msg_idx as usize == SECTOR_SIZE {
        msg_idx = 0;
        first_log_full = true;
    }

    write_message_byte(dev, geo, msg_idx, byte)?;

    supersector::write_meta(
        dev,
        geo,
        &SuperMeta {
            head,
            msg_idx,
            first_log_full,
        },
    )
}
