//! Supersector manager: reads/writes the head-pointer supersector across
//! `MIRROR_COUNT` mirrors with CRC validation and majority vote, per
//! `spec.md` §4.5.

use tracing::{debug, warn};

use crate::device::BlockDevice;
use crate::error::driver_err;
use crate::sector::{decode_super, encode_super};
use crate::{Error, MirrorGeometry, MIRROR_COUNT, SECTOR_SIZE};

/// The supersector's decoded fields: the sector-granular head pointer plus
/// the legacy byte-granular message cursor (`spec.md` §3, "legacy feature").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperMeta {
    /// Next-free logical data sector.
    pub head: u32,
    /// Byte cursor into the legacy message sector.
    pub msg_idx: u16,
    /// Whether the legacy message cursor has wrapped at least once.
    pub first_log_full: bool,
}

fn supersector_lba(geo: &MirrorGeometry, mirror: u32) -> u32 {
    geo.physical(mirror, 0)
}

/// Reads and decodes the supersector at each mirror, returning `Some(meta)`
/// for mirrors whose CRC verifies and `None` for mirrors that don't.
fn read_all<B: BlockDevice>(
    dev: &mut B,
    geo: &MirrorGeometry,
) -> Result<[Option<SuperMeta>; MIRROR_COUNT as usize], Error> {
    let mut out = [None; MIRROR_COUNT as usize];
    for (mirror, slot) in out.iter_mut().enumerate() {
        let mut sector = [0u8; SECTOR_SIZE];
        dev.read_block(supersector_lba(geo, mirror as u32), &mut sector)
            .map_err(driver_err)?;
        *slot = match decode_super(&sector) {
            Ok((head, msg_idx, first_log_full)) => Some(SuperMeta {
                head,
                msg_idx,
                first_log_full,
            }),
            Err(mismatch) => {
                warn!(mirror, stored = mismatch.stored, calculated = mismatch.calculated, "supersector CRC mismatch");
                None
            }
        };
    }
    Ok(out)
}

/// Resolves the authoritative [`SuperMeta`] across mirrors: majority vote on
/// `head` (any two of three agreeing), falling back to the lowest-indexed
/// valid copy, failing with [`Error::Meta`] if none verify.
pub fn get_meta<B: BlockDevice>(dev: &mut B, geo: &MirrorGeometry) -> Result<SuperMeta, Error> {
    let copies = read_all(dev, geo)?;
    let valid: Vec<(usize, SuperMeta)> = copies
        .iter()
        .enumerate()
        .filter_map(|(i, m)| m.map(|m| (i, m)))
        .collect();

    if valid.is_empty() {
        return Err(Error::Meta);
    }

    for &(_, candidate) in &valid {
        let agreeing = valid.iter().filter(|(_, m)| m.head == candidate.head).count();
        if agreeing >= 2 {
            debug!(head = candidate.head, "supersector majority vote");
            return Ok(candidate);
        }
    }

    let (fallback_idx, fallback) = valid[0];
    debug!(mirror = fallback_idx, head = fallback.head, "supersector fallback, no majority");
    Ok(fallback)
}

/// Returns the current head pointer (next-free logical sector).
pub fn get_head<B: BlockDevice>(dev: &mut B, geo: &MirrorGeometry) -> Result<u32, Error> {
    get_meta(dev, geo).map(|m| m.head)
}

/// Writes `meta` to every mirror's supersector, in mirror order, then syncs.
/// This is the commit point: it is the only place the on-disk supersector
/// changes.
pub(crate) fn write_meta<B: BlockDevice>(
    dev: &mut B,
    geo: &MirrorGeometry,
    meta: &SuperMeta,
) -> Result<(), Error> {
    let sector = encode_super(meta.head, meta.msg_idx, meta.first_log_full);
    for mirror in 0..MIRROR_COUNT {
        dev.write_block(supersector_lba(geo, mirror), &sector)
            .map_err(driver_err)?;
    }
    dev.sync().map_err(driver_err)?;
    Ok(())
}

/// Advances the head pointer to `new_head`, preserving the legacy message
/// fields read from the current authoritative supersector.
pub fn set_head<B: BlockDevice>(dev: &mut B, geo: &MirrorGeometry, new_head: u32) -> Result<(), Error> {
    let mut meta = get_meta(dev, geo)?;
    meta.head = new_head;
    write_meta(dev, geo, &meta)
}

/// Formats the device: writes a fresh supersector (`head = 1`, legacy
/// cursor zeroed) to every mirror, and zeroes the legacy message sector.
pub fn init_log<B: BlockDevice>(dev: &mut B, geo: &MirrorGeometry) -> Result<(), Error> {
    let zero = [0u8; SECTOR_SIZE];
    dev.write_block(supersector_lba(geo, 0) + 1, &zero)
        .map_err(driver_err)?;

    let meta = SuperMeta {
        head: 1,
        msg_idx: 0,
        first_log_full: false,
    };
    write_meta(dev, geo, &meta)
}
