//! Read-only recovery: reconstructs the payload stream by CRC-voting across
//! mirrors for every logical sector up to the supersector's head, per
//! `spec.md` §4.7. The reader never writes.

use tracing::warn;

use crate::device::BlockDevice;
use crate::error::driver_err;
use crate::sector::decode_data;
use crate::supersector;
use crate::{Error, MirrorGeometry, MIRROR_COUNT, PAYLOAD_SIZE, SECTOR_SIZE};

/// Outcome of reading one logical sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// At least one mirror's CRC verified; `payload` is that mirror's data.
    CrcOk,
    /// No mirror's CRC verified; `payload` is mirror 0's raw bytes, best-effort.
    CrcFail,
}

/// One row of the recovered payload stream.
#[derive(Debug, Clone)]
pub struct SectorReport {
    pub logical: u32,
    pub status: Status,
    pub mirror: u32,
    pub header: u8,
    pub payload: [u8; PAYLOAD_SIZE],
    pub crc_stored: u32,
    pub crc_calculated: u32,
}

fn crc_domain(sector: &[u8; SECTOR_SIZE]) -> (u32, u32) {
    let stored = u32::from_le_bytes(sector[SECTOR_SIZE - 4..].try_into().unwrap());
    let calculated = crate::crc::crc32(&sector[..SECTOR_SIZE - 4]);
    (stored, calculated)
}

/// Reads the supersector (via majority vote) and every logical data sector
/// `[1, head)`, returning the resolved head and one [`SectorReport`] per
/// logical sector.
pub fn read_all<B: BlockDevice>(
    dev: &mut B,
    geo: &MirrorGeometry,
) -> Result<(u32, Vec<SectorReport>), Error> {
    let head = supersector::get_head(dev, geo)?;
    let mut reports = Vec::with_capacity(head.saturating_sub(1) as usize);

    for logical in 1..head {
        let mut copies = Vec::with_capacity(MIRROR_COUNT as usize);
        for mirror in 0..MIRROR_COUNT {
            let mut sector = [0u8; SECTOR_SIZE];
            dev.read_block(geo.physical(mirror, logical), &mut sector)
                .map_err(driver_err)?;
            copies.push(sector);
        }

        let chosen = copies.iter().enumerate().find_map(|(mirror, sector)| {
            decode_data(sector).ok().map(|(header, payload)| (mirror as u32, header, payload))
        });

        let report = match chosen {
            Some((mirror, header, payload)) => {
                let (crc_stored, crc_calculated) = crc_domain(&copies[mirror as usize]);
                SectorReport {
                    logical,
                    status: Status::CrcOk,
                    mirror,
                    header,
                    payload,
                    crc_stored,
                    crc_calculated,
                }
            }
            None => {
                warn!(logical, "all mirrors failed CRC, emitting best-effort mirror 0 dump");
                let sector = copies[0];
                let (crc_stored, crc_calculated) = crc_domain(&sector);
                let mut payload = [0u8; PAYLOAD_SIZE];
                payload.copy_from_slice(&sector[1..1 + PAYLOAD_SIZE]);
                SectorReport {
                    logical,
                    status: Status::CrcFail,
                    mirror: 0,
                    header: sector[0],
                    payload,
                    crc_stored,
                    crc_calculated,
                }
            }
        };
        reports.push(report);
    }

    Ok((head, reports))
}
