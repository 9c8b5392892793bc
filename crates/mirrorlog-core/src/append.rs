//! Append engine: encodes a caller buffer into data sectors and writes them
//! to every mirror's next-free logical sector, advancing the head pointer
//! only once every mirror's batch has landed. See `spec.md` §4.6.

use tracing::{info, instrument};

use crate::device::BlockDevice;
use crate::error::driver_err;
use crate::sector::encode_data;
use crate::{supersector, Error, MirrorGeometry, MIRROR_COUNT, PAYLOAD_SIZE};

/// Appends `buffer` (a multiple of [`PAYLOAD_SIZE`] bytes long) tagged with
/// `header`, replicated across every mirror, then advances the head.
///
/// Fails with [`Error::Param`] if `buffer`'s length isn't a multiple of
/// [`PAYLOAD_SIZE`], with [`Error::Full`] if any mirror's slice (or the
/// device) would overflow, and with [`Error::Driver`] on any backend
/// failure. On any failure the head pointer is left untouched.
#[instrument(skip(dev, buffer), fields(header, len = buffer.len()))]
pub fn append<B: BlockDevice>(
    dev: &mut B,
    geo: &MirrorGeometry,
    header: u8,
    buffer: &[u8],
) -> Result<(), Error> {
    if buffer.len() % PAYLOAD_SIZE != 0 {
        return Err(Error::Param(format!(
            "buffer length {} is not a multiple of PAYLOAD_SIZE ({PAYLOAD_SIZE})",
            buffer.len()
        )));
    }
    let sectors = buffer.len() / PAYLOAD_SIZE;

    let base = supersector::get_head(dev, geo)?;

    for mirror in 0..MIRROR_COUNT {
        for slot in 0..sectors {
            let logical = base + slot as u32;
            if !geo.in_bounds(mirror, logical) {
                return Err(Error::Full);
            }
            let mut payload = [0u8; PAYLOAD_SIZE];
            payload.copy_from_slice(&buffer[slot * PAYLOAD_SIZE..(slot + 1) * PAYLOAD_SIZE]);
            let sector = encode_data(header, &payload);
            dev.write_block(geo.physical(mirror, logical), &sector)
                .map_err(driver_err)?;
        }
    }

    let new_head = base + sectors as u32;
    supersector::set_head(dev, geo, new_head)?;
    info!(base, new_head, sectors, "append committed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MemBlockDevice;
    use crate::sector::decode_data;
    use crate::SECTOR_SIZE;

    fn fresh(total_sectors: u32) -> (MemBlockDevice, MirrorGeometry) {
        let mut dev = MemBlockDevice::new(total_sectors);
        let geo = MirrorGeometry::new(total_sectors).unwrap();
        supersector::init_log(&mut dev, &geo).unwrap();
        (dev, geo)
    }

    #[test]
    fn single_sector_write_and_head_advance() {
        let (mut dev, geo) = fresh(90);
        let buf = [12u8; PAYLOAD_SIZE];
        append(&mut dev, &geo, 0xAB, &buf).unwrap();

        assert_eq!(supersector::get_head(&mut dev, &geo).unwrap(), 2);
        for mirror in 0..3 {
            let lba = geo.physical(mirror, 1);
            let sector = dev.raw_sector(lba);
            let (header, payload) = decode_data(&sector).unwrap();
            assert_eq!(header, 0xAB);
            assert_eq!(payload, buf);
        }
    }

    #[test]
    fn two_sequential_batches() {
        let (mut dev, geo) = fresh(90);
        append(&mut dev, &geo, 0xAB, &[12u8; PAYLOAD_SIZE]).unwrap();
        append(&mut dev, &geo, 0xBC, &[6u8; PAYLOAD_SIZE]).unwrap();

        assert_eq!(supersector::get_head(&mut dev, &geo).unwrap(), 3);
        for mirror in 0..3 {
            let lba = geo.physical(mirror, 2);
            let (header, payload) = decode_data(&dev.raw_sector(lba)).unwrap();
            assert_eq!(header, 0xBC);
            assert_eq!(payload, [6u8; PAYLOAD_SIZE]);
        }
    }

    #[test]
    fn multi_sector_batch_lands_sequentially_per_mirror() {
        let (mut dev, geo) = fresh(90);
        let mut buf = Vec::new();
        for i in 0..3u8 {
            buf.extend(std::iter::repeat(i).take(PAYLOAD_SIZE));
        }
        append(&mut dev, &geo, 0x01, &buf).unwrap();

        assert_eq!(supersector::get_head(&mut dev, &geo).unwrap(), 4);
        for mirror in 0..3 {
            for (slot, expected) in (0u8..3).enumerate() {
                let logical = 1 + slot as u32;
                let lba = geo.physical(mirror, logical);
                let (_, payload) = decode_data(&dev.raw_sector(lba)).unwrap();
                assert_eq!(payload, [expected; PAYLOAD_SIZE]);
            }
        }
    }

    #[test]
    fn bad_length_is_rejected_without_advancing_head() {
        let (mut dev, geo) = fresh(90);
        let err = append(&mut dev, &geo, 0, &[0u8; PAYLOAD_SIZE - 1]).unwrap_err();
        assert!(matches!(err, Error::Param(_)));
        assert_eq!(supersector::get_head(&mut dev, &geo).unwrap(), 1);
    }

    #[test]
    fn exhausting_mirror_slice_fails_full_and_head_unchanged() {
        // total_sectors = 12 => stride = 4, logical in [1, 4).
        let (mut dev, geo) = fresh(12);
        for _ in 0..3 {
            append(&mut dev, &geo, 0, &[1u8; PAYLOAD_SIZE]).unwrap();
        }
        assert_eq!(supersector::get_head(&mut dev, &geo).unwrap(), 4);

        let err = append(&mut dev, &geo, 0, &[1u8; PAYLOAD_SIZE]).unwrap_err();
        assert!(matches!(err, Error::Full));
        assert_eq!(supersector::get_head(&mut dev, &geo).unwrap(), 4);
    }

    #[test]
    fn sector_size_is_the_wire_shape() {
        assert_eq!(std::mem::size_of::<[u8; SECTOR_SIZE]>(), 512);
    }
}
