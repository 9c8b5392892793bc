//! Property tests for the append engine and sector codec, per `spec.md` §8
//! P1, P3, P7, P8.

use mirrorlog_core::device::MemBlockDevice;
use mirrorlog_core::sector::{decode_data, encode_data};
use mirrorlog_core::supersector::{get_head, init_log};
use mirrorlog_core::{append, Error, MirrorGeometry, PAYLOAD_SIZE};
use proptest::prelude::*;

const TOTAL_SECTORS: u32 = 300; // stride = 100

fn fresh(total_sectors: u32) -> (MemBlockDevice, MirrorGeometry) {
    let mut dev = MemBlockDevice::new(total_sectors);
    let geo = MirrorGeometry::new(total_sectors).unwrap();
    init_log(&mut dev, &geo).unwrap();
    (dev, geo)
}

proptest! {
    /// P1: encode/decode round-trips any header/payload pair.
    #[test]
    fn p1_sector_round_trip(header: u8, payload in prop::collection::vec(any::<u8>(), PAYLOAD_SIZE)) {
        let mut buf = [0u8; PAYLOAD_SIZE];
        buf.copy_from_slice(&payload);
        let sector = encode_data(header, &buf);
        let (decoded_header, decoded_payload) = decode_data(&sector).unwrap();
        prop_assert_eq!(decoded_header, header);
        prop_assert_eq!(&decoded_payload[..], &payload[..]);
    }

    /// P3: after a sequence of successful appends totaling S payload
    /// sectors, get_head() == 1 + S.
    #[test]
    fn p3_head_tracks_total_sectors_written(batch_sizes in prop::collection::vec(1usize..=5, 0..8)) {
        // stride - 1 = 99 usable logical slots; keep batches well under that.
        let total: usize = batch_sizes.iter().sum();
        prop_assume!(total < 90);

        let (mut dev, geo) = fresh(TOTAL_SECTORS);
        let mut written = 0u32;
        for size in &batch_sizes {
            let buf = vec![0xAAu8; size * PAYLOAD_SIZE];
            append(&mut dev, &geo, 1, &buf).unwrap();
            written += *size as u32;
        }
        prop_assert_eq!(get_head(&mut dev, &geo).unwrap(), 1 + written);
    }

    /// P7: a buffer length that isn't a multiple of PAYLOAD_SIZE is
    /// rejected and never advances the head.
    #[test]
    fn p7_bad_length_rejected(extra in 1usize..PAYLOAD_SIZE) {
        let (mut dev, geo) = fresh(TOTAL_SECTORS);
        let before = get_head(&mut dev, &geo).unwrap();
        let err = append(&mut dev, &geo, 0, &vec![0u8; extra]).unwrap_err();
        prop_assert!(matches!(err, Error::Param(_)));
        prop_assert_eq!(get_head(&mut dev, &geo).unwrap(), before);
    }

    /// P8: a batch that would cross a mirror's slice boundary fails with
    /// Full and never advances the head.
    #[test]
    fn p8_overflowing_batch_rejected(sectors_over in 1usize..5) {
        // stride = 3 (total=9), 2 sectors fit; request stride-1+over to overflow.
        let (mut dev, geo) = fresh(9);
        let fits = geo.stride() - 1; // 2
        append(&mut dev, &geo, 0, &vec![0u8; fits as usize * PAYLOAD_SIZE]).unwrap();
        let before = get_head(&mut dev, &geo).unwrap();

        let err = append(&mut dev, &geo, 0, &vec![0u8; sectors_over * PAYLOAD_SIZE]).unwrap_err();
        prop_assert!(matches!(err, Error::Full));
        prop_assert_eq!(get_head(&mut dev, &geo).unwrap(), before);
    }
}
