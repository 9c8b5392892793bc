//! CSV dumping for the `read` subcommand, matching the columns `spec.md`
//! §6 specifies and grounded on
//! `examples/original_source/src/reader.c`'s hand-rolled CSV writer.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use mirrorlog_core::reader::{SectorReport, Status};

fn hex_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Writes `payload.csv`: `status,header,payload_hex,crc_stored,crc_calc`,
/// one row per recovered logical data sector.
pub fn write_payload_csv(path: &Path, reports: &[SectorReport]) -> io::Result<()> {
    let mut f = File::create(path)?;
    writeln!(f, "status,header,payload_hex,crc_stored,crc_calc")?;
    for r in reports {
        let status = match r.status {
            Status::CrcOk => "CRC_OK",
            Status::CrcFail => "CRC_FAIL",
        };
        writeln!(
            f,
            "{status},{header},\"{payload_hex}\",{crc_stored},{crc_calc}",
            header = r.header,
            payload_hex = hex_bytes(&r.payload),
            crc_stored = r.crc_stored,
            crc_calc = r.crc_calculated,
        )?;
    }
    Ok(())
}

/// One row of `meta.csv`: the decoded fields (blank if the mirror's CRC
/// didn't verify) plus the mirror's raw 512-byte sector.
pub struct MetaRow {
    pub mirror: u32,
    pub decoded: Option<(u32, u16, bool)>,
    pub raw: [u8; mirrorlog_core::SECTOR_SIZE],
}

/// Writes `meta.csv`: `type,last_sector,last_msg,is_first_full,raw_hex`,
/// one row per physical supersector copy.
pub fn write_meta_csv(path: &Path, rows: &[MetaRow]) -> io::Result<()> {
    let mut f = File::create(path)?;
    writeln!(f, "type,last_sector,last_msg,is_first_full,raw_hex")?;
    for row in rows {
        let (last_sector, last_msg, is_first_full) = match row.decoded {
            Some((head, msg_idx, first_full)) => {
                (head.to_string(), msg_idx.to_string(), (first_full as u8).to_string())
            }
            None => (String::new(), String::new(), String::new()),
        };
        writeln!(
            f,
            "mirror{mirror},{last_sector},{last_msg},{is_first_full},\"{raw_hex}\"",
            mirror = row.mirror,
            raw_hex = hex_bytes(&row.raw),
        )?;
    }
    Ok(())
}
