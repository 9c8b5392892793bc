mod cli;
mod csv_out;

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use mirrorlog_backend_file::FileBlockDevice;
use mirrorlog_core::{append, reader, supersector, BlockDevice, MirrorGeometry, PAYLOAD_SIZE, SECTOR_SIZE};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Init { path, sectors } => run_init(&path, sectors),
        Command::Append { path, header, input } => run_append(&path, header, &input),
        Command::Read { path, out_dir } => run_read(&path, out_dir.as_deref()),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn run_init(path: &Path, sectors: Option<u32>) -> Result<()> {
    let mut dev = if path.exists() {
        let mut dev = FileBlockDevice::new(path);
        dev.init().with_context(|| format!("opening {}", path.display()))?;
        if let Some(requested) = sectors {
            if dev.total_sectors() != requested {
                bail!(
                    "{} already exists with {} sectors, but --sectors {} was requested",
                    path.display(),
                    dev.total_sectors(),
                    requested
                );
            }
        }
        dev
    } else {
        let sectors = sectors
            .context("--sectors is required when creating a new device file")?;
        FileBlockDevice::create(path, sectors)
            .with_context(|| format!("creating {}", path.display()))?
    };

    let geo = MirrorGeometry::new(dev.total_sectors())
        .context("device is too small to hold 3 mirrors")?;
    supersector::init_log(&mut dev, &geo).context("writing initial supersector")?;

    println!(
        "initialized {} ({} sectors, stride {})",
        path.display(),
        dev.total_sectors(),
        geo.stride()
    );
    Ok(())
}

fn run_append(path: &Path, header: u8, input: &Path) -> Result<()> {
    let buffer = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    if buffer.len() % PAYLOAD_SIZE != 0 {
        bail!(
            "{} is {} bytes, not a multiple of PAYLOAD_SIZE ({PAYLOAD_SIZE})",
            input.display(),
            buffer.len()
        );
    }

    let mut dev = FileBlockDevice::new(path);
    dev.init().with_context(|| format!("opening {}", path.display()))?;
    let geo = MirrorGeometry::new(dev.total_sectors())
        .context("device is too small to hold 3 mirrors")?;

    append(&mut dev, &geo, header, &buffer).context("appending batch")?;
    let head = supersector::get_head(&mut dev, &geo)?;
    println!("appended {} sectors, head now {}", buffer.len() / PAYLOAD_SIZE, head);
    Ok(())
}

fn run_read(path: &Path, out_dir: Option<&Path>) -> Result<()> {
    let mut dev = FileBlockDevice::new(path);
    dev.init().with_context(|| format!("opening {}", path.display()))?;
    let geo = MirrorGeometry::new(dev.total_sectors())
        .context("device is too small to hold 3 mirrors")?;

    let (head, reports) = reader::read_all(&mut dev, &geo).context("reading log")?;

    let mut meta_rows = Vec::with_capacity(3);
    for mirror in 0..mirrorlog_core::MIRROR_COUNT {
        let mut raw = [0u8; SECTOR_SIZE];
        dev.read_block(geo.physical(mirror, 0), &mut raw)
            .context("reading supersector mirror")?;
        let decoded = mirrorlog_core::sector::decode_super(&raw).ok();
        meta_rows.push(csv_out::MetaRow { mirror, decoded, raw });
    }

    let out_dir = out_dir.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    csv_out::write_payload_csv(&out_dir.join("payload.csv"), &reports)
        .context("writing payload.csv")?;
    csv_out::write_meta_csv(&out_dir.join("meta.csv"), &meta_rows).context("writing meta.csv")?;

    println!(
        "head={head}, {} logical sectors recovered into {}",
        reports.len(),
        out_dir.display()
    );
    Ok(())
}
