//! Mirror geometry: partitions a flat LBA space into [`crate::MIRROR_COUNT`]
//! disjoint mirror slices and maps a logical sector to its physical copies.

use crate::{Error, MIRROR_COUNT};

/// Derived RAID-like geometry for a device of a given capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorGeometry {
    total_sectors: u32,
    stride: u32,
}

impl MirrorGeometry {
    /// Computes `stride = floor(total_sectors / MIRROR_COUNT)`.
    ///
    /// Fails with [`Error::Param`] if `stride` would be zero (device too
    /// small to hold `MIRROR_COUNT` mirrors).
    pub fn new(total_sectors: u32) -> Result<Self, Error> {
        let stride = total_sectors / MIRROR_COUNT;
        if stride == 0 {
            return Err(Error::Param(format!(
                "device has {total_sectors} sectors, too small for {MIRROR_COUNT} mirrors"
            )));
        }
        Ok(Self { total_sectors, stride })
    }

    /// `floor(total_sectors / MIRROR_COUNT)`.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Total device capacity this geometry was derived from.
    pub fn total_sectors(&self) -> u32 {
        self.total_sectors
    }

    /// Maps logical sector `logical` in mirror `mirror` to its physical LBA.
    pub fn physical(&self, mirror: u32, logical: u32) -> u32 {
        logical + mirror * self.stride
    }

    /// True iff `logical` stays inside mirror `mirror`'s slice, i.e.
    /// `physical(mirror, logical) < (mirror + 1) * stride`, and inside the
    /// device's total capacity.
    pub fn in_bounds(&self, mirror: u32, logical: u32) -> bool {
        logical < self.stride && self.physical(mirror, logical) < self.total_sectors
    }
}
