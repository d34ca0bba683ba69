//! File contents by cluster chain and byte offset.

use crate::block_dev::{BlockDev, read_sector};
use crate::consts::SECTOR_SIZE;
use crate::error::FsError;
use crate::volume::Volume;

impl Volume {
    /// Fill `out` with the bytes starting `offset` bytes into the chain that
    /// begins at `first_cluster`. Bounds against the recorded file size are
    /// the caller's concern; running off the chain is `UnexpectedEnd`.
    pub fn read_data<D: BlockDev>(
        &self,
        disk: &mut D,
        first_cluster: u16,
        offset: u32,
        out: &mut [u8],
    ) -> Result<(), FsError> {
        if out.is_empty() {
            return Ok(());
        }
        self.check_data_cluster(first_cluster)?;

        let cluster_bytes = self.cluster_bytes();
        let mut cluster = first_cluster;
        let mut hops = 0u32;

        for _ in 0..offset / cluster_bytes {
            cluster = self.step(disk, cluster, &mut hops)?;
        }

        let mut pos = (offset % cluster_bytes) as usize;
        let mut done = 0;
        let mut sec = [0u8; SECTOR_SIZE];

        loop {
            while pos < cluster_bytes as usize {
                let lba = self.cluster_to_lba(cluster) + (pos / SECTOR_SIZE) as u64;
                let in_sec = pos % SECTOR_SIZE;
                let n = (SECTOR_SIZE - in_sec).min(out.len() - done);
                read_sector(disk, lba, &mut sec)?;
                out[done..done + n].copy_from_slice(&sec[in_sec..in_sec + n]);
                done += n;
                pos += n;
                if done == out.len() {
                    return Ok(());
                }
            }
            cluster = self.step(disk, cluster, &mut hops)?;
            pos = 0;
        }
    }

    fn step<D: BlockDev>(&self, disk: &mut D, cluster: u16, hops: &mut u32) -> Result<u16, FsError> {
        *hops += 1;
        if *hops >= self.cluster_count() {
            return Err(FsError::AllocationInconsistency);
        }
        self.follow(disk, cluster)?.ok_or(FsError::UnexpectedEnd)
    }
}
