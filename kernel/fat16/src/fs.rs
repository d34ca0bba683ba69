//! Mounted filesystem facade: path normalization, mount policy and the
//! operations the kernel exposes to tasks.

use alloc::vec::Vec;
use core::ops::ControlFlow;

use kernel_api_types::fs::{EntryKind, FsStat};

use crate::block_dev::{BlockDev, Partition};
use crate::dir::Entries;
use crate::entry::DirEntry;
use crate::error::FsError;
use crate::path::normalize;
use crate::resolve::{Resolved, resolve};
use crate::volume::Volume;

/// Boot hand-off string selecting the root filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootSpec<'a> {
    /// Empty or `esp`: first FAT candidate partition on port 0.
    Esp,
    /// `partuuid=<GUID>`: GPT partition with that unique GUID on any port.
    PartUuid(&'a str),
}

impl<'a> RootSpec<'a> {
    pub fn parse(spec: &'a str) -> Result<Self, FsError> {
        match spec {
            "" | "esp" => Ok(RootSpec::Esp),
            s => s.strip_prefix("partuuid=").map(RootSpec::PartUuid).ok_or(FsError::UnsupportedRootSpec),
        }
    }
}

/// Disk controller and partition-table access used to locate a root volume.
pub trait DiskPorts {
    type Disk: BlockDev;

    /// Ports scanned for a `partuuid=` root.
    const PORT_COUNT: u32 = 32;

    fn open(&mut self, port: u32) -> Result<Self::Disk, FsError>;
    /// First partition that looks like it holds a FAT volume.
    fn fat_candidate(&mut self, disk: &mut Self::Disk) -> Result<Partition, FsError>;
    fn find_partuuid(&mut self, disk: &mut Self::Disk, uuid: &str) -> Result<Partition, FsError>;
}

/// A mounted FAT16 volume and the disk it lives on.
pub struct Fs<D> {
    disk:      D,
    port:      u32,
    partition: Partition,
    volume:    Volume,
}

impl<D: BlockDev> Fs<D> {
    pub fn mount(mut disk: D, port: u32, partition: Partition) -> Result<Self, FsError> {
        let volume = Volume::mount(&mut disk, partition.start_block)?;
        log::info!(
            "fat16: mounted port {} lba {}: {} FATs x {} sectors, {} root entries, {} clusters of {} bytes",
            port, partition.start_block, volume.num_fats, volume.fat_size,
            volume.root_entry_count, volume.cluster_count(), volume.cluster_bytes(),
        );
        Ok(Self { disk, port, partition, volume })
    }

    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    pub fn port(&self) -> u32 {
        self.port
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    pub fn into_disk(self) -> D {
        self.disk
    }

    pub fn lookup(&mut self, path: &str) -> Result<Resolved, FsError> {
        let norm = normalize(path)?;
        resolve(&self.volume, &mut self.disk, &norm)
    }

    pub fn stat(&mut self, path: &str) -> Result<FsStat, FsError> {
        let r = self.lookup(path)?;
        let kind = if r.is_dir() { EntryKind::Directory } else { EntryKind::File };
        Ok(FsStat { kind, size: r.size })
    }

    /// Whole file into a freshly allocated buffer. Empty files allocate nothing.
    pub fn read_file(&mut self, path: &str) -> Result<Vec<u8>, FsError> {
        let r = self.lookup(path)?;
        if r.is_dir() {
            return Err(FsError::IsADirectory);
        }
        if r.size == 0 {
            return Ok(Vec::new());
        }

        let mut buf = Vec::new();
        buf.try_reserve_exact(r.size as usize).map_err(|_| FsError::OutOfMemory)?;
        buf.resize(r.size as usize, 0);
        self.volume.read_data(&mut self.disk, r.cluster, 0, &mut buf)?;
        Ok(buf)
    }

    /// Up to `buf.len()` bytes from `offset`; returns the count copied.
    /// Starting at or past the end of the file is `EndOfFile`.
    pub fn read_file_at(&mut self, path: &str, offset: u32, buf: &mut [u8]) -> Result<usize, FsError> {
        if buf.is_empty() {
            return Ok(0);
        }
        let r = self.lookup(path)?;
        if r.is_dir() {
            return Err(FsError::IsADirectory);
        }
        if offset >= r.size {
            return Err(FsError::EndOfFile);
        }

        let take = buf.len().min((r.size - offset) as usize);
        self.volume.read_data(&mut self.disk, r.cluster, offset, &mut buf[..take])?;
        Ok(take)
    }

    /// Lazy listing of a directory, without `.` and `..`.
    pub fn read_dir(&mut self, path: &str) -> Result<ReadDir<'_, D>, FsError> {
        let dir = self.lookup(path)?.as_dir()?;
        Ok(ReadDir { inner: Entries::new(&self.volume, &mut self.disk, dir)? })
    }

    /// Hand each entry of a directory to `f` until it breaks. Returns how many
    /// entries were accepted; the one that triggered the break is not counted.
    pub fn listdir<F>(&mut self, path: &str, mut f: F) -> Result<usize, FsError>
    where
        F: FnMut(&DirEntry) -> ControlFlow<()>,
    {
        let mut count = 0;
        for entry in self.read_dir(path)? {
            if f(&entry?).is_break() {
                break;
            }
            count += 1;
        }
        Ok(count)
    }

    pub fn mkdir(&mut self, path: &str) -> Result<(), FsError> {
        let norm = normalize(path)?;
        let cluster = self.volume.mkdir(&mut self.disk, &norm)?;
        log::info!("fat16: mkdir /{} -> cluster {}", norm, cluster);
        Ok(())
    }
}

impl<D: BlockDev> Fs<D> {
    /// First FAT candidate on port 0.
    pub fn mount_esp<P: DiskPorts<Disk = D>>(ports: &mut P) -> Result<Self, FsError> {
        let mut disk = ports.open(0)?;
        let partition = ports.fat_candidate(&mut disk)?;
        Self::mount(disk, 0, partition)
    }

    /// Mount the root filesystem named by the boot hand-off string.
    pub fn mount_root<P: DiskPorts<Disk = D>>(ports: &mut P, spec: &str) -> Result<Self, FsError> {
        let uuid = match RootSpec::parse(spec) {
            Ok(RootSpec::Esp) => {
                log::info!("fat16: root spec {:?}, using first FAT partition on port 0", spec);
                return Self::mount_esp(ports);
            }
            Ok(RootSpec::PartUuid(uuid)) => uuid,
            Err(e) => {
                log::warn!("fat16: unsupported root spec {:?}", spec);
                return Err(e);
            }
        };

        for port in 0..P::PORT_COUNT {
            let Ok(mut disk) = ports.open(port) else { continue };
            let Ok(partition) = ports.find_partuuid(&mut disk, uuid) else { continue };
            log::info!("fat16: partuuid {} found on port {}", uuid, port);
            return Self::mount(disk, port, partition);
        }
        log::warn!("fat16: root partuuid {} not found", uuid);
        Err(FsError::NotFound)
    }
}

/// Iterator returned by [`Fs::read_dir`].
pub struct ReadDir<'a, D> {
    inner: Entries<'a, D>,
}

impl<D: BlockDev> Iterator for ReadDir<'_, D> {
    type Item = Result<DirEntry, FsError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(e) if e.is_dot() => continue,
                other => return Some(other),
            }
        }
    }
}
