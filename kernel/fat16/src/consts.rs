/// Every component assumes this sector size; the disk is checked against it.
pub const SECTOR_SIZE: usize = 512;

pub const DIR_ENTRY_SIZE: usize = 32;
pub const ENTRIES_PER_SECTOR: usize = SECTOR_SIZE / DIR_ENTRY_SIZE;

/// FAT16 entries held by one sector of a FAT copy.
pub const FAT_ENTRIES_PER_SECTOR: usize = SECTOR_SIZE / 2;

pub const BOOT_SIGNATURE: [u8; 2] = [0x55, 0xAA];

/// First data cluster number; 0 and 1 are reserved FAT slots.
pub const FIRST_DATA_CLUSTER: u16 = 2;

/// Table values at or above this mark the end of a chain.
pub const FAT16_EOC: u16 = 0xFFF8;
/// Value written when terminating a chain.
pub const FAT16_EOC_MARK: u16 = 0xFFFF;
pub const FAT16_BAD: u16 = 0xFFF7;

/// Name bytes marking special directory slots.
pub const SLOT_END: u8 = 0x00;
pub const SLOT_DELETED: u8 = 0xE5;
