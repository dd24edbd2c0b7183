//! Coordinate spaces and conversions between them.
//!
//! | space     | size                        | from block |
//! |-----------|-----------------------------|------------|
//! | block     | 1                           | `x`        |
//! | quart     | 4 blocks                    | `x >> 2`   |
//! | chunk     | 16 blocks                   | `x >> 4`   |
//! | partition | 32 quarts (128 blocks)      | `x >> 7`   |
//! | grid      | 128 quarts (512 blocks)     | `x >> 9`   |
//!
//! The watershed grid is the scale of plates and river geometry. Partitions
//! subdivide it so river lookups only test nearby fractals.

/// Bits between block and quart coordinates.
pub const QUART_BITS: u32 = 2;
/// Bits between block and chunk coordinates.
pub const CHUNK_BITS: u32 = 4;
/// Bits between quart and partition coordinates.
pub const PARTITION_BITS: u32 = 5;
/// Bits between quart and watershed grid coordinates.
pub const ZOOM_BITS: u32 = 7;
/// Bits between block and watershed grid coordinates.
pub const GRID_BITS: u32 = QUART_BITS + ZOOM_BITS;

/// Width of a chunk in blocks.
pub const CHUNK_WIDTH: i32 = 1 << CHUNK_BITS;

/// Block to quart.
#[inline]
pub const fn block_to_quart(block: i32) -> i32 {
    block >> QUART_BITS
}

/// Quart to the block at its minimum corner.
#[inline]
pub const fn quart_to_block(quart: i32) -> i32 {
    quart << QUART_BITS
}

/// Block to chunk.
#[inline]
pub const fn block_to_chunk(block: i32) -> i32 {
    block >> CHUNK_BITS
}

/// Chunk to the block at its minimum corner.
#[inline]
pub const fn chunk_to_block(chunk: i32) -> i32 {
    chunk << CHUNK_BITS
}

/// Quart to partition.
#[inline]
pub const fn quart_to_partition(quart: i32) -> i32 {
    quart >> PARTITION_BITS
}

/// Quart to watershed grid cell.
#[inline]
pub const fn quart_to_grid(quart: i32) -> i32 {
    quart >> ZOOM_BITS
}

/// Block to watershed grid cell.
#[inline]
pub const fn block_to_grid(block: i32) -> i32 {
    block >> GRID_BITS
}

/// Quart coordinate in continuous watershed grid units.
#[inline]
pub fn quart_to_grid_f64(quart: f64) -> f64 {
    quart / (1 << ZOOM_BITS) as f64
}

/// Block coordinate in continuous watershed grid units.
#[inline]
pub fn block_to_grid_f64(block: f64) -> f64 {
    block / (1 << GRID_BITS) as f64
}

/// Pack a 2D integer coordinate into one key.
#[inline]
pub const fn pack(x: i32, z: i32) -> u64 {
    ((x as u32 as u64) << 32) | (z as u32 as u64)
}

/// Inverse of [`pack`].
#[inline]
pub const fn unpack(key: u64) -> (i32, i32) {
    ((key >> 32) as u32 as i32, key as u32 as i32)
}

/// Horizontal chunk coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The chunk containing the given block column.
    pub const fn from_block(block_x: i32, block_z: i32) -> Self {
        Self::new(block_to_chunk(block_x), block_to_chunk(block_z))
    }

    /// The chunk containing the given quart column.
    pub const fn from_quart(quart_x: i32, quart_z: i32) -> Self {
        Self::from_block(quart_to_block(quart_x), quart_to_block(quart_z))
    }

    pub const fn min_block_x(self) -> i32 {
        chunk_to_block(self.x)
    }

    pub const fn min_block_z(self) -> i32 {
        chunk_to_block(self.z)
    }

    pub const fn pack(self) -> u64 {
        pack(self.x, self.z)
    }
}
