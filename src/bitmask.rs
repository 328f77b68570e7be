//! Bit-mask construction for packing several fields into one integer.

use crate::error::MaskError;

/// Width of the target integer.
pub const MASK_WIDTH: u32 = u64::BITS;

/// `bit_count` contiguous one-bits shifted left by `bit_offset`.
///
/// ```rust
/// # use round_bench::bitmask::create_mask;
/// assert_eq!(create_mask(4, 2).unwrap(), 0b11_1100);
/// assert!(create_mask(65, 0).is_err());
/// ```
pub fn create_mask(bit_count: u32, bit_offset: u32) -> Result<u64, MaskError> {
    create_mask_within(bit_count, bit_offset, MASK_WIDTH)
}

fn create_mask_within(bit_count: u32, bit_offset: u32, width: u32) -> Result<u64, MaskError> {
    let end = bit_count.checked_add(bit_offset);
    if end.map_or(true, |end| end > width) {
        return Err(MaskError::Overflow {
            bits: bit_count,
            offset: bit_offset,
            width,
        });
    }

    if bit_count == 0 {
        return Ok(0);
    }
    Ok((u64::MAX >> (MASK_WIDTH - bit_count)) << bit_offset)
}

/// Hands out non-overlapping masks inside a region of 1 to 8 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMaskAllocator {
    width: u32,
    allocated: u64,
    used_bits: u32,
}

impl BitMaskAllocator {
    pub fn new(byte_size: u32) -> Result<Self, MaskError> {
        if byte_size == 0 || byte_size > u64::BITS / 8 {
            return Err(MaskError::InvalidWidth(byte_size));
        }

        Ok(Self {
            width: byte_size * 8,
            allocated: 0,
            used_bits: 0,
        })
    }

    /// Allocate the next `needed_bits` directly above the highest allocated bit.
    pub fn checked_create(&mut self, needed_bits: u32) -> Result<u64, MaskError> {
        self.allocate_at(needed_bits, self.used_bits)
    }

    /// Allocate `needed_bits` at an explicit `offset`. Fails if the range
    /// intersects anything allocated before.
    pub fn allocate_at(&mut self, needed_bits: u32, offset: u32) -> Result<u64, MaskError> {
        let mask = create_mask_within(needed_bits, offset, self.width)?;

        if self.allocated & mask != 0 {
            return Err(MaskError::Overlap {
                allocated: self.allocated,
                requested: mask,
            });
        }

        self.allocated |= mask;
        self.used_bits = self.used_bits.max(offset + needed_bits);
        Ok(mask)
    }

    /// One past the highest allocated bit.
    pub fn used_bits(&self) -> u32 {
        self.used_bits
    }

    /// Union of every mask handed out so far.
    pub fn allocated(&self) -> u64 {
        self.allocated
    }

    pub fn width(&self) -> u32 {
        self.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mask() {
        assert_eq!(create_mask(4, 2), Ok(60));
        assert_eq!(create_mask(1, 0), Ok(1));
        assert_eq!(create_mask(0, 10), Ok(0));
        assert_eq!(create_mask(64, 0), Ok(u64::MAX));
        assert_eq!(create_mask(1, 63), Ok(1 << 63));
    }

    #[test]
    fn test_create_mask_overflow() {
        assert_eq!(
            create_mask(65, 0),
            Err(MaskError::Overflow {
                bits: 65,
                offset: 0,
                width: 64
            })
        );
        assert!(create_mask(10, 60).is_err());
        assert!(create_mask(u32::MAX, 1).is_err());
    }

    #[test]
    fn test_allocator_sequential() {
        let mut alloc = BitMaskAllocator::new(2).unwrap();
        assert_eq!(alloc.checked_create(4), Ok(0x000F));
        assert_eq!(alloc.checked_create(8), Ok(0x0FF0));
        assert_eq!(alloc.used_bits(), 12);
        assert_eq!(alloc.allocated(), 0x0FFF);

        // only 4 of 16 bits left
        assert!(matches!(
            alloc.checked_create(5),
            Err(MaskError::Overflow { width: 16, .. })
        ));
        assert_eq!(alloc.checked_create(4), Ok(0xF000));
    }

    #[test]
    fn test_allocator_overlap() {
        let mut alloc = BitMaskAllocator::new(8).unwrap();
        alloc.allocate_at(4, 4).unwrap();

        assert_eq!(
            alloc.allocate_at(4, 2),
            Err(MaskError::Overlap {
                allocated: 0xF0,
                requested: 0x3C
            })
        );
        // A failed allocation leaves the state untouched
        assert_eq!(alloc.allocated(), 0xF0);
        assert_eq!(alloc.allocate_at(4, 0), Ok(0x0F));
        assert_eq!(alloc.used_bits(), 8);
    }

    #[test]
    fn test_allocator_width() {
        assert!(BitMaskAllocator::new(0).is_err());
        assert!(BitMaskAllocator::new(9).is_err());
        assert_eq!(BitMaskAllocator::new(4).unwrap().width(), 32);
    }
}
