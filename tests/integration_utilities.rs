use round_bench::bitmask::{create_mask, BitMaskAllocator};
use round_bench::bytes::{decode, encode, ByteWidth};
use round_bench::MaskError;

#[test]
fn mask_of_four_bits_at_offset_two() {
    assert_eq!(create_mask(4, 2), Ok(60));
}

#[test]
fn mask_wider_than_u64_overflows() {
    assert!(matches!(
        create_mask(65, 0),
        Err(MaskError::Overflow { width: 64, .. })
    ));
}

#[test]
fn allocator_packs_fields_into_one_word() {
    let mut alloc = BitMaskAllocator::new(8).unwrap();
    let kind = alloc.checked_create(3).unwrap();
    let length = alloc.checked_create(21).unwrap();
    let address = alloc.checked_create(40).unwrap();

    assert_eq!(kind | length | address, u64::MAX);
    assert_eq!(kind & length, 0);
    assert_eq!(length & address, 0);
    assert!(alloc.checked_create(1).is_err());
}

#[test]
fn codec_round_trip_for_each_width() {
    assert_eq!(decode(&encode(0x1234, ByteWidth::Two), ByteWidth::Two), 0x1234);
    assert_eq!(
        decode(&encode(0x89AB_CDEF, ByteWidth::Four), ByteWidth::Four),
        0x89AB_CDEF
    );
    assert_eq!(
        decode(&encode(u64::MAX, ByteWidth::Eight), ByteWidth::Eight),
        u64::MAX
    );
}
