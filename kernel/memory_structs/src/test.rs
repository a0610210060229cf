//! Tests for offsets and alignment of the address types.

extern crate std;

use self::std::format;
use super::*;

#[test]
fn page_offset_is_low_12_bits() {
    let va = VirtualAddress::new_canonical(0x4010_0abc);
    assert_eq!(va.page_offset(), 0xabc);
    assert_eq!(va.align_down_to_page(), VirtualAddress::new_canonical(0x4010_0000));
}

#[test]
fn section_alignment() {
    let pa = PhysicalAddress::new_canonical(0x8012_3456);
    assert_eq!(pa.section_offset(), 0x2_3456);
    assert_eq!(pa.align_down_to_section(), PhysicalAddress::new_canonical(0x8010_0000));
    assert_eq!(pa.frame_offset(), 0x456);
}

#[test]
fn addresses_are_32_bit() {
    assert!(VirtualAddress::new(0xFFFF_FFFF).is_some());
    #[cfg(target_pointer_width = "64")]
    {
        assert!(VirtualAddress::new(0x1_0000_0000).is_none());
        assert_eq!(PhysicalAddress::new_canonical(0x1_8000_0000).value(), 0x8000_0000);
    }
}

#[test]
fn arithmetic_saturates() {
    let pa = PhysicalAddress::new_canonical(0x1000);
    assert_eq!((pa - 0x2000).value(), 0);
    assert_eq!((pa + 0x234).value(), 0x1234);
}

#[test]
fn debug_format_has_prefix() {
    let va = VirtualAddress::new_canonical(0x8000_0000);
    assert_eq!(format!("{:?}", va), "v0x80000000");
    let pa = PhysicalAddress::new_canonical(0x10);
    assert_eq!(format!("{}", pa), "p0x10");
}

#[test]
fn addition_saturates_at_top_of_address_space() {
    let va = VirtualAddress::new_canonical(0xFFFF_F000);
    assert_eq!((va + 0x2000).value(), MAX_VIRTUAL_ADDRESS);
}
