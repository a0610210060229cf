//! The basic memory layout that the kernel assumes on ARMv7-A.
//!
//! The kernel is linked at [`KERNEL_BASE`] + [`KERNEL_LOAD_OFFSET`],
//! and the exception vectors live at the very start of the kernel image,
//! so the vector base register is pointed there instead of at address zero.

use static_assertions::const_assert_eq;

/// The lower 12 bits of a virtual address are the offset into a small page.
pub const PAGE_SHIFT: usize = 12;
/// Page size is 4096 bytes, 4KiB pages.
pub const PAGE_SIZE: usize = 1 << PAGE_SHIFT;

/// The lower 20 bits of a virtual address are the offset into a section,
/// the "large page" mapped by a single first-level descriptor.
pub const SECTION_SHIFT: usize = 20;
/// Section size is 1 MiB.
pub const SECTION_SIZE: usize = 1 << SECTION_SHIFT;

/// Value: 256.
pub const PAGES_PER_SECTION: usize = SECTION_SIZE / PAGE_SIZE;

pub const MAX_VIRTUAL_ADDRESS: usize = 0xFFFF_FFFF;
pub const MAX_PAGE_NUMBER: usize = MAX_VIRTUAL_ADDRESS / PAGE_SIZE;

/// The virtual address where the kernel's address space begins.
pub const KERNEL_BASE: usize = 0x8000_0000;

/// The offset from [`KERNEL_BASE`] at which the kernel image is loaded.
pub const KERNEL_LOAD_OFFSET: usize = 0x0001_0000;

/// The virtual address of the kernel's exception vector table.
pub const KERNEL_VECTOR_BASE: usize = KERNEL_BASE + KERNEL_LOAD_OFFSET;

const_assert_eq!(SECTION_SIZE % PAGE_SIZE, 0);
const_assert_eq!(KERNEL_VECTOR_BASE % 32, 0);
