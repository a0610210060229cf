//! This crate defines the interfaces through which ARMv7-A bring-up
//! drives the memory management hardware, and implements the one
//! memory operation bring-up does itself: asking the core to translate
//! a virtual address.
//!
//! Page table management lives behind [`ArchMmu`] and region-based
//! protection behind [`Mpu`]; bring-up only sequences their calls.

#![no_std]

use arm_regs::{bits::PAR, hold_interrupts, read_as, Barrier, ExecutionMode, RegisterPort, SysReg};
use derive_more::Display;
use kernel_config::memory::PAGE_SHIFT;

pub use memory_structs::{PhysicalAddress, VirtualAddress};

// proptest's macros name `::std` directly
#[cfg(test)]
extern crate std;

/// An opaque reference to a set of virtual-to-physical mappings.
///
/// The kernel's own address space is owned by the [`ArchMmu`];
/// any other handle belongs to whoever called [`ArchMmu::init_aspace()`].
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[display(fmt = "aspace {}", _0)]
pub struct AddressSpaceHandle(usize);

impl AddressSpaceHandle {
    pub const fn new(id: usize) -> AddressSpaceHandle {
        AddressSpaceHandle(id)
    }

    pub const fn id(self) -> usize {
        self.0
    }
}

/// The paging MMU and the address spaces built on top of it.
pub trait ArchMmu: Sync {
    /// Sets up the boot-time translation tables on the primary core.
    fn early_init(&self);

    /// Finishes MMU setup, removing temporary boot-time mappings.
    fn init(&self);

    fn kernel_aspace(&self) -> AddressSpaceHandle;

    /// Returns `true` if `vaddr` lies in the range `aspace` may map.
    fn is_valid_vaddr(&self, aspace: AddressSpaceHandle, vaddr: VirtualAddress) -> bool;

    /// Creates an address space covering `size` bytes from `base`.
    fn init_aspace(&self, base: VirtualAddress, size: usize) -> Result<AddressSpaceHandle, &'static str>;

    /// Maps `page_count` pages starting at `vaddr` to the frames starting at `paddr`.
    fn map(
        &self,
        aspace: AddressSpaceHandle,
        vaddr: VirtualAddress,
        paddr: PhysicalAddress,
        page_count: usize,
    ) -> Result<(), &'static str>;

    /// Makes `aspace` the active address space on the current core.
    fn context_switch(&self, aspace: AddressSpaceHandle);

    fn destroy_aspace(&self, aspace: AddressSpaceHandle) -> Result<(), &'static str>;
}

/// A region-based memory protection unit.
pub trait Mpu: Sync {
    fn init(&self);

    /// Programs the fixed regions (kernel text, data, no-cache SRAM and so on).
    fn configure_static_regions(&self);
}

/// Brings up the MPU and programs its fixed regions.
pub fn mpu_init(mpu: &dyn Mpu) {
    mpu.init();
    mpu.configure_static_regions();
}

/// The error returned when a virtual address has no valid translation.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[display(fmt = "no valid mapping for {}", _0)]
pub struct NotFound(pub VirtualAddress);

/// Translates `vaddr` to a physical address using the current core's
/// stage 1 translation hardware, as a privileged read would see it.
///
/// IRQs are masked while the request is in flight,
/// since `PAR` holds only one result per core.
pub fn translate<P>(port: &P, mode: ExecutionMode, vaddr: VirtualAddress) -> Result<PhysicalAddress, NotFound>
where
    P: RegisterPort + ?Sized,
{
    let par = {
        let _held = hold_interrupts(port);
        port.write(mode.banked().ats1, vaddr.align_down_to_page().value() as u32);
        port.barrier(Barrier::Isb);
        read_as::<P, PAR::Register>(port, SysReg::Par)
    };

    if par.is_set(PAR::F) {
        return Err(NotFound(vaddr));
    }
    let frame = (par.read(PAR::PA) as usize) << PAGE_SHIFT;
    Ok(PhysicalAddress::new_canonical(frame | vaddr.page_offset()))
}
