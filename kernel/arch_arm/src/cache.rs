//! Turning the core's level-1 caches on and off.

use arm_regs::{
    bits::SCTLR, hold_interrupts, modify, read_as, Barrier, CacheMaintenance, ExecutionMode,
    RegisterPort,
};
use bitflags::bitflags;

bitflags! {
    /// The level-1 caches an operation applies to.
    pub struct Caches: u32 {
        const INSTRUCTION = 0x1;
        const DATA        = 0x2;
        const UNIFIED     = Self::INSTRUCTION.bits | Self::DATA.bits;
    }
}

/// Disables the given caches on the current core.
///
/// Dirty data lines are written back before the data cache is abandoned,
/// so memory is coherent with what the core last wrote.
pub fn disable_caches<P: RegisterPort + ?Sized>(port: &P, mode: ExecutionMode, caches: Caches) {
    let _held = hold_interrupts(port);
    let sctlr = mode.banked().sctlr;

    if caches.contains(Caches::DATA) {
        if read_as::<P, SCTLR::Register>(port, sctlr).is_set(SCTLR::C) {
            modify(port, sctlr, SCTLR::C::CLEAR);
            port.cache_maintenance(CacheMaintenance::CleanInvalidateDcacheAll);
        } else {
            port.cache_maintenance(CacheMaintenance::InvalidateDcacheAll);
        }
        port.barrier(Barrier::Dsb);
    }

    if caches.contains(Caches::INSTRUCTION) {
        modify(port, sctlr, SCTLR::I::CLEAR);
        port.cache_maintenance(CacheMaintenance::InvalidateIcacheAll);
    }
    port.barrier(Barrier::Isb);
}

/// Enables the given caches on the current core, discarding stale
/// contents of any cache that was off.
pub fn enable_caches<P: RegisterPort + ?Sized>(port: &P, mode: ExecutionMode, caches: Caches) {
    let _held = hold_interrupts(port);
    let sctlr = mode.banked().sctlr;

    if caches.contains(Caches::DATA) && !read_as::<P, SCTLR::Register>(port, sctlr).is_set(SCTLR::C) {
        port.cache_maintenance(CacheMaintenance::InvalidateDcacheAll);
        port.barrier(Barrier::Dsb);
        modify(port, sctlr, SCTLR::C::SET);
    }

    if caches.contains(Caches::INSTRUCTION) && !read_as::<P, SCTLR::Register>(port, sctlr).is_set(SCTLR::I) {
        port.cache_maintenance(CacheMaintenance::InvalidateIcacheAll);
        modify(port, sctlr, SCTLR::I::SET);
    }
    port.barrier(Barrier::Isb);
}

/// Sets the instruction and data cache enable bits without any maintenance.
///
/// Used on secondary cores, which must not disturb the shared
/// level-2 state the primary already set up.
pub fn force_enable_caches<P: RegisterPort + ?Sized>(port: &P, mode: ExecutionMode) {
    modify(port, mode.banked().sctlr, SCTLR::I::SET + SCTLR::C::SET);
    port.barrier(Barrier::Isb);
}
