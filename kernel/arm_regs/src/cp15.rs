//! The hardware [`RegisterPort`]: real CP15 accesses on the current core.

use core::arch::asm;
use memory_structs::{PhysicalAddress, VirtualAddress};
use super::{Barrier, CacheMaintenance, RegisterPort, SysReg};

/// `CPSR.I`, the IRQ mask bit.
const CPSR_IRQ_MASK: u32 = 1 << 7;

macro_rules! read_cp {
    ($insn:literal) => {{
        let value: u32;
        // SAFETY: reading a coprocessor register has no side effects on memory.
        unsafe { asm!($insn, out(reg) value, options(nomem, nostack, preserves_flags)) };
        value
    }};
}

macro_rules! write_cp {
    ($insn:literal, $value:expr) => {{
        let value: u32 = $value;
        // SAFETY: the caller of the port owns the semantics of this write.
        unsafe { asm!($insn, in(reg) value, options(nostack, preserves_flags)) };
    }};
}

extern "C" {
    /// Provided by the assembly trampolines: disables the MMU and caches,
    /// then jumps to `entry` with `a0..a3` in `r0..r3`.
    fn arm_chain_load(entry: usize, a0: usize, a1: usize, a2: usize, a3: usize) -> !;
}

/// The current core's CP15 coprocessor.
pub struct Cp15Port;

/// The only instance needed; every core reaches its own registers through it.
pub static CP15: Cp15Port = Cp15Port;

impl RegisterPort for Cp15Port {
    fn read(&self, reg: SysReg) -> u32 {
        match reg {
            SysReg::Midr       => read_cp!("mrc p15, 0, {}, c0, c0, 0"),
            SysReg::Mpidr      => read_cp!("mrc p15, 0, {}, c0, c0, 5"),
            SysReg::Cbar       => read_cp!("mrc p15, 4, {}, c15, c0, 0"),
            SysReg::L2ctlr     => read_cp!("mrc p15, 1, {}, c9, c0, 2"),
            SysReg::L2ectlr    => read_cp!("mrc p15, 1, {}, c9, c0, 3"),
            SysReg::Sctlr      => read_cp!("mrc p15, 0, {}, c1, c0, 0"),
            SysReg::Actlr      => read_cp!("mrc p15, 0, {}, c1, c0, 1"),
            SysReg::Cpacr      => read_cp!("mrc p15, 0, {}, c1, c0, 2"),
            SysReg::Ttbcr      => read_cp!("mrc p15, 0, {}, c2, c0, 2"),
            SysReg::Ttbr0      => read_cp!("mrc p15, 0, {}, c2, c0, 0"),
            SysReg::Dacr       => read_cp!("mrc p15, 0, {}, c3, c0, 0"),
            SysReg::Vbar       => read_cp!("mrc p15, 0, {}, c12, c0, 0"),
            SysReg::Par        => read_cp!("mrc p15, 0, {}, c7, c4, 0"),
            SysReg::Pmcr       => read_cp!("mrc p15, 0, {}, c9, c12, 0"),
            SysReg::Pmcntenset => read_cp!("mrc p15, 0, {}, c9, c12, 1"),
            SysReg::Pmcntenclr => read_cp!("mrc p15, 0, {}, c9, c12, 2"),
            SysReg::Tpidrurw   => read_cp!("mrc p15, 0, {}, c13, c0, 2"),
            SysReg::Tpidruro   => read_cp!("mrc p15, 0, {}, c13, c0, 3"),
            SysReg::Tpidrprw   => read_cp!("mrc p15, 0, {}, c13, c0, 4"),
            SysReg::Hsctlr     => read_cp!("mrc p15, 4, {}, c1, c0, 0"),
            SysReg::Hactlr     => read_cp!("mrc p15, 4, {}, c1, c0, 1"),
            SysReg::Htcr       => read_cp!("mrc p15, 4, {}, c2, c0, 2"),
            SysReg::Hvbar      => read_cp!("mrc p15, 4, {}, c12, c0, 0"),
            SysReg::Htpidr     => read_cp!("mrc p15, 4, {}, c13, c0, 2"),
            SysReg::Fpexc      => read_cp!(".fpu vfpv3\nvmrs {}, fpexc"),
            // translation requests are write-only
            SysReg::Ats1cpr | SysReg::Ats1hr => 0,
        }
    }

    fn write(&self, reg: SysReg, value: u32) {
        match reg {
            SysReg::Sctlr      => write_cp!("mcr p15, 0, {}, c1, c0, 0", value),
            SysReg::Actlr      => write_cp!("mcr p15, 0, {}, c1, c0, 1", value),
            SysReg::Cpacr      => write_cp!("mcr p15, 0, {}, c1, c0, 2", value),
            SysReg::Ttbcr      => write_cp!("mcr p15, 0, {}, c2, c0, 2", value),
            SysReg::Ttbr0      => write_cp!("mcr p15, 0, {}, c2, c0, 0", value),
            SysReg::Dacr       => write_cp!("mcr p15, 0, {}, c3, c0, 0", value),
            SysReg::Vbar       => write_cp!("mcr p15, 0, {}, c12, c0, 0", value),
            SysReg::Par        => write_cp!("mcr p15, 0, {}, c7, c4, 0", value),
            SysReg::Ats1cpr    => write_cp!("mcr p15, 0, {}, c7, c8, 0", value),
            SysReg::Pmcr       => write_cp!("mcr p15, 0, {}, c9, c12, 0", value),
            SysReg::Pmcntenset => write_cp!("mcr p15, 0, {}, c9, c12, 1", value),
            SysReg::Pmcntenclr => write_cp!("mcr p15, 0, {}, c9, c12, 2", value),
            SysReg::Tpidrurw   => write_cp!("mcr p15, 0, {}, c13, c0, 2", value),
            SysReg::Tpidruro   => write_cp!("mcr p15, 0, {}, c13, c0, 3", value),
            SysReg::Tpidrprw   => write_cp!("mcr p15, 0, {}, c13, c0, 4", value),
            SysReg::Hsctlr     => write_cp!("mcr p15, 4, {}, c1, c0, 0", value),
            SysReg::Hactlr     => write_cp!("mcr p15, 4, {}, c1, c0, 1", value),
            SysReg::Htcr       => write_cp!("mcr p15, 4, {}, c2, c0, 2", value),
            SysReg::Hvbar      => write_cp!("mcr p15, 4, {}, c12, c0, 0", value),
            SysReg::Ats1hr     => write_cp!("mcr p15, 4, {}, c7, c8, 0", value),
            SysReg::Htpidr     => write_cp!("mcr p15, 4, {}, c13, c0, 2", value),
            SysReg::Fpexc      => write_cp!(".fpu vfpv3\nvmsr fpexc, {}", value),
            SysReg::L2ctlr     => write_cp!("mcr p15, 1, {}, c9, c0, 2", value),
            SysReg::L2ectlr    => write_cp!("mcr p15, 1, {}, c9, c0, 3", value),
            // identification registers are read-only
            SysReg::Midr | SysReg::Mpidr | SysReg::Cbar => {}
        }
    }

    fn barrier(&self, barrier: Barrier) {
        // SAFETY: barriers only order memory accesses.
        unsafe {
            match barrier {
                Barrier::Dsb => asm!("dsb sy", options(nostack, preserves_flags)),
                Barrier::Dmb => asm!("dmb sy", options(nostack, preserves_flags)),
                Barrier::Isb => asm!("isb sy", options(nostack, preserves_flags)),
            }
        }
    }

    fn cache_maintenance(&self, op: CacheMaintenance) {
        match op {
            CacheMaintenance::CleanInvalidateDcacheAll => dcache_all_by_set_way(SetWayOp::CleanInvalidate),
            CacheMaintenance::InvalidateDcacheAll => dcache_all_by_set_way(SetWayOp::Invalidate),
            CacheMaintenance::InvalidateIcacheAll => {
                write_cp!("mcr p15, 0, {}, c7, c5, 0", 0);
                self.barrier(Barrier::Dsb);
                self.barrier(Barrier::Isb);
            }
            CacheMaintenance::CleanDcacheRange { start, len } => {
                clean_dcache_range(start, len);
                self.barrier(Barrier::Dsb);
            }
            CacheMaintenance::InvalidateTlbAll => {
                write_cp!("mcr p15, 0, {}, c8, c7, 0", 0);
                self.barrier(Barrier::Dsb);
                self.barrier(Barrier::Isb);
            }
        }
    }

    fn send_event(&self) {
        // SAFETY: `sev` only wakes cores waiting in `wfe`.
        unsafe { asm!("sev", options(nomem, nostack, preserves_flags)) };
    }

    fn wait_for_event(&self) {
        // SAFETY: `wfe` only idles this core.
        unsafe { asm!("wfe", options(nostack, preserves_flags)) };
    }

    fn interrupts_enabled(&self) -> bool {
        let cpsr: u32;
        // SAFETY: reading CPSR has no side effects.
        unsafe { asm!("mrs {}, cpsr", out(reg) cpsr, options(nomem, nostack, preserves_flags)) };
        cpsr & CPSR_IRQ_MASK == 0
    }

    fn disable_interrupts(&self) {
        // SAFETY: masking IRQs on this core.
        unsafe { asm!("cpsid i", options(nostack, preserves_flags)) };
    }

    fn enable_interrupts(&self) {
        // SAFETY: unmasking IRQs on this core.
        unsafe { asm!("cpsie i", options(nostack, preserves_flags)) };
    }

    fn read_mmio32(&self, addr: PhysicalAddress) -> u32 {
        // SAFETY: the caller names a device register that is mapped 1:1 during bring-up.
        unsafe { core::ptr::read_volatile(addr.value() as *const u32) }
    }

    fn write_mmio32(&self, addr: PhysicalAddress, value: u32) {
        // SAFETY: see `read_mmio32`.
        unsafe { core::ptr::write_volatile(addr.value() as *mut u32, value) }
    }

    fn handoff_routine(&self) -> VirtualAddress {
        VirtualAddress::new_canonical(arm_chain_load as usize)
    }

    fn branch_to_physical(&self, routine: PhysicalAddress, entry: PhysicalAddress, args: [usize; 4]) -> ! {
        // SAFETY: `routine` is the identity-mapped physical copy of `arm_chain_load`.
        let loader: extern "C" fn(usize, usize, usize, usize, usize) -> ! =
            unsafe { core::mem::transmute(routine.value()) };
        loader(entry.value(), args[0], args[1], args[2], args[3])
    }
}

#[derive(Clone, Copy)]
enum SetWayOp {
    CleanInvalidate,
    Invalidate,
}

/// Walks every data/unified cache level up to the level of coherency.
fn dcache_all_by_set_way(op: SetWayOp) {
    let clidr = read_cp!("mrc p15, 1, {}, c0, c0, 1");
    let level_of_coherency = (clidr >> 24) & 0x7;

    for level in 0..level_of_coherency {
        let cache_type = (clidr >> (level * 3)) & 0x7;
        if cache_type < 2 {
            // no data cache at this level
            continue;
        }
        write_cp!("mcr p15, 2, {}, c0, c0, 0", level << 1);
        // SAFETY: synchronizes the CSSELR write before reading CCSIDR.
        unsafe { asm!("isb sy", options(nostack, preserves_flags)) };
        let ccsidr = read_cp!("mrc p15, 1, {}, c0, c0, 0");

        let line_shift = (ccsidr & 0x7) + 4;
        let ways = ((ccsidr >> 3) & 0x3FF) + 1;
        let sets = ((ccsidr >> 13) & 0x7FFF) + 1;
        let way_shift = if ways > 1 { (ways - 1).leading_zeros() } else { 0 };

        for way in 0..ways {
            for set in 0..sets {
                let set_way = (way << way_shift) | (set << line_shift) | (level << 1);
                match op {
                    SetWayOp::CleanInvalidate => write_cp!("mcr p15, 0, {}, c7, c14, 2", set_way),
                    SetWayOp::Invalidate => write_cp!("mcr p15, 0, {}, c7, c6, 2", set_way),
                }
            }
        }
    }
    // SAFETY: completes the maintenance before returning.
    unsafe { asm!("dsb sy", "isb sy", options(nostack, preserves_flags)) };
}

fn clean_dcache_range(start: VirtualAddress, len: usize) {
    let ctr = read_cp!("mrc p15, 0, {}, c0, c0, 1");
    // DminLine is log2 of the number of words in the smallest line
    let line_size = 4usize << ((ctr >> 16) & 0xF);
    let mut addr = start.value() & !(line_size - 1);
    let end = start.value().saturating_add(len);
    while addr < end {
        write_cp!("mcr p15, 0, {}, c7, c10, 1", addr as u32);
        addr += line_size;
    }
}
