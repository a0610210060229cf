//! Access to the CP15 system control coprocessor and related CPU state on ARMv7-A.
//!
//! Every register read or write, cache or TLB maintenance operation, barrier,
//! and event instruction used by the bring-up code goes through a [`RegisterPort`].
//! On ARM targets this is [`Cp15Port`], which issues the real instructions;
//! host builds with the `sim` feature get [`sim::SimulatedPort`] instead.
//!
//! The register that holds a given piece of state depends on whether the kernel
//! runs at PL1 (normal) or PL2 (hypervisor); [`ExecutionMode::banked()`] selects
//! the right set once so callers never branch on the mode themselves.

#![no_std]

use derive_more::Display;
use memory_structs::{PhysicalAddress, VirtualAddress};
use tock_registers::{fields::FieldValue, RegisterLongName, LocalRegisterCopy};

pub mod bits;

cfg_if::cfg_if! {
    if #[cfg(target_arch = "arm")] {
        mod cp15;
        pub use cp15::{Cp15Port, CP15};
    }
}

#[cfg(any(test, feature = "sim"))]
pub mod sim;

#[cfg(test)]
mod test;

/// A CPU register reachable through the system control coprocessor (or `vmrs`/`vmsr` for `FPEXC`).
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(usize)]
pub enum SysReg {
    Midr,
    Mpidr,
    /// Configuration base address: the physical base of the private peripheral region.
    Cbar,
    L2ctlr,
    L2ectlr,
    Sctlr,
    Actlr,
    Cpacr,
    Ttbcr,
    Ttbr0,
    Dacr,
    Vbar,
    /// Physical address register, the result of an `ATS1*` request.
    Par,
    /// Stage 1 current-state PL1 read translation request (write-only).
    Ats1cpr,
    Pmcr,
    Pmcntenset,
    Pmcntenclr,
    Tpidrurw,
    Tpidruro,
    Tpidrprw,
    Hsctlr,
    Hactlr,
    Htcr,
    Hvbar,
    /// Stage 1 Hyp mode read translation request (write-only).
    Ats1hr,
    Htpidr,
    Fpexc,
}

impl SysReg {
    /// The number of distinct registers named by this enum.
    pub const COUNT: usize = SysReg::Fpexc as usize + 1;
}

/// A memory barrier instruction.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Barrier {
    /// Data synchronization barrier (`dsb sy`).
    Dsb,
    /// Data memory barrier (`dmb sy`).
    Dmb,
    /// Instruction synchronization barrier (`isb sy`).
    Isb,
}

/// A cache or TLB maintenance operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMaintenance {
    /// Clean and invalidate every level of data/unified cache by set/way.
    CleanInvalidateDcacheAll,
    /// Invalidate (discard) every level of data/unified cache by set/way.
    InvalidateDcacheAll,
    /// Invalidate the entire instruction cache to the point of unification.
    InvalidateIcacheAll,
    /// Clean the data cache lines covering `[start, start + len)` to the point of coherency.
    CleanDcacheRange { start: VirtualAddress, len: usize },
    /// Invalidate the entire unified TLB.
    InvalidateTlbAll,
}

/// A narrow capability to touch per-core hardware state.
///
/// Each implementation represents the core it is running on;
/// nothing here synchronizes across cores.
pub trait RegisterPort: Sync {
    /// Reads the given system register.
    fn read(&self, reg: SysReg) -> u32;

    /// Writes the given system register.
    fn write(&self, reg: SysReg, value: u32);

    fn barrier(&self, barrier: Barrier);

    fn cache_maintenance(&self, op: CacheMaintenance);

    /// Signals an event to all cores (`sev`).
    fn send_event(&self);

    /// Idles the core until an event is signalled (`wfe`).
    fn wait_for_event(&self);

    /// Returns `true` if IRQs are currently unmasked on this core.
    fn interrupts_enabled(&self) -> bool;

    fn disable_interrupts(&self);

    fn enable_interrupts(&self);

    /// Reads a 32-bit memory-mapped register.
    fn read_mmio32(&self, addr: PhysicalAddress) -> u32;

    /// Writes a 32-bit memory-mapped register.
    fn write_mmio32(&self, addr: PhysicalAddress, value: u32);

    /// Returns the virtual address of the chain-load trampoline,
    /// the routine that turns off the MMU and jumps to the next image.
    fn handoff_routine(&self) -> VirtualAddress;

    /// Branches to the chain-load trampoline at its physical address `routine`,
    /// which will jump to `entry` with `args` in `r0..r3`.
    fn branch_to_physical(&self, routine: PhysicalAddress, entry: PhysicalAddress, args: [usize; 4]) -> !;
}

/// Reads `reg` as a typed local copy using the bitfield layout `R`.
pub fn read_as<P, R>(port: &P, reg: SysReg) -> LocalRegisterCopy<u32, R>
where
    P: RegisterPort + ?Sized,
    R: RegisterLongName,
{
    LocalRegisterCopy::new(port.read(reg))
}

/// Performs a read-modify-write of `reg`, applying the given field values.
pub fn modify<P, R>(port: &P, reg: SysReg, change: FieldValue<u32, R>)
where
    P: RegisterPort + ?Sized,
    R: RegisterLongName,
{
    let mut value = read_as::<P, R>(port, reg);
    value.modify(change);
    port.write(reg, value.get());
}

/// The privilege level whose banked registers are authoritative for the kernel.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// The kernel runs at PL1 (SVC mode).
    Normal,
    /// The kernel runs at PL2 (Hyp mode) as a hypervisor.
    Hypervisor,
}

/// The registers that hold per-mode state, as chosen by [`ExecutionMode::banked()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankedRegs {
    pub sctlr: SysReg,
    pub actlr: SysReg,
    pub vbar: SysReg,
    /// The stage 1 translation request register; the result always lands in `PAR`.
    pub ats1: SysReg,
    pub kernel_tls: SysReg,
    pub user_tls: SysReg,
    /// The user read/write TLS register, which only exists for PL1 kernels.
    pub user_tls_rw: Option<SysReg>,
    /// Registers worth dumping when tracing the translation setup of this mode.
    pub trace: &'static [SysReg],
}

impl ExecutionMode {
    pub const fn banked(self) -> BankedRegs {
        match self {
            ExecutionMode::Normal => BankedRegs {
                sctlr: SysReg::Sctlr,
                actlr: SysReg::Actlr,
                vbar: SysReg::Vbar,
                ats1: SysReg::Ats1cpr,
                kernel_tls: SysReg::Tpidrprw,
                user_tls: SysReg::Tpidruro,
                user_tls_rw: Some(SysReg::Tpidrurw),
                trace: &[SysReg::Sctlr, SysReg::Actlr, SysReg::Ttbcr, SysReg::Ttbr0, SysReg::Dacr],
            },
            ExecutionMode::Hypervisor => BankedRegs {
                sctlr: SysReg::Hsctlr,
                actlr: SysReg::Hactlr,
                vbar: SysReg::Hvbar,
                ats1: SysReg::Ats1hr,
                kernel_tls: SysReg::Htpidr,
                user_tls: SysReg::Tpidrprw,
                user_tls_rw: None,
                trace: &[SysReg::Hsctlr, SysReg::Hactlr, SysReg::Htcr],
            },
        }
    }
}

/// A guard that masks IRQs on the current core for as long as it lives.
///
/// When dropped, IRQs are unmasked again only if they were unmasked
/// when the guard was created.
pub struct HeldInterrupts<'p, P: RegisterPort + ?Sized> {
    port: &'p P,
    were_enabled: bool,
}

/// Masks IRQs on the current core and returns a guard that restores the previous state.
pub fn hold_interrupts<P: RegisterPort + ?Sized>(port: &P) -> HeldInterrupts<'_, P> {
    let were_enabled = port.interrupts_enabled();
    port.disable_interrupts();
    HeldInterrupts { port, were_enabled }
}

impl<P: RegisterPort + ?Sized> Drop for HeldInterrupts<'_, P> {
    fn drop(&mut self) {
        if self.were_enabled {
            self.port.enable_interrupts();
        }
    }
}
