//! Functions for identifying CPU cores on ARMv7-A.
//!
//! A core's number is derived from its `MPIDR`: the cluster number
//! (affinity level 1) is shifted above the in-cluster cpu number
//! (affinity level 0) by [`SMP_CPU_CLUSTER_SHIFT`] bits.
//! Core 0 is always the boot (primary) core.

#![no_std]

use arm_regs::{RegisterPort, SysReg};
use derive_more::{Display, Binary, Octal, LowerHex, UpperHex};
use kernel_config::smp::SMP_CPU_CLUSTER_SHIFT;

#[cfg(test)]
mod test;

/// A small integer that identifies a physical CPU core.
#[derive(
    Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord,
    Hash, Binary, Octal, LowerHex, UpperHex,
)]
#[repr(transparent)]
pub struct CoreId(u32);

impl CoreId {
    /// The core that runs first after power-on.
    pub const PRIMARY: CoreId = CoreId(0);

    pub const fn new(number: u32) -> CoreId {
        CoreId(number)
    }

    /// Returns the inner core number.
    pub const fn value(self) -> u32 {
        self.0
    }

    pub const fn is_primary(self) -> bool {
        self.0 == Self::PRIMARY.0
    }
}

impl From<u32> for CoreId {
    fn from(number: u32) -> Self {
        CoreId(number)
    }
}

/// The raw value of a core's `MPIDR` (Multiprocessor Affinity Register).
#[derive(
    Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord,
    Hash, Binary, Octal, LowerHex, UpperHex,
)]
#[repr(transparent)]
pub struct MpidrValue(u32);

impl MpidrValue {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the inner raw value read from the `MPIDR` register.
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Reads an affinity `level` from this `MpidrValue`.
    ///
    /// Panics if the given affinity level is not 0, 1, or 2.
    pub fn affinity(self, level: u8) -> u8 {
        let shift = match level {
            0 => 0,
            1 => 8,
            2 => 16,
            _ => panic!("Valid affinity levels are 0, 1, 2"),
        };
        (self.0 >> shift) as u8
    }

    /// Create an `MpidrValue` with the multiprocessor-extensions bit set
    /// and the given cluster and cpu numbers.
    pub const fn from_affinity(cluster: u8, cpu: u8) -> Self {
        Self((1 << 31) | ((cluster as u32) << 8) | cpu as u32)
    }
}

impl From<MpidrValue> for CoreId {
    fn from(mpidr: MpidrValue) -> Self {
        let cluster = mpidr.affinity(1) as u32;
        let cpu = mpidr.affinity(0) as u32;
        CoreId((cluster << SMP_CPU_CLUSTER_SHIFT) | cpu)
    }
}

/// Reads the raw `MPIDR` of the core behind `port`.
pub fn current_mpidr<P: RegisterPort + ?Sized>(port: &P) -> MpidrValue {
    MpidrValue(port.read(SysReg::Mpidr))
}

/// Returns the ID of the currently executing CPU.
pub fn current_cpu<P: RegisterPort + ?Sized>(port: &P) -> CoreId {
    current_mpidr(port).into()
}
