//! The parts of the kernel and platform that bring-up calls into.

use bitflags::bitflags;
use derive_more::{Display, LowerHex};

/// Board and target code.
pub trait Platform: Sync {
    /// Adds the board's static mappings (devices, RAM aliases) to the boot-time tables.
    fn init_mmu_mappings(&self);

    /// Puts board devices into a state a different image can take over from.
    fn platform_quiesce(&self);

    /// Like [`Platform::platform_quiesce()`], for devices specific to the target product.
    fn target_quiesce(&self);

    /// Wakes up `count` secondary cores if the board needs a kick to start them.
    fn init_secondary_cpus(&self, count: usize);
}

/// An external level-2 cache controller such as the PL310.
pub trait L2CacheController: Sync {
    fn set_enable(&self, enable: bool);
}

/// A stage of kernel initialization; hooks registered at lower levels run first.
#[derive(Debug, Display, LowerHex, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display(fmt = "{:#x}", _0)]
pub struct InitLevel(u32);

impl InitLevel {
    pub const EARLIEST: InitLevel = InitLevel(1);
    pub const ARCH_EARLY: InitLevel = InitLevel(0x1_0000);
    pub const PLATFORM_EARLY: InitLevel = InitLevel(0x2_0000);
    pub const TARGET_EARLY: InitLevel = InitLevel(0x3_0000);
    pub const HEAP: InitLevel = InitLevel(0x4_0000);
    pub const VM: InitLevel = InitLevel(0x5_0000);
    pub const KERNEL: InitLevel = InitLevel(0x6_0000);
    pub const THREADING: InitLevel = InitLevel(0x7_0000);
    pub const ARCH: InitLevel = InitLevel(0x8_0000);
    pub const PLATFORM: InitLevel = InitLevel(0x9_0000);
    pub const TARGET: InitLevel = InitLevel(0xA_0000);
    pub const APPS: InitLevel = InitLevel(0xB_0000);
    pub const LAST: InitLevel = InitLevel(u32::MAX);

    pub const fn value(self) -> u32 {
        self.0
    }

    /// The level just below this one, the inclusive ceiling for "everything before".
    pub const fn prev(self) -> InitLevel {
        InitLevel(self.0.saturating_sub(1))
    }
}

bitflags! {
    /// Which cores an init hook runs on.
    pub struct InitFlags: u32 {
        const PRIMARY_CPU    = 0x1;
        const SECONDARY_CPUS = 0x2;
        const ALL_CPUS       = Self::PRIMARY_CPU.bits | Self::SECONDARY_CPUS.bits;
    }
}

/// The generic kernel, as far as bring-up is concerned.
pub trait KernelHooks: Sync {
    /// Runs every registered init hook matching `flags` with a level in `first..=last`.
    fn run_init_levels(&self, flags: InitFlags, first: InitLevel, last: InitLevel);

    /// Per-core multiprocessor setup (interrupt routing, per-cpu data).
    fn mp_init_percpu(&self);

    /// Prepares the virtual CPU state of a core running as a hypervisor.
    fn vcpu_boot_init(&self);

    /// The generic entry point of a secondary core into the kernel proper.
    fn secondary_cpu_entry(&self) -> !;
}
