//! Per-board definitions for ARMv7-A builds
//!
//! | Feature | CPU Cores | Core | L2 Cache Controller |
//! | --- | --- | --- | --- |
//! | vexpress_a9 | 4 | Cortex-A9 | PL310 |
//! | qemu_virt | 4 | Cortex-A15 | integrated |
//!
//! The remaining features (`hyp_mode`, `smp`, `wait_for_secondaries`,
//! `cycle_counter`, `vfp`, `mpu`) are folded together with the selected
//! board into [`ARCH_CONFIG`], the one value the bring-up code consults
//! for every build-time decision.

#![no_std]

pub use arm_regs::ExecutionMode;
use derive_more::Display;
use kernel_config::smp::SMP_MAX_CPUS;
use static_assertions::const_assert;

/// The CPU core design, which decides topology discovery and auxiliary control bits.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum CoreFamily {
    CortexA7,
    CortexA9,
    CortexA15,
    /// Any other ARMv7-A core; nothing family-specific is done for it.
    Other,
}

#[derive(Debug, Copy, Clone)]
pub struct BoardConfig {
    pub core_family: CoreFamily,
    pub num_cpus: usize,
    /// Whether an external level-2 cache controller (PL310) sits behind the cores.
    pub l2_cache_controller: bool,
    pub has_mmu: bool,
    pub has_mpu: bool,
}

/// Every build-time choice that shapes bring-up, resolved once.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ArchConfig {
    pub mode: ExecutionMode,
    pub core_family: CoreFamily,
    /// The number of cores that will be brought up, including the primary.
    pub max_cpus: usize,
    pub smp: bool,
    pub l2_cache_controller: bool,
    pub has_mmu: bool,
    pub has_mpu: bool,
    pub cycle_counter: bool,
    pub vfp: bool,
    /// The primary waits for every secondary before finishing MMU setup.
    ///
    /// Without this, the primary may remove boot-time mappings
    /// while a secondary is still running from them.
    pub wait_for_secondaries: bool,
}

impl ArchConfig {
    /// Returns `true` if the snoop control unit must be enabled by software.
    pub const fn needs_scu_enable(&self) -> bool {
        self.smp && matches!(self.core_family, CoreFamily::CortexA9)
    }
}

#[cfg_attr(feature = "vexpress_a9", path = "boards/vexpress_a9.rs")]
#[cfg_attr(all(feature = "qemu_virt", not(feature = "vexpress_a9")), path = "boards/qemu_virt.rs")]
#[cfg_attr(not(any(feature = "vexpress_a9", feature = "qemu_virt")), path = "boards/unselected.rs")]
mod board;

pub use board::BOARD_CONFIG;

const_assert!(BOARD_CONFIG.num_cpus >= 1 && BOARD_CONFIG.num_cpus <= SMP_MAX_CPUS);

/// The configuration of this build.
pub const ARCH_CONFIG: ArchConfig = ArchConfig {
    mode: if cfg!(feature = "hyp_mode") { ExecutionMode::Hypervisor } else { ExecutionMode::Normal },
    core_family: BOARD_CONFIG.core_family,
    max_cpus: if cfg!(feature = "smp") { BOARD_CONFIG.num_cpus } else { 1 },
    smp: cfg!(feature = "smp"),
    l2_cache_controller: BOARD_CONFIG.l2_cache_controller,
    has_mmu: BOARD_CONFIG.has_mmu,
    has_mpu: BOARD_CONFIG.has_mpu || cfg!(feature = "mpu"),
    cycle_counter: cfg!(feature = "cycle_counter"),
    vfp: cfg!(feature = "vfp"),
    wait_for_secondaries: cfg!(feature = "wait_for_secondaries"),
};

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scu_enable_only_for_smp_cortex_a9() {
        let a9 = ArchConfig { core_family: CoreFamily::CortexA9, smp: true, ..ARCH_CONFIG };
        assert!(a9.needs_scu_enable());
        assert!(!ArchConfig { smp: false, ..a9 }.needs_scu_enable());
        assert!(!ArchConfig { core_family: CoreFamily::CortexA15, ..a9 }.needs_scu_enable());
    }

    #[test]
    fn uniprocessor_build_has_one_cpu() {
        if !ARCH_CONFIG.smp {
            assert_eq!(ARCH_CONFIG.max_cpus, 1);
        }
        assert!(ARCH_CONFIG.max_cpus <= BOARD_CONFIG.num_cpus);
    }
}
