//! The per-core bring-up sequence and the primary's half of the multiprocessor boot.

use core::sync::atomic::{AtomicUsize, Ordering};
use arm_boards::CoreFamily;
use arm_regs::{ExecutionMode, SysReg};
use cpu::{current_cpu, CoreId};
use derive_more::Display;
use log::{trace, warn};
use memory_arm::mpu_init;
use multicore_bringup::{enable_snoop_control, secondary_count};
use crate::{
    cache::{disable_caches, enable_caches, force_enable_caches, Caches},
    core_mode::configure_core_mode,
    hooks::{InitFlags, InitLevel},
    Arch,
};

/// How many secondary cores turned out not to be the core they were started as.
static REJECTED_SECONDARIES: AtomicUsize = AtomicUsize::new(0);

/// Returns how many secondary cores were turned away by [`Arch::secondary_entry()`].
pub fn rejected_secondaries() -> usize {
    REJECTED_SECONDARIES.load(Ordering::Relaxed)
}

/// A secondary core whose `MPIDR` does not match the cpu number it was started as.
///
/// Such a core is left alone: nothing on it is configured, and it never
/// counts itself off the rendezvous.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[display(fmt = "cpu {} was started as cpu {}", observed, expected)]
pub struct SecondaryRejected {
    pub expected: CoreId,
    pub observed: CoreId,
}

impl<'a> Arch<'a> {
    /// See [`crate::early_init()`].
    pub fn early_init(&self) {
        let port = self.port;
        let mode = self.config.mode;

        disable_caches(port, mode, Caches::UNIFIED);
        if let Some(l2) = self.l2_cache() {
            l2.set_enable(false);
        }

        configure_core_mode(port, &self.config);

        if self.config.needs_scu_enable() {
            enable_snoop_control(port);
        }

        if let Some(mmu) = self.mmu() {
            mmu.early_init();
            self.platform.init_mmu_mappings();
        }

        if let Some(l2) = self.l2_cache() {
            l2.set_enable(true);
        }
        enable_caches(port, mode, Caches::UNIFIED);

        if let Some(mpu) = self.mpu() {
            mpu_init(mpu);
        }

        if mode == ExecutionMode::Hypervisor {
            self.hooks.vcpu_boot_init();
        }
    }

    /// See [`crate::init()`].
    pub fn init(&self) {
        if self.config.smp {
            self.hooks.mp_init_percpu();
            self.trace_registers();

            let secondaries = secondary_count(self.port, &self.config);
            self.platform.init_secondary_cpus(secondaries);

            if let Err(e) = self.rendezvous.release_secondaries(self.port, secondaries) {
                panic!("{}", e);
            }

            if self.config.wait_for_secondaries {
                // the secondaries may still run from mappings that `mmu.init()` removes
                self.rendezvous.wait_for_secondaries(self.port);
            }
        }

        if let Some(mmu) = self.mmu() {
            mmu.init();
        }
    }

    /// See [`crate::secondary_entry()`].
    pub fn secondary_entry(&self, expected_id: CoreId) -> SecondaryRejected {
        if !self.config.smp {
            panic!("arch_arm: cpu {} entered a kernel built without SMP support", expected_id);
        }
        let port = self.port;
        let mode = self.config.mode;

        self.rendezvous.wait_for_release(port);

        let observed = current_cpu(port);
        if observed != expected_id {
            REJECTED_SECONDARIES.fetch_add(1, Ordering::Relaxed);
            warn!("cpu {} was started as cpu {}, leaving it alone", observed, expected_id);
            return SecondaryRejected { expected: expected_id, observed };
        }

        configure_core_mode(port, &self.config);
        force_enable_caches(port, mode);

        if let Some(mpu) = self.mpu() {
            mpu_init(mpu);
        }
        if mode == ExecutionMode::Hypervisor {
            self.hooks.vcpu_boot_init();
        }

        self.hooks.run_init_levels(InitFlags::SECONDARY_CPUS, InitLevel::EARLIEST, InitLevel::THREADING.prev());
        self.hooks.mp_init_percpu();

        let banked = mode.banked();
        trace!("cpu num {}", observed);
        trace!("{} {:#x}", banked.sctlr, port.read(banked.sctlr));
        trace!("{} {:#x}", banked.actlr, port.read(banked.actlr));

        if let Err(e) = self.rendezvous.complete_secondary(port) {
            panic!("{}", e);
        }
        self.hooks.secondary_cpu_entry()
    }

    fn trace_registers(&self) {
        let port = self.port;
        for &reg in self.config.mode.banked().trace {
            trace!("{} {:#x}", reg, port.read(reg));
        }
        trace!("midr {:#x}", port.read(SysReg::Midr));
        trace!("mpidr {:#x}", port.read(SysReg::Mpidr));
        match self.config.core_family {
            CoreFamily::CortexA9 => trace!("cbar {:#x}", port.read(SysReg::Cbar)),
            CoreFamily::CortexA7 => {
                trace!("l2ctlr {:#x}", port.read(SysReg::L2ctlr));
                trace!("l2ectlr {:#x}", port.read(SysReg::L2ectlr));
            }
            _ => { }
        }
    }
}
