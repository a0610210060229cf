//! Puts a core's control registers into the state the kernel runs in,
//! and back into a near-reset state before the core goes away.

use arm_boards::{ArchConfig, CoreFamily};
use arm_regs::{
    bits::{ACTLR, CPACR, FPEXC, PMCNTEN, PMCR, SCTLR},
    modify, read_as, Barrier, RegisterPort, SysReg,
};
use kernel_config::memory::KERNEL_VECTOR_BASE;
use tock_registers::LocalRegisterCopy;

/// Configures the current core's control registers for the kernel.
///
/// Must run with IRQs masked, once per core. Only registers of the
/// configured [`ExecutionMode`](arm_regs::ExecutionMode) are touched.
pub fn configure_core_mode<P: RegisterPort + ?Sized>(port: &P, config: &ArchConfig) {
    let banked = config.mode.banked();

    modify(port, banked.sctlr,
        SCTLR::SW::CLEAR
        + SCTLR::Z::SET
        + SCTLR::RR::CLEAR
        + SCTLR::EE::CLEAR
        + SCTLR::TE::CLEAR
        + SCTLR::U::SET
        + SCTLR::A::CLEAR
    );

    let mut actlr = read_as::<P, ACTLR::Register>(port, banked.actlr);
    match config.core_family {
        CoreFamily::CortexA9 => {
            actlr.modify(ACTLR::DP::SET);
            if config.l2_cache_controller {
                actlr.modify(ACTLR::EXCL::SET + ACTLR::WFLZ::SET + ACTLR::L2_PREFETCH_HINT::SET);
            }
            if config.smp {
                actlr.modify(ACTLR::SMP::SET + ACTLR::FW::SET);
            }
        }
        CoreFamily::CortexA7 if config.smp => actlr.modify(ACTLR::SMP::SET),
        _ => { }
    }
    port.write(banked.actlr, actlr.get());

    if config.cycle_counter {
        // count every cycle rather than every 64th
        modify(port, SysReg::Pmcr, PMCR::D::CLEAR + PMCR::E::SET);
        port.write(SysReg::Pmcntenset, cycle_counter_bit());
    }

    if config.vfp {
        modify(port, SysReg::Cpacr, CPACR::CP10::Full + CPACR::CP11::Full);
        port.barrier(Barrier::Isb);
        modify(port, SysReg::Fpexc, FPEXC::EN::SET);
        // threads turn it on when they first use it
        set_fpu_enabled(port, false);
    }

    port.write(banked.vbar, KERNEL_VECTOR_BASE as u32);
    port.barrier(Barrier::Isb);
}

/// Enables or disables the floating point unit on the current core.
pub fn set_fpu_enabled<P: RegisterPort + ?Sized>(port: &P, enable: bool) {
    modify(port, SysReg::Fpexc, if enable { FPEXC::EN::SET } else { FPEXC::EN::CLEAR });
}

/// Stops the performance counters and puts the auxiliary control
/// register back to its default, before taking the core offline
/// or handing the machine to another image.
pub fn quiesce_core<P: RegisterPort + ?Sized>(port: &P, config: &ArchConfig) {
    if config.cycle_counter {
        modify(port, SysReg::Pmcr, PMCR::E::CLEAR);
        port.write(SysReg::Pmcntenclr, cycle_counter_bit());
    }

    let actlr_reg = config.mode.banked().actlr;
    let actlr = match config.core_family {
        CoreFamily::CortexA9 => 0,
        _ => port.read(actlr_reg),
    };
    port.write(actlr_reg, actlr);
}

fn cycle_counter_bit() -> u32 {
    let mut enable = LocalRegisterCopy::<u32, PMCNTEN::Register>::new(0);
    enable.write(PMCNTEN::C::SET);
    enable.get()
}
