//! Thread pointer registers.
//!
//! A PL1 kernel keeps its own pointer in `TPIDRPRW` and gives user
//! threads the read-only `TPIDRURO`, which is what existing ABIs read.
//! A PL2 kernel keeps its pointer in `HTPIDR` and its PL1 guests' in `TPIDRPRW`.

use arm_regs::{ExecutionMode, RegisterPort};
use memory_structs::VirtualAddress;

pub fn set_kernel_tls<P: RegisterPort + ?Sized>(port: &P, mode: ExecutionMode, tls: VirtualAddress) {
    port.write(mode.banked().kernel_tls, tls.value() as u32);
}

pub fn set_user_tls<P: RegisterPort + ?Sized>(port: &P, mode: ExecutionMode, tls: VirtualAddress) {
    port.write(mode.banked().user_tls, tls.value() as u32);
}

/// Sets the user read/write thread pointer, which only a PL1 kernel manages.
pub fn set_user_tls_rw<P: RegisterPort + ?Sized>(
    port: &P,
    mode: ExecutionMode,
    tls: VirtualAddress,
) -> Result<(), &'static str> {
    let reg = mode.banked().user_tls_rw
        .ok_or("set_user_tls_rw(): there is no user read/write thread pointer in hypervisor mode")?;
    port.write(reg, tls.value() as u32);
    Ok(())
}
