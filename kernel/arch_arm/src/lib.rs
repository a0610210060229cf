//! ARMv7-A architecture bring-up.
//!
//! This crate takes every core from its first instructions in Rust to the
//! point where the generic kernel can run on it, and can later hand the
//! whole machine over to another loaded image.
//!
//! Everything it needs from outside is gathered in an [`Arch`]: the
//! core's [`RegisterPort`], the build's [`ArchConfig`], and the platform,
//! kernel, MMU/MPU and level-2 cache collaborators. The boot code builds
//! one and [`install()`]s it; the free functions of this crate then act on
//! the installed instance.
//!
//! The primary core calls [`early_init()`] and later [`init()`]; each
//! secondary core calls [`secondary_entry()`] with the cpu number it was
//! started as.

#![no_std]

use arm_regs::RegisterPort;
use cpu::CoreId;
use memory_arm::{ArchMmu, Mpu, NotFound};
use memory_structs::{PhysicalAddress, VirtualAddress};
use multicore_bringup::BootRendezvous;
use spin::Once;

pub use arm_boards::{ArchConfig, CoreFamily, ExecutionMode, ARCH_CONFIG};

mod cache;
mod chain_load;
mod core_mode;
mod early;
mod hooks;
mod tls;

pub use cache::{disable_caches, enable_caches, Caches};
pub use core_mode::{configure_core_mode, quiesce_core, set_fpu_enabled};
pub use early::{rejected_secondaries, SecondaryRejected};
pub use hooks::{InitFlags, InitLevel, KernelHooks, L2CacheController, Platform};


/// The hardware and collaborators that bring-up drives.
#[derive(Clone, Copy)]
pub struct Arch<'a> {
    pub config: ArchConfig,
    pub port: &'a dyn RegisterPort,
    pub platform: &'a dyn Platform,
    pub hooks: &'a dyn KernelHooks,
    pub mmu: Option<&'a dyn ArchMmu>,
    pub mpu: Option<&'a dyn Mpu>,
    pub l2_cache: Option<&'a dyn L2CacheController>,
    pub rendezvous: &'a BootRendezvous,
}

impl<'a> Arch<'a> {
    /// Checks that a collaborator is present for every feature the configuration enables.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.config.has_mmu && self.mmu.is_none() {
            return Err("arch_arm: the configuration has an MMU but no ArchMmu was given");
        }
        if self.config.has_mpu && self.mpu.is_none() {
            return Err("arch_arm: the configuration has an MPU but no Mpu was given");
        }
        if self.config.l2_cache_controller && self.l2_cache.is_none() {
            return Err("arch_arm: the configuration has an L2 cache controller but none was given");
        }
        Ok(())
    }

    fn mmu(&self) -> Option<&'a dyn ArchMmu> {
        self.mmu.filter(|_| self.config.has_mmu)
    }

    fn mpu(&self) -> Option<&'a dyn Mpu> {
        self.mpu.filter(|_| self.config.has_mpu)
    }

    fn l2_cache(&self) -> Option<&'a dyn L2CacheController> {
        self.l2_cache.filter(|_| self.config.l2_cache_controller)
    }

    pub fn translate(&self, vaddr: VirtualAddress) -> Result<PhysicalAddress, NotFound> {
        memory_arm::translate(self.port, self.config.mode, vaddr)
    }

    pub fn set_kernel_tls(&self, tls: VirtualAddress) {
        tls::set_kernel_tls(self.port, self.config.mode, tls)
    }

    pub fn set_user_tls(&self, tls: VirtualAddress) {
        tls::set_user_tls(self.port, self.config.mode, tls)
    }

    pub fn set_user_tls_rw(&self, tls: VirtualAddress) -> Result<(), &'static str> {
        tls::set_user_tls_rw(self.port, self.config.mode, tls)
    }

    pub fn quiesce_core(&self) {
        quiesce_core(self.port, &self.config)
    }

    pub fn set_fpu_enabled(&self, enable: bool) {
        set_fpu_enabled(self.port, enable)
    }
}

static ARCH: Once<Arch<'static>> = Once::new();

/// Makes `arch` the instance used by this crate's free functions.
///
/// This can only be done once.
pub fn install(arch: Arch<'static>) -> Result<&'static Arch<'static>, &'static str> {
    arch.validate()?;
    let mut installed = false;
    let arch = ARCH.call_once(|| {
        installed = true;
        arch
    });
    if !installed {
        return Err("arch_arm: install() was already called");
    }
    Ok(arch)
}

/// Returns the installed [`Arch`], if any.
pub fn get() -> Option<&'static Arch<'static>> {
    ARCH.get()
}

fn arch() -> &'static Arch<'static> {
    match ARCH.get() {
        Some(arch) => arch,
        None => panic!("arch_arm: used before install()"),
    }
}

/// Primary-core setup before the virtual memory subsystem exists.
pub fn early_init() {
    arch().early_init()
}

/// Primary-core setup once the kernel heap exists: releases the secondaries
/// and finishes MMU initialization.
pub fn init() {
    arch().init()
}

/// Brings up a secondary core and enters the kernel on it.
///
/// Only returns if the core is not the one `expected_id` names.
/// Panics if the configuration has no SMP support.
pub fn secondary_entry(expected_id: CoreId) -> SecondaryRejected {
    arch().secondary_entry(expected_id)
}

/// Translates `vaddr` with the current core's MMU.
pub fn translate(vaddr: VirtualAddress) -> Result<PhysicalAddress, NotFound> {
    arch().translate(vaddr)
}

/// Hands the machine over to the image whose entry point is mapped at `entry`.
pub fn chain_load(entry: VirtualAddress, arg0: usize, arg1: usize, arg2: usize, arg3: usize) -> ! {
    arch().chain_load(entry, [arg0, arg1, arg2, arg3])
}

pub fn set_kernel_tls(tls: VirtualAddress) {
    arch().set_kernel_tls(tls)
}

pub fn set_user_tls(tls: VirtualAddress) {
    arch().set_user_tls(tls)
}

pub fn set_user_tls_rw(tls: VirtualAddress) -> Result<(), &'static str> {
    arch().set_user_tls_rw(tls)
}

/// Quiesces the current core before it goes offline.
pub fn quiesce() {
    arch().quiesce_core()
}

/// Called by the secondary-core trampoline with the cpu number it started the core as.
#[cfg(all(target_arch = "arm", feature = "smp"))]
#[no_mangle]
pub extern "C" fn arm_secondary_entry(asm_cpu_num: u32) {
    let _ = secondary_entry(CoreId::new(asm_cpu_num));
}
