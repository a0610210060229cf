//! Functions for releasing the secondary CPU cores and waiting for them.
//!
//! Secondary cores start spinning on the [`BootLock`] as soon as they come
//! out of reset, with their caches still off. The primary core decides how
//! many secondaries exist, stores that in [`SecondariesPending`], releases
//! the lock, and cleans the lock's cache line so the secondaries see it.
//! Each secondary counts itself off once its local bring-up is done.
//!
//! Both values only live for one boot; nothing touches them after the
//! rendezvous.

#![no_std]

use core::{
    mem::size_of,
    sync::atomic::{AtomicBool, AtomicIsize, Ordering},
};
use arm_boards::{ArchConfig, CoreFamily};
use arm_regs::{
    bits::{L2CTLR, SCU_CONFIG, SCU_CONFIG_OFFSET, SCU_CTRL, SCU_CTRL_OFFSET},
    read_as, Barrier, CacheMaintenance, RegisterPort, SysReg,
};
use log::{debug, error};
use memory_structs::{PhysicalAddress, VirtualAddress};
use tock_registers::LocalRegisterCopy;

// proptest's macros name `::std` directly
#[cfg(test)]
extern crate std;
#[cfg(test)]
mod test;

/// A lock that starts out held and is released exactly once.
pub struct BootLock {
    held: AtomicBool,
}

impl BootLock {
    pub const fn new() -> BootLock {
        BootLock { held: AtomicBool::new(true) }
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }

    /// Releases the lock.
    ///
    /// Returns an error if it was already released.
    pub fn release(&self) -> Result<(), &'static str> {
        self.held
            .compare_exchange(true, false, Ordering::Release, Ordering::Relaxed)
            .map(|_| ())
            .map_err(|_| "BUG: the boot lock was already released")
    }

    /// The address of the lock word, for cache maintenance.
    pub fn address(&self) -> VirtualAddress {
        VirtualAddress::new_canonical(&self.held as *const AtomicBool as usize)
    }
}

impl Default for BootLock {
    fn default() -> Self {
        Self::new()
    }
}

/// The number of secondary cores that have not finished their bring-up yet.
pub struct SecondariesPending {
    count: AtomicIsize,
}

impl SecondariesPending {
    pub const fn new() -> SecondariesPending {
        SecondariesPending { count: AtomicIsize::new(0) }
    }

    pub fn get(&self) -> isize {
        self.count.load(Ordering::Acquire)
    }

    fn set(&self, count: usize) {
        self.count.store(count as isize, Ordering::Release);
    }

    /// Counts one secondary off, returning how many are still pending.
    ///
    /// The count never goes below zero; trying to is an error.
    pub fn complete_one(&self) -> Result<isize, &'static str> {
        match self.count.fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| (c > 0).then(|| c - 1)) {
            Ok(previous) => Ok(previous - 1),
            Err(current) => {
                error!("a secondary cpu completed bring-up with {} secondaries pending", current);
                Err("BUG: more secondary cpus completed bring-up than were released")
            }
        }
    }
}

impl Default for SecondariesPending {
    fn default() -> Self {
        Self::new()
    }
}

/// The [`BootLock`] and [`SecondariesPending`] pair shared by every core during boot.
#[derive(Default)]
pub struct BootRendezvous {
    lock: BootLock,
    pending: SecondariesPending,
}

impl BootRendezvous {
    pub const fn new() -> BootRendezvous {
        BootRendezvous {
            lock: BootLock::new(),
            pending: SecondariesPending::new(),
        }
    }

    pub fn is_released(&self) -> bool {
        !self.lock.is_held()
    }

    pub fn pending(&self) -> isize {
        self.pending.get()
    }

    /// Publishes the secondary count and releases the secondaries.
    ///
    /// Runs on the primary core. The lock word's cache line is cleaned
    /// afterwards because the secondaries read it with their caches off.
    pub fn release_secondaries<P>(&self, port: &P, count: usize) -> Result<(), &'static str>
    where
        P: RegisterPort + ?Sized,
    {
        if !self.lock.is_held() {
            return Err("BUG: the boot lock was already released");
        }
        debug!("releasing {} secondary cpu{}", count, if count != 1 { "s" } else { "" });
        self.pending.set(count);
        self.lock.release()?;

        port.barrier(Barrier::Dsb);
        port.cache_maintenance(CacheMaintenance::CleanDcacheRange {
            start: self.lock.address(),
            len: size_of::<AtomicBool>(),
        });
        port.send_event();
        Ok(())
    }

    /// Idles the current secondary core until the primary releases the lock.
    pub fn wait_for_release<P: RegisterPort + ?Sized>(&self, port: &P) {
        while self.lock.is_held() {
            port.wait_for_event();
        }
    }

    /// Tells the primary that the current secondary core is up.
    pub fn complete_secondary<P>(&self, port: &P) -> Result<isize, &'static str>
    where
        P: RegisterPort + ?Sized,
    {
        let remaining = self.pending.complete_one()?;
        port.barrier(Barrier::Dmb);
        port.send_event();
        Ok(remaining)
    }

    /// Idles the primary core until every released secondary has completed.
    pub fn wait_for_secondaries<P: RegisterPort + ?Sized>(&self, port: &P) {
        while self.pending.get() > 0 {
            port.wait_for_event();
        }
    }
}

/// Returns how many secondary cores to bring up.
///
/// Cortex-A9 reads the snoop control unit's configuration, Cortex-A7/A15
/// read `L2CTLR`, and any other core assumes every cpu of the board exists.
/// The result never exceeds the `max_cpus - 1` secondaries the build supports.
pub fn secondary_count<P>(port: &P, config: &ArchConfig) -> usize
where
    P: RegisterPort + ?Sized,
{
    let supported = config.max_cpus.saturating_sub(1);
    let reported = match config.core_family {
        CoreFamily::CortexA9 => {
            let scu_config = LocalRegisterCopy::<u32, SCU_CONFIG::Register>::new(
                port.read_mmio32(scu_base(port) + SCU_CONFIG_OFFSET)
            );
            scu_config.read(SCU_CONFIG::CPU_NUMBER) as usize
        }
        CoreFamily::CortexA7 | CoreFamily::CortexA15 => {
            read_as::<P, L2CTLR::Register>(port, SysReg::L2ctlr).read(L2CTLR::NUM_CPUS) as usize
        }
        CoreFamily::Other => supported,
    };
    core::cmp::min(reported, supported)
}

/// Turns on the Cortex-A9 snoop control unit, which keeps the cores' L1 data caches coherent.
pub fn enable_snoop_control<P: RegisterPort + ?Sized>(port: &P) {
    let ctrl_addr = scu_base(port) + SCU_CTRL_OFFSET;
    let mut ctrl = LocalRegisterCopy::<u32, SCU_CTRL::Register>::new(port.read_mmio32(ctrl_addr));
    ctrl.modify(SCU_CTRL::EN::SET);
    port.write_mmio32(ctrl_addr, ctrl.get());
}

fn scu_base<P: RegisterPort + ?Sized>(port: &P) -> PhysicalAddress {
    PhysicalAddress::new_canonical(port.read(SysReg::Cbar) as usize)
}
