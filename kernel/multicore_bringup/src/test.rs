//! Tests for the boot lock, the pending count and the rendezvous between cores.

use std::{sync::atomic::AtomicUsize, thread, vec::Vec};
use super::*;
use arm_boards::ARCH_CONFIG;
use arm_regs::sim::{PortEvent, SimulatedPort, DEFAULT_CBAR};
use proptest::prelude::*;

#[test]
fn boot_lock_releases_exactly_once() {
    let lock = BootLock::new();
    assert!(lock.is_held());
    assert!(lock.release().is_ok());
    assert!(!lock.is_held());
    assert!(lock.release().is_err());
}

#[test]
fn pending_count_never_goes_negative() {
    let pending = SecondariesPending::new();
    pending.set(1);
    assert_eq!(pending.complete_one(), Ok(0));
    assert!(pending.complete_one().is_err());
    assert_eq!(pending.get(), 0);
}

#[test]
fn release_publishes_count_then_cleans_lock_line() {
    let rendezvous = BootRendezvous::new();
    let port = SimulatedPort::new();
    rendezvous.release_secondaries(&port, 3).unwrap();

    assert!(rendezvous.is_released());
    assert_eq!(rendezvous.pending(), 3);
    assert_eq!(port.events(), [
        PortEvent::Barrier(Barrier::Dsb),
        PortEvent::Cache(CacheMaintenance::CleanDcacheRange {
            start: rendezvous.lock.address(),
            len: size_of::<AtomicBool>(),
        }),
        PortEvent::SendEvent,
    ]);
}

#[test]
fn second_release_is_refused_and_keeps_count() {
    let rendezvous = BootRendezvous::new();
    let port = SimulatedPort::new();
    rendezvous.release_secondaries(&port, 2).unwrap();
    assert!(rendezvous.release_secondaries(&port, 5).is_err());
    assert_eq!(rendezvous.pending(), 2);
}

#[test]
fn completion_signals_after_a_barrier() {
    let rendezvous = BootRendezvous::new();
    rendezvous.release_secondaries(&SimulatedPort::new(), 1).unwrap();

    let port = SimulatedPort::for_core(0, 1);
    assert_eq!(rendezvous.complete_secondary(&port), Ok(0));
    assert_eq!(port.events(), [PortEvent::Barrier(Barrier::Dmb), PortEvent::SendEvent]);
}

#[test]
fn no_release_means_no_waiting_for_zero_secondaries() {
    let rendezvous = BootRendezvous::new();
    let port = SimulatedPort::new();
    rendezvous.release_secondaries(&port, 0).unwrap();
    port.clear_events();
    rendezvous.wait_for_secondaries(&port);
    assert!(port.events().is_empty());
}

#[test]
fn cortex_a9_counts_from_scu_config() {
    let port = SimulatedPort::new();
    port.set_mmio(PhysicalAddress::new_canonical(DEFAULT_CBAR as usize + SCU_CONFIG_OFFSET), 0xFFFF_FF03);
    let config = ArchConfig { core_family: CoreFamily::CortexA9, smp: true, max_cpus: 4, ..ARCH_CONFIG };
    assert_eq!(secondary_count(&port, &config), 3);
}

#[test]
fn cortex_a15_counts_from_l2ctlr() {
    let port = SimulatedPort::new();
    port.set_register(SysReg::L2ctlr, 1 << 24);
    let a15 = ArchConfig { core_family: CoreFamily::CortexA15, smp: true, max_cpus: 4, ..ARCH_CONFIG };
    assert_eq!(secondary_count(&port, &a15), 1);
    let a7 = ArchConfig { core_family: CoreFamily::CortexA7, ..a15 };
    assert_eq!(secondary_count(&port, &a7), 1);
}

#[test]
fn unknown_family_assumes_every_cpu_of_the_board() {
    let port = SimulatedPort::new();
    let config = ArchConfig { core_family: CoreFamily::Other, smp: true, max_cpus: 3, ..ARCH_CONFIG };
    assert_eq!(secondary_count(&port, &config), 2);
    assert_eq!(secondary_count(&port, &ArchConfig { max_cpus: 1, ..config }), 0);
}

#[test]
fn hardware_count_is_capped_by_the_build() {
    let port = SimulatedPort::new();
    port.set_mmio(PhysicalAddress::new_canonical(DEFAULT_CBAR as usize + SCU_CONFIG_OFFSET), 3);
    let config = ArchConfig { core_family: CoreFamily::CortexA9, smp: true, max_cpus: 2, ..ARCH_CONFIG };
    assert_eq!(secondary_count(&port, &config), 1);
}

#[test]
fn snoop_control_enable_preserves_other_bits() {
    let port = SimulatedPort::new();
    let ctrl = PhysicalAddress::new_canonical(DEFAULT_CBAR as usize + SCU_CTRL_OFFSET);
    port.set_mmio(ctrl, 0x60);
    enable_snoop_control(&port);
    assert_eq!(port.mmio(ctrl), 0x61);
}

/// Runs one boot with `secondaries` simulated secondary cores,
/// returning how many of them completed bring-up.
fn boot_with(secondaries: usize) -> (usize, isize) {
    let rendezvous = BootRendezvous::new();
    let completed = AtomicUsize::new(0);

    thread::scope(|s| {
        let handles: Vec<_> = (1..=secondaries)
            .map(|cpu| {
                let rendezvous = &rendezvous;
                let completed = &completed;
                s.spawn(move || {
                    let port = SimulatedPort::for_core(0, cpu as u8);
                    rendezvous.wait_for_release(&port);
                    // this core has not counted itself off yet
                    assert!(rendezvous.pending() >= 1);
                    completed.fetch_add(1, Ordering::SeqCst);
                    rendezvous.complete_secondary(&port).unwrap();
                })
            })
            .collect();

        let primary = SimulatedPort::new();
        thread::yield_now();
        rendezvous.release_secondaries(&primary, secondaries).unwrap();
        rendezvous.wait_for_secondaries(&primary);

        for handle in handles {
            handle.join().unwrap();
        }
    });

    (completed.load(Ordering::SeqCst), rendezvous.pending())
}

#[test]
fn every_released_secondary_completes_once() {
    assert_eq!(boot_with(3), (3, 0));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn rendezvous_finishes_for_any_secondary_count(secondaries in 0usize..8) {
        let (completed, pending) = boot_with(secondaries);
        prop_assert_eq!(completed, secondaries);
        prop_assert_eq!(pending, 0);
    }
}
