//! Tests for core numbering.

use super::*;
use arm_regs::sim::SimulatedPort;

#[test]
fn boot_core_is_primary() {
    let port = SimulatedPort::new();
    let id = current_cpu(&port);
    assert_eq!(id, CoreId::PRIMARY);
    assert!(id.is_primary());
}

#[test]
fn cluster_is_shifted_above_cpu() {
    let port = SimulatedPort::for_core(1, 2);
    assert_eq!(current_cpu(&port), CoreId::new((1 << SMP_CPU_CLUSTER_SHIFT) | 2));
    assert!(!current_cpu(&port).is_primary());
}

#[test]
fn affinity_levels() {
    let mpidr = MpidrValue::from_affinity(3, 1);
    assert_eq!(mpidr.affinity(0), 1);
    assert_eq!(mpidr.affinity(1), 3);
    assert_eq!(mpidr.affinity(2), 0);
    assert_eq!(mpidr.value(), 0x8000_0301);
}

#[test]
#[should_panic]
fn affinity_level_three_does_not_exist() {
    MpidrValue::new(0).affinity(3);
}
