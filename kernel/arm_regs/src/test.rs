//! Tests for typed register access and the simulated port.

extern crate std;

use self::std::vec;
use super::*;
use super::bits::SCTLR;
use super::sim::{PortEvent, SimulatedPort, DEFAULT_SCTLR, PAR_TRANSLATION_FAULT};

#[test]
fn modify_only_touches_named_fields() {
    let port = SimulatedPort::new();
    modify(&port, SysReg::Sctlr, SCTLR::A::CLEAR + SCTLR::I::SET);

    let sctlr = read_as::<_, SCTLR::Register>(&port, SysReg::Sctlr);
    assert!(!sctlr.is_set(SCTLR::A));
    assert!(sctlr.is_set(SCTLR::I));
    assert!(sctlr.is_set(SCTLR::SW));
    assert_eq!(port.writes(SysReg::Sctlr), vec![(DEFAULT_SCTLR & !(1 << 1)) | (1 << 12)]);
}

#[test]
fn banked_registers_follow_mode() {
    let normal = ExecutionMode::Normal.banked();
    assert_eq!(normal.sctlr, SysReg::Sctlr);
    assert_eq!(normal.ats1, SysReg::Ats1cpr);
    assert_eq!(normal.user_tls_rw, Some(SysReg::Tpidrurw));

    let hyp = ExecutionMode::Hypervisor.banked();
    assert_eq!(hyp.sctlr, SysReg::Hsctlr);
    assert_eq!(hyp.vbar, SysReg::Hvbar);
    assert_eq!(hyp.kernel_tls, SysReg::Htpidr);
    assert_eq!(hyp.user_tls, SysReg::Tpidrprw);
    assert_eq!(hyp.user_tls_rw, None);
}

#[test]
fn held_interrupts_restore_previous_state() {
    let port = SimulatedPort::new();
    port.set_interrupts_enabled(true);
    {
        let _held = hold_interrupts(&port);
        assert!(!port.interrupts_enabled());
    }
    assert!(port.interrupts_enabled());

    port.set_interrupts_enabled(false);
    port.clear_events();
    {
        let _held = hold_interrupts(&port);
    }
    assert!(!port.interrupts_enabled());
    assert_eq!(port.events(), vec![PortEvent::InterruptsEnabled(false)]);
}

#[test]
fn simulated_translation_request_sets_par() {
    let port = SimulatedPort::new();
    port.map_page(VirtualAddress::new_canonical(0x8000_0000), PhysicalAddress::new_canonical(0x6000_0000));

    port.write(SysReg::Ats1cpr, 0x8000_0123);
    assert_eq!(port.read(SysReg::Par), 0x6000_0000);

    port.write(SysReg::Ats1hr, 0x9000_0000);
    assert_eq!(port.read(SysReg::Par), PAR_TRANSLATION_FAULT);
}

#[test]
fn simulated_counter_enable_is_set_and_clear() {
    let port = SimulatedPort::new();
    port.write(SysReg::Pmcntenset, 1 << 31);
    assert_eq!(port.read(SysReg::Pmcntenset), 1 << 31);
    port.write(SysReg::Pmcntenclr, 1 << 31);
    assert_eq!(port.read(SysReg::Pmcntenset), 0);
}

#[test]
fn consecutive_waits_are_recorded_once() {
    let port = SimulatedPort::new();
    port.wait_for_event();
    port.wait_for_event();
    port.send_event();
    port.wait_for_event();
    assert_eq!(port.events(), vec![PortEvent::WaitForEvent, PortEvent::SendEvent, PortEvent::WaitForEvent]);
}

#[test]
fn identification_registers_ignore_writes() {
    let port = SimulatedPort::for_core(1, 2);
    port.write(SysReg::Mpidr, 0);
    assert_eq!(port.read(SysReg::Mpidr), 0x8000_0102);
}
