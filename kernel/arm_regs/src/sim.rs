//! A host-side register file that stands in for a core's CP15 state.
//!
//! [`SimulatedPort`] keeps every [`SysReg`] in memory, resolves `ATS1*`
//! translation requests against a page map it is given, and records
//! each side-effecting operation as a [`PortEvent`] so tests can check
//! what was done and in which order.

extern crate std;

use self::std::{collections::BTreeMap, panic::panic_any, thread, vec::Vec};
use kernel_config::memory::PAGE_SHIFT;
use memory_structs::{PhysicalAddress, VirtualAddress};
use spin::Mutex;
use super::{Barrier, CacheMaintenance, RegisterPort, SysReg};

/// Cortex-A9 r3p0.
pub const DEFAULT_MIDR: u32 = 0x413F_C090;
/// The private peripheral base of a Versatile Express A9 tile.
pub const DEFAULT_CBAR: u32 = 0x1E00_0000;
/// `SCTLR` out of reset, with alignment checking, SWP and round-robin replacement enabled.
pub const DEFAULT_SCTLR: u32 = 0x00C5_0078 | (1 << 1) | (1 << 10) | (1 << 14);
/// A `PAR` reporting a translation fault at level 1.
pub const PAR_TRANSLATION_FAULT: u32 = 1 | (0b00101 << 1);
/// Where the chain-load trampoline lives unless a test says otherwise.
pub const DEFAULT_HANDOFF_ROUTINE: usize = 0x8010_0000;

/// One observable side effect performed through a [`SimulatedPort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortEvent {
    Write { reg: SysReg, value: u32 },
    Barrier(Barrier),
    Cache(CacheMaintenance),
    Mmio { addr: PhysicalAddress, value: u32 },
    /// IRQs were masked (`false`) or unmasked (`true`).
    InterruptsEnabled(bool),
    SendEvent,
    /// One or more consecutive `wfe`s.
    WaitForEvent,
    Branch(Handoff),
}

/// The branch a core took into the chain-load trampoline.
///
/// [`SimulatedPort::branch_to_physical()`] cannot return,
/// so it unwinds with this value as the panic payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handoff {
    pub routine: PhysicalAddress,
    pub entry: PhysicalAddress,
    pub args: [usize; 4],
}

struct SimState {
    regs: [u32; SysReg::COUNT],
    /// Virtual page number to physical frame number.
    pages: BTreeMap<usize, usize>,
    mmio: BTreeMap<usize, u32>,
    irqs_enabled: bool,
    handoff_routine: VirtualAddress,
    events: Vec<PortEvent>,
}

impl SimState {
    fn record(&mut self, event: PortEvent) {
        if event == PortEvent::WaitForEvent && self.events.last() == Some(&PortEvent::WaitForEvent) {
            return;
        }
        self.events.push(event);
    }

    fn translate(&self, vaddr: u32) -> u32 {
        let vaddr = vaddr as usize;
        match self.pages.get(&(vaddr >> PAGE_SHIFT)) {
            Some(frame) => (frame << PAGE_SHIFT) as u32,
            None => PAR_TRANSLATION_FAULT,
        }
    }
}

/// A simulated core, see the module docs.
pub struct SimulatedPort {
    state: Mutex<SimState>,
}

impl Default for SimulatedPort {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPort {
    /// Creates the boot core (cluster 0, cpu 0) with reset register values.
    pub fn new() -> SimulatedPort {
        Self::for_core(0, 0)
    }

    /// Creates a core whose `MPIDR` reports the given cluster and cpu number.
    pub fn for_core(cluster: u8, cpu: u8) -> SimulatedPort {
        let mut regs = [0; SysReg::COUNT];
        regs[SysReg::Midr as usize] = DEFAULT_MIDR;
        regs[SysReg::Mpidr as usize] = 0x8000_0000 | ((cluster as u32) << 8) | cpu as u32;
        regs[SysReg::Cbar as usize] = DEFAULT_CBAR;
        regs[SysReg::Sctlr as usize] = DEFAULT_SCTLR;
        regs[SysReg::Hsctlr as usize] = DEFAULT_SCTLR;
        SimulatedPort {
            state: Mutex::new(SimState {
                regs,
                pages: BTreeMap::new(),
                mmio: BTreeMap::new(),
                irqs_enabled: false,
                handoff_routine: VirtualAddress::new_canonical(DEFAULT_HANDOFF_ROUTINE),
                events: Vec::new(),
            }),
        }
    }

    /// Sets a register without recording an event.
    pub fn set_register(&self, reg: SysReg, value: u32) {
        self.state.lock().regs[reg as usize] = value;
    }

    /// Returns a register's value without any of the side effects of a real read.
    pub fn register(&self, reg: SysReg) -> u32 {
        self.state.lock().regs[reg as usize]
    }

    /// Makes the page containing `vaddr` translate to the frame containing `paddr`.
    pub fn map_page(&self, vaddr: VirtualAddress, paddr: PhysicalAddress) {
        self.state.lock().pages.insert(vaddr.value() >> PAGE_SHIFT, paddr.value() >> PAGE_SHIFT);
    }

    pub fn unmap_page(&self, vaddr: VirtualAddress) {
        self.state.lock().pages.remove(&(vaddr.value() >> PAGE_SHIFT));
    }

    /// Presets a memory-mapped register without recording an event.
    pub fn set_mmio(&self, addr: PhysicalAddress, value: u32) {
        self.state.lock().mmio.insert(addr.value(), value);
    }

    /// Returns a memory-mapped register's value; unbacked addresses read as zero.
    pub fn mmio(&self, addr: PhysicalAddress) -> u32 {
        self.state.lock().mmio.get(&addr.value()).copied().unwrap_or(0)
    }

    pub fn set_handoff_routine(&self, routine: VirtualAddress) {
        self.state.lock().handoff_routine = routine;
    }

    /// Sets the IRQ mask state without recording an event.
    pub fn set_interrupts_enabled(&self, enabled: bool) {
        self.state.lock().irqs_enabled = enabled;
    }

    /// Returns every event recorded so far, oldest first.
    pub fn events(&self) -> Vec<PortEvent> {
        self.state.lock().events.clone()
    }

    /// Returns the values written to `reg`, oldest first.
    pub fn writes(&self, reg: SysReg) -> Vec<u32> {
        self.state.lock().events.iter()
            .filter_map(|e| match e {
                PortEvent::Write { reg: r, value } if *r == reg => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub fn clear_events(&self) {
        self.state.lock().events.clear();
    }
}

impl RegisterPort for SimulatedPort {
    fn read(&self, reg: SysReg) -> u32 {
        match reg {
            SysReg::Ats1cpr | SysReg::Ats1hr => 0,
            _ => self.state.lock().regs[reg as usize],
        }
    }

    fn write(&self, reg: SysReg, value: u32) {
        let mut state = self.state.lock();
        state.record(PortEvent::Write { reg, value });
        match reg {
            SysReg::Ats1cpr | SysReg::Ats1hr => {
                let par = state.translate(value);
                state.regs[SysReg::Par as usize] = par;
            }
            SysReg::Pmcntenset => {
                let enabled = state.regs[SysReg::Pmcntenset as usize] | value;
                state.regs[SysReg::Pmcntenset as usize] = enabled;
                state.regs[SysReg::Pmcntenclr as usize] = enabled;
            }
            SysReg::Pmcntenclr => {
                let enabled = state.regs[SysReg::Pmcntenset as usize] & !value;
                state.regs[SysReg::Pmcntenset as usize] = enabled;
                state.regs[SysReg::Pmcntenclr as usize] = enabled;
            }
            SysReg::Midr | SysReg::Mpidr | SysReg::Cbar => {}
            _ => state.regs[reg as usize] = value,
        }
    }

    fn barrier(&self, barrier: Barrier) {
        self.state.lock().record(PortEvent::Barrier(barrier));
    }

    fn cache_maintenance(&self, op: CacheMaintenance) {
        self.state.lock().record(PortEvent::Cache(op));
    }

    fn send_event(&self) {
        self.state.lock().record(PortEvent::SendEvent);
    }

    fn wait_for_event(&self) {
        self.state.lock().record(PortEvent::WaitForEvent);
        thread::yield_now();
    }

    fn interrupts_enabled(&self) -> bool {
        self.state.lock().irqs_enabled
    }

    fn disable_interrupts(&self) {
        let mut state = self.state.lock();
        state.irqs_enabled = false;
        state.record(PortEvent::InterruptsEnabled(false));
    }

    fn enable_interrupts(&self) {
        let mut state = self.state.lock();
        state.irqs_enabled = true;
        state.record(PortEvent::InterruptsEnabled(true));
    }

    fn read_mmio32(&self, addr: PhysicalAddress) -> u32 {
        self.mmio(addr)
    }

    fn write_mmio32(&self, addr: PhysicalAddress, value: u32) {
        let mut state = self.state.lock();
        state.mmio.insert(addr.value(), value);
        state.record(PortEvent::Mmio { addr, value });
    }

    fn handoff_routine(&self) -> VirtualAddress {
        self.state.lock().handoff_routine
    }

    fn branch_to_physical(&self, routine: PhysicalAddress, entry: PhysicalAddress, args: [usize; 4]) -> ! {
        let handoff = Handoff { routine, entry, args };
        self.state.lock().record(PortEvent::Branch(handoff));
        panic_any(handoff)
    }
}
