//! Bitfield layouts of the registers the bring-up code modifies.
//!
//! The hypervisor-banked `HSCTLR`/`HACTLR` share the bit positions of
//! `SCTLR`/`ACTLR` for every field used here.

#![allow(non_snake_case)]

use tock_registers::register_bitfields;

register_bitfields! {u32,
    /// System Control Register.
    pub SCTLR [
        /// MMU enable.
        M OFFSET(0) NUMBITS(1) [],
        /// Alignment fault checking.
        A OFFSET(1) NUMBITS(1) [],
        /// Data and unified cache enable.
        C OFFSET(2) NUMBITS(1) [],
        /// SWP/SWPB instruction enable.
        SW OFFSET(10) NUMBITS(1) [],
        /// Program flow (branch) prediction enable.
        Z OFFSET(11) NUMBITS(1) [],
        /// Instruction cache enable.
        I OFFSET(12) NUMBITS(1) [],
        /// High exception vectors.
        V OFFSET(13) NUMBITS(1) [],
        /// Round-robin (predictable) cache replacement.
        RR OFFSET(14) NUMBITS(1) [],
        /// Unaligned data access support.
        U OFFSET(22) NUMBITS(1) [],
        /// Big-endian exception entry.
        EE OFFSET(25) NUMBITS(1) [],
        /// Thumb exception entry.
        TE OFFSET(30) NUMBITS(1) []
    ],

    /// Auxiliary Control Register (Cortex-A7/A9 layout).
    pub ACTLR [
        /// Cache and TLB maintenance broadcast (Cortex-A9).
        FW OFFSET(0) NUMBITS(1) [],
        /// Prefetch hint to the L2 controller (Cortex-A9).
        L2_PREFETCH_HINT OFFSET(1) NUMBITS(1) [],
        /// Data cache prefetch (Cortex-A9).
        DP OFFSET(2) NUMBITS(1) [],
        /// Write full line of zeros (Cortex-A9).
        WFLZ OFFSET(3) NUMBITS(1) [],
        /// Coherent requests from this core (SMP mode).
        SMP OFFSET(6) NUMBITS(1) [],
        /// Exclusive L1/L2 caching (Cortex-A9).
        EXCL OFFSET(7) NUMBITS(1) []
    ],

    /// Performance Monitors Control Register.
    pub PMCR [
        /// Enable all counters.
        E OFFSET(0) NUMBITS(1) [],
        /// Event counter reset.
        P OFFSET(1) NUMBITS(1) [],
        /// Cycle counter reset.
        C OFFSET(2) NUMBITS(1) [],
        /// Cycle counter clock divider: count every 64th cycle.
        D OFFSET(3) NUMBITS(1) []
    ],

    /// Performance Monitors Count Enable Set/Clear Registers.
    pub PMCNTEN [
        /// The cycle counter.
        C OFFSET(31) NUMBITS(1) []
    ],

    /// Coprocessor Access Control Register.
    pub CPACR [
        CP10 OFFSET(20) NUMBITS(2) [
            Denied = 0,
            Privileged = 1,
            Full = 3
        ],
        CP11 OFFSET(22) NUMBITS(2) [
            Denied = 0,
            Privileged = 1,
            Full = 3
        ]
    ],

    /// Floating-Point Exception Control register.
    pub FPEXC [
        /// Floating-point unit enable.
        EN OFFSET(30) NUMBITS(1) []
    ],

    /// Physical Address Register, short-descriptor format.
    pub PAR [
        /// The translation aborted.
        F OFFSET(0) NUMBITS(1) [],
        /// Fault status, valid only when `F` is set.
        FS OFFSET(1) NUMBITS(6) [],
        /// Physical address bits [31:12].
        PA OFFSET(12) NUMBITS(20) []
    ],

    /// Multiprocessor Affinity Register.
    pub MPIDR [
        AFF0 OFFSET(0) NUMBITS(8) [],
        AFF1 OFFSET(8) NUMBITS(8) [],
        AFF2 OFFSET(16) NUMBITS(8) [],
        /// Uniprocessor system.
        U OFFSET(30) NUMBITS(1) [],
        /// The multiprocessing extensions are implemented.
        MP OFFSET(31) NUMBITS(1) []
    ],

    /// L2 Control Register (Cortex-A7/A15).
    pub L2CTLR [
        /// Number of cores in the cluster, minus one.
        NUM_CPUS OFFSET(24) NUMBITS(2) []
    ],

    /// Snoop Control Unit control register, at `CBAR + 0x0` (Cortex-A9).
    pub SCU_CTRL [
        EN OFFSET(0) NUMBITS(1) []
    ],

    /// Snoop Control Unit configuration register, at `CBAR + 0x4` (Cortex-A9).
    pub SCU_CONFIG [
        /// Number of cores present, minus one.
        CPU_NUMBER OFFSET(0) NUMBITS(2) []
    ]
}

/// Offset of the SCU control register from `CBAR`.
pub const SCU_CTRL_OFFSET: usize = 0x0;
/// Offset of the SCU configuration register from `CBAR`.
pub const SCU_CONFIG_OFFSET: usize = 0x4;
