//! ARMv7-A Board Config for the `virt` machine of Qemu

use super::{BoardConfig, CoreFamily};

pub const BOARD_CONFIG: BoardConfig = BoardConfig {
    core_family: CoreFamily::CortexA15,
    num_cpus: 4,
    l2_cache_controller: false,
    has_mmu: true,
    has_mpu: false,
};
