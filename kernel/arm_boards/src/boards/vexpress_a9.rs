//! ARMv7-A Board Config for the Versatile Express with a CoreTile Express A9x4

use super::{BoardConfig, CoreFamily};

pub const BOARD_CONFIG: BoardConfig = BoardConfig {
    core_family: CoreFamily::CortexA9,
    num_cpus: 4,
    l2_cache_controller: true,
    has_mmu: true,
    has_mpu: false,
};
