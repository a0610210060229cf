//! Generic board config file, selected by default if you didn't select one.
//!
//! This will result in a compile-time error if used in an ARM build.
//! On the host it describes a plain single-core machine for unit tests.

use super::{BoardConfig, CoreFamily};

#[cfg(target_arch = "arm")]
compile_error!("Please select a board config feature in the arm_boards crate");

pub const BOARD_CONFIG: BoardConfig = BoardConfig {
    core_family: CoreFamily::Other,
    num_cpus: 1,
    l2_cache_controller: false,
    has_mmu: true,
    has_mpu: false,
};
