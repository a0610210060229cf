//! Build-time constants shared by the ARM architecture bring-up crates.

#![no_std]

pub mod memory;
pub mod smp;
