//! This crate contains the basic address types used for memory management
//! on 32-bit ARM: `VirtualAddress` and `PhysicalAddress`.
//!
//! Both are `usize` under the hood but are always canonicalized to the
//! 32-bit address space, so host-side unit tests behave like the target.

#![no_std]

use core::{
    fmt,
    ops::{Add, AddAssign, Sub, SubAssign},
};
use derive_more::{Binary, Octal, LowerHex, UpperHex};
use kernel_config::memory::{MAX_VIRTUAL_ADDRESS, PAGE_SIZE, SECTION_SIZE};
use paste::paste;

#[cfg(test)]
mod test;

/// A macro for defining `VirtualAddress` and `PhysicalAddress` structs
/// and implementing their common traits, which are generally identical.
macro_rules! implement_address {
    ($TypeName:ident, $desc:literal, $prefix:literal, $chunk:ident) => {
        paste! { // using the paste crate's macro for easy concatenation

            #[doc = "A " $desc " memory address, which is a `usize` under the hood."]
            #[derive(
                Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
                Binary, Octal, LowerHex, UpperHex,
            )]
            #[repr(transparent)]
            pub struct $TypeName(usize);

            impl $TypeName {
                #[doc = "Creates a new `" $TypeName "`, returning `None` if the address \
                    does not fit in the 32-bit address space."]
                pub const fn new(addr: usize) -> Option<$TypeName> {
                    if addr <= MAX_VIRTUAL_ADDRESS { Some($TypeName(addr)) } else { None }
                }

                #[doc = "Creates a new `" $TypeName "`, truncated to the 32-bit address space."]
                pub const fn new_canonical(addr: usize) -> $TypeName {
                    $TypeName(addr & MAX_VIRTUAL_ADDRESS)
                }

                #[doc = "Creates a new `" $TypeName "` with a value 0."]
                pub const fn zero() -> $TypeName {
                    $TypeName(0)
                }

                #[doc = "Returns the underlying `usize` value for this `" $TypeName "`."]
                #[inline]
                pub const fn value(&self) -> usize {
                    self.0
                }

                #[doc = "Returns the offset from the " $chunk " boundary specified by this `"
                    $TypeName "`, i.e., its least significant 12 bits."]
                pub const fn [<$chunk _offset>](&self) -> usize {
                    self.0 & (PAGE_SIZE - 1)
                }

                #[doc = "Returns the offset of this `" $TypeName "` within its 1 MiB section."]
                pub const fn section_offset(&self) -> usize {
                    self.0 & (SECTION_SIZE - 1)
                }

                #[doc = "Rounds this `" $TypeName "` down to the start of its " $chunk "."]
                pub const fn [<align_down_to_ $chunk>](&self) -> $TypeName {
                    $TypeName(self.0 & !(PAGE_SIZE - 1))
                }

                #[doc = "Rounds this `" $TypeName "` down to the start of its 1 MiB section."]
                pub const fn align_down_to_section(&self) -> $TypeName {
                    $TypeName(self.0 & !(SECTION_SIZE - 1))
                }
            }
            impl fmt::Debug for $TypeName {
                fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    write!(f, concat!($prefix, "{:#X}"), self.0)
                }
            }
            impl fmt::Display for $TypeName {
                fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    write!(f, "{:?}", self)
                }
            }
            impl fmt::Pointer for $TypeName {
                fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    write!(f, "{:?}", self)
                }
            }
            impl Add<usize> for $TypeName {
                type Output = $TypeName;
                fn add(self, rhs: usize) -> $TypeName {
                    $TypeName(core::cmp::min(self.0.saturating_add(rhs), MAX_VIRTUAL_ADDRESS))
                }
            }
            impl AddAssign<usize> for $TypeName {
                fn add_assign(&mut self, rhs: usize) {
                    *self = $TypeName(core::cmp::min(self.0.saturating_add(rhs), MAX_VIRTUAL_ADDRESS));
                }
            }
            impl Sub<usize> for $TypeName {
                type Output = $TypeName;
                fn sub(self, rhs: usize) -> $TypeName {
                    $TypeName::new_canonical(self.0.saturating_sub(rhs))
                }
            }
            impl SubAssign<usize> for $TypeName {
                fn sub_assign(&mut self, rhs: usize) {
                    *self = $TypeName::new_canonical(self.0.saturating_sub(rhs));
                }
            }

            #[allow(clippy::from_over_into)]
            impl Into<usize> for $TypeName {
                #[inline]
                fn into(self) -> usize {
                    self.0
                }
            }
        }
    };
}

implement_address!(VirtualAddress, "virtual", "v", page);
implement_address!(PhysicalAddress, "physical", "p", frame);
