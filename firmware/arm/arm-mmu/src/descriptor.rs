//! # Architecture-Neutral Descriptors
//!
//! Tables store raw descriptor words ([`RawDescriptor`]); the
//! [architecture profile](crate::arch::Architecture) decodes them into a
//! [`DescriptorEntry`] and back.

use crate::addresses::PhysicalAddress;
use core::fmt;

/// Storage word of a translation table entry.
pub trait RawDescriptor: Copy + Default + Eq + fmt::Debug {
    /// Size of one descriptor in bytes.
    const BYTES: usize;

    /// The all-zero (invalid) descriptor.
    const INVALID: Self;

    fn to_u64(self) -> u64;
}

impl RawDescriptor for u64 {
    const BYTES: usize = 8;
    const INVALID: Self = 0;

    #[inline]
    fn to_u64(self) -> u64 {
        self
    }
}

impl RawDescriptor for u32 {
    const BYTES: usize = 4;
    const INVALID: Self = 0;

    #[inline]
    fn to_u64(self) -> u64 {
        u64::from(self)
    }
}

/// Protection a table descriptor imposes on everything below it.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[allow(clippy::struct_excessive_bools)]
pub struct TableProtection {
    /// Unprivileged execution is forbidden (`XNTable`).
    pub execute_never: bool,
    /// Privileged execution is forbidden (`PXNTable`).
    pub privileged_execute_never: bool,
    /// Subsequent lookups are non-secure (`NSTable`).
    pub non_secure: bool,
}

impl TableProtection {
    pub const NONE: Self = Self {
        execute_never: false,
        privileged_execute_never: false,
        non_secure: false,
    };

    /// Protection accumulated through two nested tables.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            execute_never: self.execute_never || other.execute_never,
            privileged_execute_never: self.privileged_execute_never
                || other.privileged_execute_never,
            non_secure: self.non_secure || other.non_secure,
        }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        !(self.execute_never || self.privileged_execute_never || self.non_secure)
    }
}

/// Decoded view of one table entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DescriptorEntry<T> {
    /// Faults on access.
    Invalid,
    /// Points to a finer table.
    Table {
        address: PhysicalAddress,
        protection: TableProtection,
    },
    /// Maps a block (or, at the leaf level, a page) of memory.
    Block {
        address: PhysicalAddress,
        attributes: T,
    },
}

impl<T> DescriptorEntry<T> {
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid)
    }

    #[must_use]
    pub const fn is_table(&self) -> bool {
        matches!(self, Self::Table { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_accumulates_protection() {
        let xn = TableProtection {
            execute_never: true,
            ..TableProtection::NONE
        };
        let ns = TableProtection {
            non_secure: true,
            ..TableProtection::NONE
        };
        let both = xn.union(ns);
        assert!(both.execute_never && both.non_secure && !both.privileged_execute_never);
        assert!(TableProtection::NONE.is_empty());
        assert!(!both.is_empty());
    }
}
