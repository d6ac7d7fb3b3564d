use crate::addresses::PhysicalAddress;
use crate::descriptor::RawDescriptor;

/// Makes physical table memory writable from the running code.
///
/// Firmware runs identity mapped (or with translation off), so
/// [`IdentityMapper`] is the usual choice. Host-side tools and tests back
/// "physical" memory with ordinary buffers instead.
pub trait PhysMapper {
    /// Borrow `entries` descriptors starting at physical address `at`.
    ///
    /// # Safety
    /// - `[at, at + entries * D::BYTES)` must be memory this builder
    ///   allocated for a table, aligned for `D`, and writable.
    /// - No other reference to the range may be alive for `'a`.
    unsafe fn table_mut<'a, D: RawDescriptor>(&self, at: PhysicalAddress, entries: usize) -> &'a mut [D];
}

/// Physical addresses are usable as pointers unchanged.
#[derive(Debug)]
pub struct IdentityMapper(());

impl IdentityMapper {
    /// # Safety
    /// Every table address handed to [`PhysMapper::table_mut`] must be
    /// identity mapped (or translation must be off).
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self(())
    }
}

impl PhysMapper for IdentityMapper {
    #[allow(clippy::cast_possible_truncation)]
    unsafe fn table_mut<'a, D: RawDescriptor>(&self, at: PhysicalAddress, entries: usize) -> &'a mut [D] {
        unsafe { core::slice::from_raw_parts_mut(at.as_u64() as usize as *mut D, entries) }
    }
}
