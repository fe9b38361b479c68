use std::alloc::{self, Layout};
use std::fmt;
use std::ptr::NonNull;

use bumpalo::Bump;

use crate::core::ColumnError;

/// Caller-supplied allocator for column buffers.
///
/// Columns only ever request `n * 8` bytes aligned to 8, and hand every block
/// back with the same layout it was allocated with.
pub trait MemoryResource {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ColumnError>;

    /// # Safety
    ///
    /// `ptr` must come from `allocate` on this resource with the same `layout`,
    /// and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// The process allocator, used by columns constructed without a resource.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalResource;

impl MemoryResource for GlobalResource {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ColumnError> {
        debug_assert!(layout.size() > 0);
        // SAFETY: column layouts are never zero-sized.
        let ptr = unsafe { alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(ColumnError::AllocationFailed {
            bytes: layout.size(),
            align: layout.align(),
        })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded to the caller.
        unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

/// Monotonic resource: allocations are bump-pointer, deallocation is a no-op
/// and memory is released when the resource itself is dropped.
#[derive(Default)]
pub struct BumpResource {
    bump: Bump,
}

impl BumpResource {
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bump: Bump::with_capacity(bytes),
        }
    }

    /// Bytes currently held in the resource's chunks.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }
}

impl fmt::Debug for BumpResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BumpResource")
            .field("allocated_bytes", &self.allocated_bytes())
            .finish()
    }
}

impl MemoryResource for BumpResource {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, ColumnError> {
        self.bump
            .try_alloc_layout(layout)
            .map_err(|_| ColumnError::AllocationFailed {
                bytes: layout.size(),
                align: layout.align(),
            })
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {}
}
