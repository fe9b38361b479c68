use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;
use std::ptr::NonNull;

use bumpalo::Bump;

use crate::core::ColumnError;

use super::cell::STRING_ALIGN;

/// Bytes reserved in front of every string; the length word sits at its end.
const PREFIX: usize = STRING_ALIGN;

const _: () = assert!(size_of::<usize>() <= PREFIX);

/// Backing store for strings too long to live inside a cell.
///
/// Every string is written in the length-prefix convention:
///
/// ```text
/// [padding: 8 - size_of::<usize>()][len: usize, native endian][bytes: [u8; len]]
/// ^ 8-aligned                                                  ^ 8-aligned
/// ```
///
/// Strings are never freed individually; the arena releases everything when it
/// drops, so it must outlive every column cell that points into it.
#[derive(Default)]
pub struct StringArena {
    bump: Bump,
}

impl StringArena {
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bump: Bump::with_capacity(bytes),
        }
    }

    /// Copy `value` into the arena.
    pub fn alloc(&self, value: impl AsRef<[u8]>) -> Result<ArenaStr<'_>, ColumnError> {
        let value = value.as_ref();
        let size = PREFIX
            .checked_add(value.len())
            .ok_or(ColumnError::AllocationFailed {
                bytes: usize::MAX,
                align: STRING_ALIGN,
            })?;
        let layout = Layout::from_size_align(size, STRING_ALIGN).map_err(|_| {
            ColumnError::AllocationFailed {
                bytes: size,
                align: STRING_ALIGN,
            }
        })?;
        let base = self
            .bump
            .try_alloc_layout(layout)
            .map_err(|_| ColumnError::AllocationFailed {
                bytes: size,
                align: STRING_ALIGN,
            })?;

        // SAFETY: `base` points to `size` writable bytes aligned to 8; the length
        // word ends exactly at `base + PREFIX`, which is where the string starts.
        let data = unsafe {
            let data = base.as_ptr().add(PREFIX);
            data.sub(size_of::<usize>())
                .cast::<usize>()
                .write(value.len());
            std::ptr::copy_nonoverlapping(value.as_ptr(), data, value.len());
            NonNull::new_unchecked(data)
        };

        Ok(ArenaStr {
            data,
            len: value.len(),
            _arena: PhantomData,
        })
    }

    /// Bytes currently held in the arena's chunks.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }
}

impl fmt::Debug for StringArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringArena")
            .field("allocated_bytes", &self.allocated_bytes())
            .finish()
    }
}

/// A length-prefixed string living in a [`StringArena`].
#[derive(Clone, Copy)]
pub struct ArenaStr<'a> {
    data: NonNull<u8>,
    len: usize,
    _arena: PhantomData<&'a [u8]>,
}

impl<'a> ArenaStr<'a> {
    /// Pointer to the first string byte, 8-aligned, preceded by the length word.
    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        // SAFETY: the arena keeps `len` initialised bytes alive for `'a`.
        unsafe { std::slice::from_raw_parts(self.data.as_ptr(), self.len) }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for ArenaStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ArenaStr")
            .field(&String::from_utf8_lossy(self.as_bytes()))
            .finish()
    }
}
