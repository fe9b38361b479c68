use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::mem::{align_of, size_of};
use std::ops::Index;
use std::ptr::{self, NonNull};

use log::debug;

use crate::core::{ColumnError, Kind};

use super::arena::{ArenaStr, StringArena};
use super::cell::Cell;
use super::resource::{GlobalResource, MemoryResource};
use super::value::Value;

/// Growable dense array of [`Cell`]s of a single [`Kind`].
///
/// The column owns its cell buffer and releases it through the resource that
/// allocated it. It does not own out-of-line string bytes: those live in a
/// [`StringArena`] (or other buffer) borrowed for `'a`, the same lifetime the
/// optional [`MemoryResource`] is borrowed for.
///
/// Growing the column moves the buffer, so references into it are invalidated
/// by `reserve` and `resize`.
pub struct Column<'a> {
    kind: Kind,
    res: Option<&'a dyn MemoryResource>,
    data: Option<NonNull<Cell>>,
    size: u32,
    reserved: u32,
    _strings: PhantomData<&'a [u8]>,
}

impl<'a> Column<'a> {
    /// A column backed by the process allocator.
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            res: None,
            data: None,
            size: 0,
            reserved: 0,
            _strings: PhantomData,
        }
    }

    /// A column whose buffer is allocated from `res`.
    pub fn with_resource(kind: Kind, res: &'a dyn MemoryResource) -> Self {
        Self {
            kind,
            res: Some(res),
            data: None,
            size: 0,
            reserved: 0,
            _strings: PhantomData,
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn resource(&self) -> Option<&'a dyn MemoryResource> {
        self.res
    }

    pub fn len(&self) -> u32 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of cells with provisioned storage. Never decreases.
    pub fn capacity(&self) -> u32 {
        self.reserved
    }

    /// Raw pointer to the first cell, null until the first allocation.
    pub fn as_ptr(&self) -> *const Cell {
        self.base()
    }

    pub fn as_slice(&self) -> &[Cell] {
        match self.data {
            // SAFETY: the first `size` cells are initialised.
            Some(data) => unsafe { std::slice::from_raw_parts(data.as_ptr(), self.size as usize) },
            None => &[],
        }
    }

    /// The valid cells as raw native-endian bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }

    pub fn front(&self) -> Option<&Cell> {
        self.as_slice().first()
    }

    pub fn back(&self) -> Option<&Cell> {
        self.as_slice().last()
    }

    pub fn at(&self, pos: u32) -> Result<&Cell, ColumnError> {
        self.as_slice().get(pos as usize).ok_or(ColumnError::OutOfRange {
            pos,
            size: self.size,
        })
    }

    /// # Safety
    ///
    /// `pos` must be below [`Column::len`].
    pub unsafe fn get_unchecked(&self, pos: u32) -> &Cell {
        debug_assert!(pos < self.size, "unchecked access at {pos} past size {}", self.size);
        // SAFETY: forwarded to the caller.
        unsafe { &*self.base().add(pos as usize) }
    }

    /// # Safety
    ///
    /// `pos` must be below [`Column::len`], and whatever is written through the
    /// reference must be valid for the column's kind: for string columns an
    /// out-of-line cell must honour the contract of [`Cell::try_from_char`] for `'a`.
    pub unsafe fn get_unchecked_mut(&mut self, pos: u32) -> &mut Cell {
        debug_assert!(pos < self.size, "unchecked access at {pos} past size {}", self.size);
        // SAFETY: forwarded to the caller.
        unsafe { &mut *self.base().add(pos as usize) }
    }

    /// Bounds-checked read projected through the column's kind.
    pub fn get(&self, pos: u32) -> Result<Value<'_>, ColumnError> {
        let cell = self.at(pos)?;
        // SAFETY: string cells only enter the column as null, inline, or through
        // `set_arena_str`/`set_unchecked`, whose bytes outlive `'a`.
        Ok(unsafe { cell.to_value(self.kind) })
    }

    pub fn values(&self) -> impl Iterator<Item = Value<'_>> + '_ {
        let kind = self.kind;
        self.as_slice()
            .iter()
            // SAFETY: see `get`.
            .map(move |cell| unsafe { cell.to_value(kind) })
    }

    /// Bounds-checked write of a raw cell.
    ///
    /// # Panics
    ///
    /// On a string column, if `cell` is neither null nor a valid inline string.
    /// Out-of-line strings go through [`Column::set_arena_str`].
    pub fn set(&mut self, pos: u32, cell: Cell) -> Result<(), ColumnError> {
        self.check_writable(&cell);
        *self.slot_mut(pos)? = cell;
        Ok(())
    }

    /// # Safety
    ///
    /// Same as [`Column::get_unchecked_mut`].
    pub unsafe fn set_unchecked(&mut self, pos: u32, cell: Cell) {
        // SAFETY: forwarded to the caller.
        unsafe { *self.get_unchecked_mut(pos) = cell }
    }

    pub fn set_null(&mut self, pos: u32) -> Result<(), ColumnError> {
        let null = match self.kind {
            Kind::Int => Cell::from_int(None),
            Kind::Float => Cell::from_float(None),
            Kind::String => Cell::null(),
        };
        self.set(pos, null)
    }

    pub fn set_int(&mut self, pos: u32, value: Option<i64>) -> Result<(), ColumnError> {
        debug_assert_eq!(self.kind, Kind::Int);
        self.set(pos, Cell::from_int(value))
    }

    pub fn set_float(&mut self, pos: u32, value: Option<f64>) -> Result<(), ColumnError> {
        debug_assert_eq!(self.kind, Kind::Float);
        self.set(pos, Cell::from_float(value))
    }

    /// Store a string inline. Returns `false` (and stores null) when it is empty
    /// or longer than six bytes.
    pub fn set_inline_str(
        &mut self,
        pos: u32,
        value: impl AsRef<[u8]>,
    ) -> Result<bool, ColumnError> {
        debug_assert_eq!(self.kind, Kind::String);
        let cell = Cell::try_from_string(value);
        self.set(pos, cell)?;
        Ok(!cell.is_string_null())
    }

    /// Point a cell at a string held in an arena that outlives the column.
    ///
    /// # Panics
    ///
    /// If the column is not a string column.
    pub fn set_arena_str(&mut self, pos: u32, value: ArenaStr<'a>) -> Result<(), ColumnError> {
        assert_eq!(
            self.kind,
            Kind::String,
            "arena strings can only be stored in a string column"
        );
        let slot = self.slot_mut(pos)?;
        // SAFETY: arena strings are 8-aligned, length-prefixed, and live for `'a`.
        *slot = unsafe { Cell::try_from_char(value.as_ptr()) };
        Ok(())
    }

    /// Store a string inline when it fits, otherwise copy it into `arena`.
    /// Empty strings are stored as null.
    pub fn set_string(
        &mut self,
        pos: u32,
        value: impl AsRef<[u8]>,
        arena: &'a StringArena,
    ) -> Result<(), ColumnError> {
        let value = value.as_ref();
        if value.len() <= super::cell::SSO_CAPACITY {
            self.set_inline_str(pos, value)?;
            return Ok(());
        }
        // Fail on the index before spending arena space.
        self.at(pos)?;
        let stored = arena.alloc(value)?;
        self.set_arena_str(pos, stored)
    }

    /// Ensure storage for at least `count` cells, allocating exactly `count`
    /// when growing. Never shrinks. On failure the column is unchanged.
    pub fn reserve(&mut self, count: u32) -> Result<(), ColumnError> {
        if count <= self.reserved {
            return Ok(());
        }
        let new_data = self.alloc(count)?;
        if let Some(old) = self.data {
            // SAFETY: both buffers hold at least `size` cells and do not overlap;
            // `old` was allocated with `reserved` cells by the same resource.
            unsafe {
                ptr::copy_nonoverlapping(old.as_ptr(), new_data.as_ptr(), self.size as usize);
                self.dealloc(old, self.reserved);
            }
        }
        debug!(
            "{} column regrown: {} -> {} cells ({} in use)",
            self.kind, self.reserved, count, self.size
        );
        self.data = Some(new_data);
        self.reserved = count;
        Ok(())
    }

    /// Resize to `count` cells, filling new cells with null.
    pub fn resize(&mut self, count: u32) -> Result<(), ColumnError> {
        self.resize_with(count, Cell::null())
    }

    /// Resize to `count` cells, filling new cells with `fill`. Shrinking only
    /// truncates; capacity is kept.
    ///
    /// # Panics
    ///
    /// When growing a string column with a `fill` that [`Column::set`] would reject.
    pub fn resize_with(&mut self, count: u32, fill: Cell) -> Result<(), ColumnError> {
        if count > self.size {
            self.check_writable(&fill);
            self.auto_reserve(count)?;
            let base = self.base();
            for pos in self.size..count {
                // SAFETY: `auto_reserve` provisioned at least `count` cells.
                unsafe { base.add(pos as usize).write(fill) };
            }
        }
        self.size = count;
        Ok(())
    }

    fn auto_reserve(&mut self, count: u32) -> Result<(), ColumnError> {
        if count <= self.reserved {
            return Ok(());
        }
        let step = growth_step(count);
        let target = (count - self.reserved)
            .div_ceil(step)
            .checked_mul(step)
            .and_then(|grow| self.reserved.checked_add(grow))
            .unwrap_or(count);
        self.reserve(target)
    }

    fn check_writable(&self, cell: &Cell) {
        if self.kind == Kind::String {
            assert!(
                cell.is_string_null() || cell.is_valid_inline(),
                "{cell:?} is not a null or inline string cell"
            );
        }
    }

    fn slot_mut(&mut self, pos: u32) -> Result<&mut Cell, ColumnError> {
        if pos >= self.size {
            return Err(ColumnError::OutOfRange {
                pos,
                size: self.size,
            });
        }
        // SAFETY: bounds checked above.
        Ok(unsafe { &mut *self.base().add(pos as usize) })
    }

    fn base(&self) -> *mut Cell {
        self.data.map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    fn allocator(&self) -> &'a dyn MemoryResource {
        self.res.unwrap_or(&GlobalResource)
    }

    fn alloc(&self, count: u32) -> Result<NonNull<Cell>, ColumnError> {
        debug_assert!(count > 0);
        let layout = Layout::array::<Cell>(count as usize)
            .map_err(|_| ColumnError::CapacityOverflow(count))?;
        Ok(self.allocator().allocate(layout)?.cast())
    }

    /// # Safety
    ///
    /// `ptr` must have been returned by `alloc(count)` on this column.
    unsafe fn dealloc(&self, ptr: NonNull<Cell>, count: u32) {
        debug_assert!(count > 0);
        // SAFETY: the same layout was validated when the block was allocated.
        unsafe {
            let layout = Layout::from_size_align_unchecked(
                count as usize * size_of::<Cell>(),
                align_of::<Cell>(),
            );
            self.allocator().deallocate(ptr.cast(), layout);
        }
    }
}

/// Capacity added per regrowth when a column must hold `count` cells:
/// `1 << max(3, bit_width(count) - 2)`.
pub(crate) fn growth_step(count: u32) -> u32 {
    let width = u32::BITS - count.leading_zeros();
    1 << width.saturating_sub(2).max(3)
}

impl Index<u32> for Column<'_> {
    type Output = Cell;

    fn index(&self, pos: u32) -> &Cell {
        debug_assert!(pos < self.size, "index {pos} past size {}", self.size);
        &self.as_slice()[pos as usize]
    }
}

impl Drop for Column<'_> {
    fn drop(&mut self) {
        if let Some(data) = self.data.take() {
            // SAFETY: `data` holds `reserved` cells from this column's allocator.
            unsafe { self.dealloc(data, self.reserved) };
        }
    }
}

impl fmt::Debug for Column<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("kind", &self.kind)
            .field("size", &self.size)
            .field("reserved", &self.reserved)
            .field("resource", &self.res.is_some())
            .finish()
    }
}
