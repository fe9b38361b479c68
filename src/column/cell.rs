use std::fmt;
use std::mem::size_of;

use bytemuck::{Pod, Zeroable};

use crate::core::Kind;

use super::value::Value;

/// Bits of the tag byte holding the inline string length.
pub const SSO_MASK: u8 = 0b111;
/// Longest string stored inside a cell.
pub const SSO_CAPACITY: usize = 6;
/// Alignment required of out-of-line string pointers, so the tag bits read as zero.
pub const STRING_ALIGN: usize = 8;

pub const INT_NULL: i64 = i64::MIN;
pub const FLOAT_NULL: f64 = f64::MIN;

// The tag byte is the least significant byte of the pointer overlay.
#[cfg(target_endian = "little")]
const TAG_BYTE: usize = 0;
#[cfg(target_endian = "little")]
const INLINE_START: usize = 1;
#[cfg(target_endian = "big")]
const TAG_BYTE: usize = 7;
#[cfg(target_endian = "big")]
const INLINE_START: usize = 0;

/// A single 8-byte slot of a column.
///
/// The same bytes are read as an `i64`, an `f64`, or a string depending on the
/// [`Kind`] of the owning column; a cell does not know its own kind. Nulls are
/// in-band sentinels:
///
/// ```text
/// int     i64::MIN
/// float   f64::MIN  (the most negative finite value, not -inf or NaN)
/// string  all bytes zero
/// ```
///
/// String cells use the low three bits of the tag byte (byte 0 on
/// little-endian, byte 7 on big-endian) as a self-tag. Non-zero bits are the
/// length (1..=6) of an inline string held in the other seven bytes; zero bits
/// mean the cell holds a pointer to out-of-line bytes that are preceded by a
/// native-endian `usize` length. Cells never own those bytes.
#[derive(Clone, Copy, Pod, Zeroable, PartialEq, Eq, Hash)]
#[repr(C, align(8))]
pub struct Cell {
    bytes: [u8; 8],
}

const _: () = assert!(size_of::<Cell>() == 8);
const _: () = assert!(std::mem::align_of::<Cell>() == 8);

impl Cell {
    /// The canonical null, valid for every kind.
    pub const fn null() -> Cell {
        Cell { bytes: [0; 8] }
    }

    pub fn from_int(value: Option<i64>) -> Cell {
        Cell {
            bytes: value.unwrap_or(INT_NULL).to_ne_bytes(),
        }
    }

    pub fn from_float(value: Option<f64>) -> Cell {
        Cell {
            bytes: value.unwrap_or(FLOAT_NULL).to_ne_bytes(),
        }
    }

    /// Store `value` inline if it is 1..=6 bytes long. Empty and oversized
    /// strings both yield the null cell; oversized strings belong in an arena
    /// (see [`Cell::try_from_char`]).
    pub fn try_from_string(value: impl AsRef<[u8]>) -> Cell {
        let value = value.as_ref();
        if value.is_empty() || value.len() > SSO_CAPACITY {
            return Cell::null();
        }
        let mut cell = Cell::null();
        cell.bytes[TAG_BYTE] = value.len() as u8;
        cell.bytes[INLINE_START..INLINE_START + value.len()].copy_from_slice(value);
        cell
    }

    /// Wrap a pointer to out-of-line string bytes.
    ///
    /// # Safety
    ///
    /// `ptr` is null, or it is aligned to [`STRING_ALIGN`], is immediately
    /// preceded by a native-endian `usize` length, and the length plus bytes
    /// stay valid and unmodified for as long as the cell is read as a string.
    pub unsafe fn try_from_char(ptr: *const u8) -> Cell {
        debug_assert_eq!(
            ptr as usize % STRING_ALIGN,
            0,
            "out-of-line string pointer must be {STRING_ALIGN}-byte aligned"
        );
        Cell {
            bytes: (ptr as usize as u64).to_ne_bytes(),
        }
    }

    /// Reinterpret raw bytes produced by [`Cell::to_bytes`] on a machine of the same endianness.
    pub fn from_bytes(bytes: [u8; 8]) -> Cell {
        Cell { bytes }
    }

    pub fn to_bytes(self) -> [u8; 8] {
        self.bytes
    }

    /// The integer overlay.
    pub fn int(&self) -> i64 {
        i64::from_ne_bytes(self.bytes)
    }

    /// The float overlay.
    pub fn float(&self) -> f64 {
        f64::from_ne_bytes(self.bytes)
    }

    /// The pointer overlay. Only meaningful when [`Cell::inline_len`] is zero.
    pub fn ptr(&self) -> *const u8 {
        u64::from_ne_bytes(self.bytes) as usize as *const u8
    }

    pub fn tag(&self) -> u8 {
        self.bytes[TAG_BYTE]
    }

    pub fn inline_len(&self) -> usize {
        (self.tag() & SSO_MASK) as usize
    }

    pub fn is_int_null(&self) -> bool {
        self.int() == INT_NULL
    }

    pub fn is_float_null(&self) -> bool {
        self.float() == FLOAT_NULL
    }

    pub fn is_string_null(&self) -> bool {
        u64::from_ne_bytes(self.bytes) == 0
    }

    /// True for a non-null string cell in pointer form.
    pub fn is_out_of_line(&self) -> bool {
        self.inline_len() == 0 && !self.is_string_null()
    }

    /// True for an inline string reachable through [`Cell::try_from_string`]:
    /// length 1..=6 and the high five tag bits clear.
    pub fn is_valid_inline(&self) -> bool {
        let tag = self.tag();
        tag & !SSO_MASK == 0 && (1..=SSO_CAPACITY).contains(&self.inline_len())
    }

    /// The inline string bytes, or `None` for null and pointer-form cells.
    pub fn inline_bytes(&self) -> Option<&[u8]> {
        let len = self.inline_len();
        if len == 0 {
            return None;
        }
        debug_assert_eq!(self.tag() & !SSO_MASK, 0, "reserved SSO tag bits are set");
        Some(&self.bytes[INLINE_START..INLINE_START + len])
    }

    /// Reconstruct the string bytes of a string cell. Null yields an empty view.
    ///
    /// # Safety
    ///
    /// If the cell is in pointer form, the contract of [`Cell::try_from_char`]
    /// must still hold. The returned view borrows the cell but points into the
    /// external buffer, which must outlive it.
    pub unsafe fn string_view(&self) -> &[u8] {
        if let Some(inline) = self.inline_bytes() {
            return inline;
        }
        let ptr = self.ptr();
        if ptr.is_null() {
            return &[];
        }
        // SAFETY: the caller guarantees a live, aligned length word precedes `ptr`.
        unsafe {
            let len = ptr.sub(size_of::<usize>()).cast::<usize>().read();
            std::slice::from_raw_parts(ptr, len)
        }
    }

    /// Project the cell into a [`Value`] according to `kind`.
    ///
    /// # Safety
    ///
    /// Same as [`Cell::string_view`] when `kind` is [`Kind::String`].
    pub unsafe fn to_value(&self, kind: Kind) -> Value<'_> {
        match kind {
            Kind::Int if self.is_int_null() => Value::Null,
            Kind::Int => Value::Int(self.int()),
            Kind::Float if self.is_float_null() => Value::Null,
            Kind::Float => Value::Float(self.float()),
            Kind::String if self.is_string_null() => Value::Null,
            // SAFETY: forwarded to the caller.
            Kind::String => Value::Str(unsafe { self.string_view() }),
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::null()
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cell")
            .field(&format_args!("{:#018x}", u64::from_ne_bytes(self.bytes)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// An 8-aligned buffer holding `s` in the length-prefix convention.
    fn prefixed(s: &[u8]) -> Vec<u64> {
        let mut words = vec![0u64; 1 + s.len().div_ceil(8)];
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut words);
        bytes[8 - size_of::<usize>()..8].copy_from_slice(&s.len().to_ne_bytes());
        bytes[8..8 + s.len()].copy_from_slice(s);
        words
    }

    #[test]
    fn test_null_for_every_kind() {
        let cell = Cell::null();
        assert_eq!(cell.to_bytes(), [0; 8]);
        assert_eq!(unsafe { cell.to_value(Kind::String) }, Value::Null);
        assert!(cell.is_string_null());
        // zero is a legitimate int and float
        assert_eq!(unsafe { cell.to_value(Kind::Int) }, Value::Int(0));
        assert_eq!(unsafe { cell.to_value(Kind::Float) }, Value::Float(0.0));
    }

    #[test]
    fn test_int_sentinel() {
        assert!(Cell::from_int(None).is_int_null());
        assert!(Cell::from_int(Some(i64::MIN)).is_int_null());
        assert!(!Cell::from_int(Some(i64::MIN + 1)).is_int_null());
        let cell = Cell::from_int(Some(-1));
        assert_eq!(unsafe { cell.to_value(Kind::Int) }, Value::Int(-1));
    }

    #[test]
    fn test_float_sentinel_is_lowest_not_infinity() {
        assert!(Cell::from_float(None).is_float_null());
        assert!(Cell::from_float(Some(f64::MIN)).is_float_null());
        assert!(!Cell::from_float(Some(f64::NEG_INFINITY)).is_float_null());
        let cell = Cell::from_float(Some(f64::NEG_INFINITY));
        assert_eq!(
            unsafe { cell.to_value(Kind::Float) },
            Value::Float(f64::NEG_INFINITY)
        );
    }

    #[test]
    fn test_nan_preserved_bitwise() {
        let nan = f64::from_bits(0x7ff8_0000_dead_beef);
        let cell = Cell::from_float(Some(nan));
        match unsafe { cell.to_value(Kind::Float) } {
            Value::Float(v) => assert_eq!(v.to_bits(), nan.to_bits()),
            other => panic!("expected float, got {other:?}"),
        }
    }

    #[test]
    fn test_sso_boundaries() {
        let one = Cell::try_from_string("a");
        assert_eq!(one.inline_len(), 1);
        assert_eq!(one.inline_bytes(), Some(&b"a"[..]));

        let six = Cell::try_from_string("abcdef");
        assert_eq!(six.inline_len(), 6);
        assert!(six.is_valid_inline());
        assert_eq!(unsafe { six.string_view() }, b"abcdef");

        assert_eq!(Cell::try_from_string("abcdefg"), Cell::null());
        assert_eq!(Cell::try_from_string(""), Cell::null());
        let empty = Cell::try_from_string("");
        assert_eq!(unsafe { empty.to_value(Kind::String) }, Value::Null);
    }

    #[cfg(target_endian = "little")]
    #[test]
    fn test_sso_layout_little_endian() {
        let cell = Cell::try_from_string("hi");
        assert_eq!(cell.to_bytes(), [2, b'h', b'i', 0, 0, 0, 0, 0]);
    }

    #[cfg(target_endian = "big")]
    #[test]
    fn test_sso_layout_big_endian() {
        let cell = Cell::try_from_string("hi");
        assert_eq!(cell.to_bytes(), [b'h', b'i', 0, 0, 0, 0, 0, 2]);
    }

    #[test]
    fn test_sso_decode_from_raw_bytes() {
        let mut bytes = [0u8; 8];
        bytes[TAG_BYTE] = 2;
        bytes[INLINE_START] = b'h';
        bytes[INLINE_START + 1] = b'i';
        let cell = Cell::from_bytes(bytes);
        assert_eq!(unsafe { cell.string_view() }, b"hi");
    }

    #[test]
    fn test_reserved_tag_bits_rejected() {
        let mut bytes = Cell::try_from_string("abc").to_bytes();
        bytes[TAG_BYTE] |= 0b1000;
        assert!(!Cell::from_bytes(bytes).is_valid_inline());

        let mut bytes = [0u8; 8];
        bytes[TAG_BYTE] = 7;
        assert!(!Cell::from_bytes(bytes).is_valid_inline());
    }

    #[test]
    fn test_long_string_through_pointer() {
        let buffer = prefixed(b"hello, world!");
        let bytes: &[u8] = bytemuck::cast_slice(&buffer);
        let cell = unsafe { Cell::try_from_char(bytes.as_ptr().add(8)) };

        assert!(cell.is_out_of_line());
        assert_eq!(cell.inline_len(), 0);
        assert_eq!(unsafe { cell.string_view() }, b"hello, world!");
        assert_eq!(
            unsafe { cell.to_value(Kind::String) },
            Value::Str(b"hello, world!")
        );
    }

    #[test]
    fn test_null_pointer_is_null_string() {
        let cell = unsafe { Cell::try_from_char(std::ptr::null()) };
        assert!(cell.is_string_null());
        assert_eq!(unsafe { cell.string_view() }, b"");
    }
}
