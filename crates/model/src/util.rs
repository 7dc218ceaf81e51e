use std::ops::{Bound, RangeBounds};

/// The `(from, to)` offsets of a range, with open ends at 0 and `size`
pub(crate) fn bounds<R: RangeBounds<usize>>(range: &R, size: usize) -> (usize, usize) {
    let from = match range.start_bound() {
        Bound::Unbounded => 0,
        Bound::Included(&x) => x,
        Bound::Excluded(&x) => x + 1,
    };
    let to = match range.end_bound() {
        Bound::Unbounded => size,
        Bound::Included(&x) => x + 1,
        Bound::Excluded(&x) => x,
    };
    (from, to)
}

/// Byte offset of the UTF-16 offset `units` in `text`, clamped to its end.
/// An offset inside a surrogate pair maps to the start of that character.
fn byte_offset(text: &str, mut units: usize) -> usize {
    for (i, c) in text.char_indices() {
        let width = c.len_utf16();
        if width > units {
            return i;
        }
        units -= width;
    }
    text.len()
}

/// Whether the UTF-16 offset `units` lies between two characters of `text`
pub(crate) fn is_utf16_boundary(text: &str, mut units: usize) -> bool {
    for c in text.chars() {
        if units == 0 {
            return true;
        }
        units = match units.checked_sub(c.len_utf16()) {
            Some(rest) => rest,
            None => return false,
        };
    }
    units == 0
}

/// The part of `text` between two UTF-16 offsets
pub(crate) fn slice_utf16(text: &str, from: usize, to: usize) -> &str {
    let start = byte_offset(text, from);
    let rest = &text[start..];
    &rest[..byte_offset(rest, to.saturating_sub(from))]
}

#[cfg(test)]
mod tests {
    use super::{bounds, is_utf16_boundary, slice_utf16};

    #[test]
    fn resolves_range_bounds() {
        assert_eq!(bounds(&(2..5), 10), (2, 5));
        assert_eq!(bounds(&(..=3), 10), (0, 4));
        assert_eq!(bounds(&(4..), 10), (4, 10));
    }

    #[test]
    fn slices_by_utf16_units() {
        assert_eq!(slice_utf16("abc", 1, 3), "bc");
        assert_eq!(slice_utf16("a\u{1F60A}b", 1, 3), "\u{1F60A}");
        assert_eq!(slice_utf16("ab", 1, 5), "b");
        assert_eq!(slice_utf16("ab", 3, 5), "");
    }

    #[test]
    fn slices_before_a_broken_surrogate_pair() {
        assert_eq!(slice_utf16("a\u{1F60A}b", 0, 2), "a");
        assert_eq!(slice_utf16("a\u{1F60A}b", 2, 5), "\u{1F60A}b");
    }

    #[test]
    fn finds_character_boundaries() {
        let text = "a\u{1F60A}b";
        let boundaries: Vec<_> = (0..=5).map(|u| is_utf16_boundary(text, u)).collect();
        assert_eq!(boundaries, [true, true, false, true, true, false]);
    }
}
