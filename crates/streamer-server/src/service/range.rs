//! `Range` header resolution.
//!
//! Only single ranges of the `bytes` unit are understood. Anything the
//! resolver cannot honour degrades to the whole object rather than an error,
//! so clients never see a `416 Range Not Satisfiable`.

use streamer_storage::ByteRange;

const BYTES_UNIT: &str = "bytes=";

/// Outcome of resolving a `Range` header against an object size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    /// The interval to serve, `None` only for empty objects.
    pub range: Option<ByteRange>,
    /// Whether the header was absent, malformed or unsatisfiable.
    pub fallback: bool,
}

impl ResolvedRange {
    fn exact(range: ByteRange) -> Self {
        Self {
            range: Some(range),
            fallback: false,
        }
    }

    fn whole(size: u64) -> Self {
        Self {
            range: ByteRange::full(size),
            fallback: true,
        }
    }
}

/// Resolves a raw `Range` header value against an object of `size` bytes.
///
/// Accepted forms are `bytes=N-M`, `bytes=N-` and `bytes=-N`. Suffix lengths
/// larger than the object are clamped to it. Every other input, including an
/// empty header, yields the full object with `fallback` set.
pub fn resolve(range_header: &str, size: u64) -> ResolvedRange {
    match parse(range_header, size) {
        Some(range) => ResolvedRange::exact(range),
        None => ResolvedRange::whole(size),
    }
}

fn parse(range_header: &str, size: u64) -> Option<ByteRange> {
    let interval = range_header.strip_prefix(BYTES_UNIT)?;
    let (first, last) = interval.split_once('-')?;
    if last.contains('-') {
        return None;
    }

    let (start, end) = match (first.is_empty(), last.is_empty()) {
        (true, true) => return None,
        (true, false) => {
            let suffix = parse_offset(last)?.min(size);
            if suffix == 0 {
                return None;
            }
            (size - suffix, size - 1)
        }
        (false, true) => (parse_offset(first)?, size.checked_sub(1)?),
        (false, false) => (parse_offset(first)?, parse_offset(last)?),
    };

    ByteRange::new(start, end, size).ok()
}

/// Parses a plain run of ASCII digits; signs and whitespace are rejected.
fn parse_offset(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(resolved: ResolvedRange) -> (u64, u64, bool) {
        let range = resolved.range.expect("non-empty object has a range");
        (range.start(), range.end(), resolved.fallback)
    }

    #[test]
    fn empty_header_serves_whole_object() {
        assert_eq!(bounds(resolve("", 1000)), (0, 999, true));
    }

    #[test]
    fn explicit_range() {
        assert_eq!(bounds(resolve("bytes=100-199", 1000)), (100, 199, false));
    }

    #[test]
    fn open_ended_range() {
        assert_eq!(bounds(resolve("bytes=900-", 1000)), (900, 999, false));
    }

    #[test]
    fn suffix_range() {
        assert_eq!(bounds(resolve("bytes=-50", 1000)), (950, 999, false));
    }

    #[test]
    fn oversized_suffix_is_clamped() {
        assert_eq!(bounds(resolve("bytes=-5000", 1000)), (0, 999, false));
    }

    #[test]
    fn malformed_headers_fall_back() {
        for header in [
            "garbage",
            "bytes=",
            "bytes=-",
            "bytes=1-2-3",
            "bytes=abc-def",
            "items=0-10",
            "bytes=+1-5",
            "bytes= 1-5",
            "bytes=0-10,20-30",
        ] {
            assert_eq!(bounds(resolve(header, 1000)), (0, 999, true), "{header}");
        }
    }

    #[test]
    fn unsatisfiable_ranges_fall_back() {
        assert_eq!(bounds(resolve("bytes=10-5", 1000)), (0, 999, true));
        assert_eq!(bounds(resolve("bytes=10-2000", 1000)), (0, 999, true));
        assert_eq!(bounds(resolve("bytes=1000-", 1000)), (0, 999, true));
        assert_eq!(bounds(resolve("bytes=-0", 1000)), (0, 999, true));
    }

    #[test]
    fn single_byte_object() {
        assert_eq!(bounds(resolve("bytes=0-0", 1)), (0, 0, false));
        assert_eq!(bounds(resolve("bytes=-1", 1)), (0, 0, false));
        assert_eq!(bounds(resolve("", 1)), (0, 0, true));
    }

    #[test]
    fn last_byte_range() {
        assert_eq!(bounds(resolve("bytes=999-999", 1000)), (999, 999, false));
    }

    #[test]
    fn empty_object_has_no_range() {
        for header in ["", "bytes=0-0", "bytes=-10", "bytes=0-"] {
            let resolved = resolve(header, 0);
            assert_eq!(resolved.range, None);
            assert!(resolved.fallback);
        }
    }

    #[test]
    fn resolved_length_matches_bounds() {
        let range = resolve("bytes=100-199", 1000).range.unwrap();
        assert_eq!(range.len(), 100);
        assert_eq!(range.content_range(1000), "bytes 100-199/1000");
    }
}
