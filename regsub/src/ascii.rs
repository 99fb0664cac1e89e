//! Byte scanning helpers.

/// Search for the first occurrence of a byte in a haystack.
///
/// This is semantically the same as
/// `haystack.iter().position(|&b| b == needle)`, but uses vectorized search
/// with the `perf-find` feature.
#[cfg_attr(feature = "perf-find", inline)]
pub(crate) fn find_byte(haystack: &[u8], needle: u8) -> Option<usize> {
    #[cfg(not(feature = "perf-find"))]
    return haystack.iter().position(|&b| b == needle);
    #[cfg(feature = "perf-find")]
    // sse2/avx2 on x86_64
    memchr::memchr(needle, haystack)
}

#[cfg(feature = "host")]
/// The bytes before the first NUL, i.e. what a C string view of `s` sees.
pub(crate) fn until_nul(s: &[u8]) -> &[u8] {
    match find_byte(s, 0) {
        Some(i) => &s[..i],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find() {
        assert_eq!(find_byte(b"the quick brown fox", b'q'), Some(4));
        assert_eq!(find_byte(b"", b'q'), None);
        assert_eq!(find_byte(b"100%", b'%'), Some(3));
        assert_eq!(find_byte(b"<%1>", b'%'), Some(1));
    }

    #[cfg(feature = "host")]
    #[test]
    fn nul() {
        assert_eq!(until_nul(b"abc\0def"), b"abc");
        assert_eq!(until_nul(b"abc"), b"abc");
        assert_eq!(until_nul(b"\0"), b"");
    }
}
