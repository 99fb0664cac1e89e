use regex_automata::{util::primitives::NonMaxUsize, Span};

use crate::NMATCH;

/// Spans of the whole match and of the first `NMATCH - 1` groups, filled by
/// [`Pattern::execute`](crate::Pattern::execute).
///
/// Index 0 is the whole match. A group that did not participate in the match,
/// or that the pattern does not have, is absent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Captures {
    spans: [Option<Span>; NMATCH],
}

impl Captures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Implicit slots as filled by `search_slots`: two per group, start then end.
    pub(crate) fn set_slots(&mut self, slots: &[Option<NonMaxUsize>; NMATCH * 2]) {
        for (span, slot) in self.spans.iter_mut().zip(slots.chunks_exact(2)) {
            *span = match (slot[0], slot[1]) {
                (Some(start), Some(end)) => Some(Span {
                    start: start.get(),
                    end: end.get(),
                }),
                _ => None,
            };
        }
    }

    pub(crate) fn clear(&mut self) {
        self.spans = [None; NMATCH];
    }

    /// Whether the last execution matched.
    pub fn is_match(&self) -> bool {
        self.spans[0].is_some()
    }

    /// Span of group `index`. Out of range indices are absent.
    pub fn get(&self, index: usize) -> Option<Span> {
        self.spans.get(index).copied().flatten()
    }

    /// Bytes of group `index` within `subject`.
    ///
    /// `subject` must be the subject the captures were filled from.
    pub fn get_bytes<'h>(&self, subject: &'h [u8], index: usize) -> Option<&'h [u8]> {
        self.get(index).map(|span| &subject[span])
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = Option<Span>> + '_ {
        self.spans.iter().copied()
    }

    /// Group bytes from index 0 up to the last present group. Absent groups
    /// before it are `None`.
    ///
    /// ```
    /// use regsub::Pattern;
    ///
    /// let re = Pattern::new("(a)(b)?(c)")?;
    /// let caps = re.captures(b"ac", 0)?.unwrap();
    /// assert_eq!(
    ///     caps.groups(b"ac"),
    ///     [Some(&b"ac"[..]), Some(&b"a"[..]), None, Some(&b"c"[..])]
    /// );
    /// # Ok::<(), regsub::Error>(())
    /// ```
    pub fn groups<'h>(&self, subject: &'h [u8]) -> Vec<Option<&'h [u8]>> {
        let len = self
            .spans
            .iter()
            .rposition(Option::is_some)
            .map_or(0, |last| last + 1);
        self.spans[..len]
            .iter()
            .map(|span| span.map(|span| &subject[span]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(i: usize) -> Option<NonMaxUsize> {
        NonMaxUsize::new(i)
    }

    #[test]
    fn slots() {
        let mut slots = [None; NMATCH * 2];
        slots[0] = slot(1);
        slots[1] = slot(4);
        slots[4] = slot(2);
        slots[5] = slot(3);

        let mut caps = Captures::new();
        assert!(!caps.is_match());
        caps.set_slots(&slots);
        assert!(caps.is_match());
        assert_eq!(caps.get(0), Some(Span { start: 1, end: 4 }));
        assert_eq!(caps.get(1), None);
        assert_eq!(caps.get(2), Some(Span { start: 2, end: 3 }));
        assert_eq!(caps.get(NMATCH), None);
        assert_eq!(caps.iter().len(), NMATCH);

        let subject = b"xabcx";
        assert_eq!(caps.get_bytes(subject, 0), Some(&b"abc"[..]));
        assert_eq!(caps.groups(subject), [Some(&b"abc"[..]), None, Some(&b"b"[..])]);

        caps.clear();
        assert!(!caps.is_match());
        assert!(caps.groups(subject).is_empty());
    }
}
