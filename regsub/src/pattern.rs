use std::fmt;

use bon::bon;
use regex_automata::{
    hybrid, meta,
    nfa::thompson,
    util::{pool::Pool, primitives::NonMaxUsize},
    Anchored, Input, MatchKind, PatternID,
};
use regex_syntax::hir::{Hir, Look};
use tracing::debug;

use crate::{syntax::ere::parse_ere, Captures, Error, NMATCH};

/// A compiled POSIX extended regular expression.
///
/// A `Pattern` is immutable and can be shared between threads. Searches keep
/// their capture slots on the stack; the engine's scratch space comes from an
/// internal pool.
///
/// Matching is leftmost-longest: among the matches starting at the leftmost
/// position, the longest one wins, whatever the alternation order. Groups are
/// then assigned the way alternation order and greedy repetition prefer among
/// the parses of that match.
///
/// # Example
/// ```
/// use regsub::Pattern;
///
/// let re = Pattern::new("([0-9]+)-([0-9]+)")?;
/// let groups = re.match_groups(b"12-34")?.unwrap();
/// assert_eq!(
///     groups,
///     [Some(b"12-34".to_vec()), Some(b"12".to_vec()), Some(b"34".to_vec())]
/// );
/// # Ok::<(), regsub::Error>(())
/// ```
pub struct Pattern {
    /// Finds the leftmost start.
    re: meta::Regex,
    /// `re` followed by `$`, for the groups of a match whose end is known.
    exact: meta::Regex,
    /// `MatchKind::All`, so an anchored search reports the longest end.
    longest: hybrid::dfa::DFA,
    pool: Pool<hybrid::dfa::Cache, CachePoolFn>,
    source: Box<[u8]>,
}

type CachePoolFn = Box<dyn Fn() -> hybrid::dfa::Cache + Send + Sync>;

fn cache_pool(dfa: &hybrid::dfa::DFA) -> Pool<hybrid::dfa::Cache, CachePoolFn> {
    let dfa = dfa.clone();
    let create: CachePoolFn = Box::new(move || dfa.create_cache());
    Pool::new(create)
}

impl Clone for Pattern {
    fn clone(&self) -> Self {
        Self {
            re: self.re.clone(),
            exact: self.exact.clone(),
            longest: self.longest.clone(),
            pool: cache_pool(&self.longest),
            source: self.source.clone(),
        }
    }
}

#[bon]
impl Pattern {
    pub fn new(pattern: impl AsRef<[u8]>) -> Result<Self, Error> {
        Self::builder().build(pattern)
    }

    /// Return a builder for configuring the construction of a `Pattern`.
    ///
    /// # Example
    /// ```
    /// use regsub::Pattern;
    ///
    /// let re = Pattern::builder()
    ///     .case_insensitive(true)
    ///     .newline(true)
    ///     .build("^hello$")?;
    /// assert!(re.is_match(b"first line\nHello\n"));
    /// # Ok::<(), regsub::Error>(())
    /// ```
    #[builder(builder_type = Builder, finish_fn(name = build_from_hir, doc {
    /// Builds a `Pattern` directly from an `Hir` expression.
    ///
    /// Options only relevant to parsing ([`Builder::case_insensitive`],
    /// [`Builder::newline`]) are ignored.
    ///
    /// # Example
    /// ```
    /// use regex_syntax::hir::{Hir, Look};
    /// use regsub::Pattern;
    ///
    /// let hir = Hir::concat(vec![Hir::look(Look::Start), Hir::literal(*b"foo")]);
    /// let re = Pattern::builder().build_from_hir(hir)?;
    /// assert!(re.is_match(b"foobar"));
    /// assert!(!re.is_match(b"barfoo"));
    /// # Ok::<(), regsub::Error>(())
    /// ```
    }))]
    pub fn builder(
        #[builder(field)] case_insensitive: bool,
        #[builder(field)] newline: bool,
        #[builder(field)] source: Option<Box<[u8]>>,
        #[builder(finish_fn)] hir: Hir,
        /// Approximate heap limit of the compiled NFA in bytes. Patterns
        /// over the limit fail to build.
        ///
        /// Defaults to the engine's limit.
        size_limit: Option<usize>,
    ) -> Result<Self, Error> {
        let source = source.unwrap_or_else(|| hir.to_string().into_bytes().into_boxed_slice());

        let mut config = meta::Config::new().utf8_empty(false);
        let mut thompson = thompson::Config::new()
            .utf8(false)
            .which_captures(thompson::WhichCaptures::None);
        if let Some(limit) = size_limit {
            config = config.nfa_size_limit(Some(limit));
            thompson = thompson.nfa_size_limit(Some(limit));
        }
        let re = meta::Builder::new()
            .configure(config.clone())
            .build_from_hir(&hir)
            .inspect_err(|e| {
                debug!(pattern = %String::from_utf8_lossy(&source), error = %e, "pattern rejected")
            })?;
        let exact = meta::Builder::new()
            .configure(config)
            .build_from_hir(&Hir::concat(vec![hir.clone(), Hir::look(Look::End)]))?;
        let nfa = thompson::Compiler::new()
            .configure(thompson)
            .build_from_hir(&hir)?;
        let longest = hybrid::dfa::DFA::builder()
            .configure(hybrid::dfa::Config::new().match_kind(MatchKind::All))
            .build_from_nfa(nfa)?;

        let pattern = Self {
            re,
            exact,
            pool: cache_pool(&longest),
            longest,
            source,
        };
        debug!(
            pattern = %String::from_utf8_lossy(&pattern.source),
            groups = pattern.group_len(),
            case_insensitive,
            newline,
            "pattern compiled"
        );
        Ok(pattern)
    }
}

impl<S: builder::State> Builder<S> {
    /// Fold ASCII letters (`REG_ICASE`).
    pub fn case_insensitive(mut self, yes: bool) -> Self {
        self.case_insensitive = yes;
        self
    }

    /// `REG_NEWLINE`: `.` and negated bracket expressions do not match a
    /// new line, `^` and `$` also match after and before one.
    pub fn newline(mut self, yes: bool) -> Self {
        self.newline = yes;
        self
    }

    /// Parses `pattern` as an extended regular expression and builds a
    /// `Pattern` from it.
    ///
    /// ```
    /// use regsub::{syntax::ere::ErrorKind, Error, Pattern};
    ///
    /// let err = Pattern::builder().build("a(b").unwrap_err();
    /// assert!(matches!(err, Error::Syntax(e) if e.kind() == ErrorKind::UnmatchedParen));
    /// ```
    pub fn build(mut self, pattern: impl AsRef<[u8]>) -> Result<Pattern, Error>
    where
        S: builder::IsComplete,
    {
        let pattern = pattern.as_ref();
        let hir = parse_ere()
            .case_insensitive(self.case_insensitive)
            .newline(self.newline)
            .call(pattern)
            .inspect_err(|e| {
                debug!(
                    pattern = %String::from_utf8_lossy(pattern),
                    offset = e.offset(),
                    error = %e,
                    "pattern rejected"
                )
            })?;
        self.source = Some(pattern.into());
        self.build_from_hir(hir)
    }
}

impl Pattern {
    /// Searches `subject[offset..]` for the leftmost-longest match and fills
    /// `caps`.
    ///
    /// The bytes before `offset` are still visible to look-around assertions,
    /// so `^` only matches at the start of `subject` and `\b` sees the byte
    /// before `offset`. Pass `&subject[offset..]` instead to search as if the
    /// subject started there. Returns whether a match was found; on no match
    /// `caps` is cleared.
    ///
    /// # Errors
    /// [`Error::Offset`] if `offset > subject.len()`.
    pub fn execute(
        &self,
        subject: &[u8],
        offset: usize,
        caps: &mut Captures,
    ) -> Result<bool, Error> {
        if offset > subject.len() {
            return Err(Error::Offset {
                offset,
                len: subject.len(),
            });
        }
        let input = Input::new(subject).span(offset..subject.len());
        let mut slots = [None; NMATCH * 2];
        let slot_len = self.re.group_info().slot_len().min(slots.len());
        if self.re.search_slots(&input, &mut slots[..slot_len]).is_none() {
            caps.clear();
            return Ok(false);
        }
        caps.set_slots(&slots);
        let Some(first) = caps.get(0) else {
            return Ok(true);
        };

        let end = self.longest_end(subject, first.start)?;
        if end > first.end {
            // Rerun on a haystack ending at `end`, so `$` pins the match to it
            let input = Input::new(&subject[..end])
                .span(first.start..end)
                .anchored(Anchored::Yes);
            let mut slots: [Option<NonMaxUsize>; NMATCH * 2] = [None; NMATCH * 2];
            if self.exact.search_slots(&input, &mut slots[..slot_len]).is_some() {
                caps.set_slots(&slots);
            }
        }
        Ok(true)
    }

    /// End of the longest match starting at `start`.
    fn longest_end(&self, subject: &[u8], start: usize) -> Result<usize, Error> {
        let input = Input::new(subject)
            .span(start..subject.len())
            .anchored(Anchored::Yes);
        let mut cache = self.pool.get();
        let end = self.longest.try_search_fwd(&mut cache, &input)?;
        Ok(end.map_or(start, |m| m.offset()))
    }

    /// [`Pattern::execute`] into fresh captures.
    pub fn captures(&self, subject: &[u8], offset: usize) -> Result<Option<Captures>, Error> {
        let mut caps = Captures::new();
        Ok(self.execute(subject, offset, &mut caps)?.then_some(caps))
    }

    #[inline]
    pub fn is_match(&self, subject: &[u8]) -> bool {
        self.re.is_match(subject)
    }

    /// Match `subject` from its start and copy out the whole match followed by
    /// the groups, up to the last group that participated. Groups before it
    /// that did not participate are `None`.
    pub fn match_groups(&self, subject: &[u8]) -> Result<Option<Vec<Option<Vec<u8>>>>, Error> {
        Ok(self.captures(subject, 0)?.map(|caps| {
            caps.groups(subject)
                .into_iter()
                .map(|group| group.map(<[u8]>::to_vec))
                .collect()
        }))
    }

    /// Number of capture groups, including the implicit group 0.
    ///
    /// Only the first [`NMATCH`] are reported by a search.
    pub fn group_len(&self) -> usize {
        self.re.group_info().group_len(PatternID::ZERO)
    }

    /// The pattern text this was compiled from.
    pub fn as_bytes(&self) -> &[u8] {
        &self.source
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("source", &format_args!("\"{}\"", self.source.escape_ascii()))
            .field("groups", &self.group_len())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<regex/pattern \"{}\">", self.source.escape_ascii())
    }
}
