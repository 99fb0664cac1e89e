/*!
POSIX extended regular expression syntax.

[`parse_ere`] lowers an ERE pattern to a byte-oriented [`Hir`], following the
behaviour of glibc's `regcomp(REG_EXTENDED)` (`RE_SYNTAX_POSIX_EXTENDED`). See
[the syntax overview](super) for the accepted grammar.

## Example
```
use regsub::syntax::ere::{parse_ere, ErrorKind};

let hir = parse_ere().call(b"(foo|bar)+");
assert!(hir.is_ok());

let err = parse_ere().call(b"a{3,2}").unwrap_err();
assert_eq!(err.kind(), ErrorKind::InvalidInterval);
assert_eq!(err.to_string(), r"Invalid content of \{\}");
```
*/
use bon::builder;
use regex_syntax::hir::{
    Capture, Class, ClassBytes, ClassBytesRange, Dot, Hir, HirKind, Look, Repetition,
};
use thiserror::Error;

/// The largest count accepted in an interval (`RE_DUP_MAX`).
pub const DUP_MAX: u32 = 0x7fff;

/// Maximum nesting height of a parsed expression.
const NEST_LIMIT: u32 = 250;

/// Kind of ERE syntax error. Messages are `regerror()` texts.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    #[error("Invalid collation character")]
    InvalidCollation,
    #[error("Invalid character class name")]
    InvalidClassName,
    #[error("Trailing backslash")]
    TrailingBackslash,
    #[error("Invalid back reference")]
    InvalidBackReference,
    #[error("Unmatched [, [^, [:, [., or [=")]
    UnmatchedBracket,
    #[error("Unmatched ( or \\(")]
    UnmatchedParen,
    #[error("Unmatched \\{{")]
    UnmatchedBrace,
    #[error("Invalid content of \\{{\\}}")]
    InvalidInterval,
    #[error("Invalid range end")]
    InvalidRange,
    #[error("Invalid preceding regular expression")]
    BadRepeat,
    #[error("Regular expression too big")]
    TooBig,
}

/// An ERE syntax error and the byte offset in the pattern where it was detected.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("{kind}")]
pub struct Error {
    kind: ErrorKind,
    offset: usize,
}

impl Error {
    fn new(kind: ErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Byte offset into the pattern.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Parse a POSIX extended regular expression.
///
/// The returned `Hir` never matches by Unicode scalar values: every class is
/// a byte class and `.` matches a single byte.
#[builder]
pub fn parse_ere(
    #[builder(finish_fn)] pattern: &[u8],
    /// Fold ASCII letters in literals and bracket expressions (`REG_ICASE`).
    #[builder(default)]
    case_insensitive: bool,
    /// `REG_NEWLINE`: `.` and negated brackets do not match `\n`, and `^`/`$`
    /// also match around line breaks.
    #[builder(default)]
    newline: bool,
) -> Result<Hir, Error> {
    let mut parser = Parser {
        pattern,
        pos: 0,
        case_insensitive,
        newline,
        groups: 0,
        open: 0,
    };
    let (hir, _) = parser.parse_alternation(0)?;
    debug_assert_eq!(parser.pos, pattern.len());
    Ok(hir)
}

enum BracketItem {
    Byte(u8),
    Class(ClassBytes),
}

struct Parser<'p> {
    pattern: &'p [u8],
    pos: usize,
    case_insensitive: bool,
    newline: bool,
    /// Groups opened so far, i.e. the index of the last capture.
    groups: u32,
    /// Groups not yet closed.
    open: u32,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.pattern.get(self.pos + n).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn eat(&mut self, b: u8) -> bool {
        let eaten = self.peek() == Some(b);
        if eaten {
            self.pos += 1;
        }
        eaten
    }

    /// Returns the expression and its nesting height, with groups and
    /// repetitions each adding a level.
    fn parse_alternation(&mut self, depth: u32) -> Result<(Hir, u32), Error> {
        if depth > NEST_LIMIT {
            return Err(Error::new(ErrorKind::TooBig, self.pos));
        }
        let start = self.pos;
        let mut branches = vec![self.parse_branch(depth)?];
        while self.eat(b'|') {
            branches.push(self.parse_branch(depth)?);
        }
        let height = self.nest(branches.iter().map(|&(_, h)| h), start)?;
        Ok((Hir::alternation(branches.into_iter().map(|(hir, _)| hir).collect()), height))
    }

    fn parse_branch(&mut self, depth: u32) -> Result<(Hir, u32), Error> {
        let start = self.pos;
        let mut pieces: Vec<(Hir, u32)> = Vec::new();
        while let Some(b) = self.peek() {
            match b {
                b'|' => break,
                b')' if self.open > 0 => break,
                b'*' | b'+' | b'?' | b'{' => {
                    let start = self.pos;
                    let (sub, height) = match pieces.pop() {
                        Some((sub, height)) if !matches!(sub.kind(), HirKind::Look(_)) => {
                            (sub, height)
                        }
                        _ => return Err(Error::new(ErrorKind::BadRepeat, start)),
                    };
                    let (min, max) = self.parse_repetition()?;
                    let height = self.nest([height + 1], start)?;
                    let hir = Hir::repetition(Repetition {
                        min,
                        max,
                        greedy: true,
                        sub: Box::new(sub),
                    });
                    pieces.push((hir, height));
                }
                _ => {
                    self.pos += 1;
                    pieces.push(self.parse_atom(b, depth)?);
                }
            }
        }
        let height = self.nest(pieces.iter().map(|&(_, h)| h), start)?;
        Ok((Hir::concat(pieces.into_iter().map(|(hir, _)| hir).collect()), height))
    }

    /// Height of a node over `children`. A single child is not wrapped.
    fn nest(&self, children: impl IntoIterator<Item = u32>, start: usize) -> Result<u32, Error> {
        let mut children = children.into_iter();
        let height = match (children.next(), children.next()) {
            (None, _) => 0,
            (Some(h), None) => h,
            (Some(a), Some(b)) => children.fold(a.max(b), u32::max) + 1,
        };
        if height > NEST_LIMIT {
            return Err(Error::new(ErrorKind::TooBig, start));
        }
        Ok(height)
    }

    fn parse_repetition(&mut self) -> Result<(u32, Option<u32>), Error> {
        let start = self.pos;
        match self.bump() {
            Some(b'*') => Ok((0, None)),
            Some(b'+') => Ok((1, None)),
            Some(b'?') => Ok((0, Some(1))),
            _ => self.parse_interval(start),
        }
    }

    /// `{` has been consumed.
    fn parse_interval(&mut self, start: usize) -> Result<(u32, Option<u32>), Error> {
        if !self.pattern[self.pos..].contains(&b'}') {
            return Err(Error::new(ErrorKind::UnmatchedBrace, start));
        }
        let invalid = Error::new(ErrorKind::InvalidInterval, start);

        let min = self.parse_count(start)?;
        let max = if self.eat(b',') {
            self.parse_count(start)?
        } else {
            Some(min.ok_or(invalid.clone())?)
        };
        if !self.eat(b'}') {
            return Err(invalid);
        }

        let min = min.unwrap_or(0);
        if max.is_some_and(|max| min > max) {
            return Err(invalid);
        }
        Ok((min, max))
    }

    fn parse_count(&mut self, start: usize) -> Result<Option<u32>, Error> {
        let mut count: Option<u32> = None;
        while let Some(d @ b'0'..=b'9') = self.peek() {
            self.pos += 1;
            let n = count.unwrap_or(0) * 10 + u32::from(d - b'0');
            if n > DUP_MAX {
                return Err(Error::new(ErrorKind::TooBig, start));
            }
            count = Some(n);
        }
        Ok(count)
    }

    /// `b` has been consumed.
    fn parse_atom(&mut self, b: u8, depth: u32) -> Result<(Hir, u32), Error> {
        let start = self.pos - 1;
        let hir = match b {
            b'(' => {
                self.groups += 1;
                let index = self.groups;
                self.open += 1;
                let (sub, height) = self.parse_alternation(depth + 1)?;
                if !self.eat(b')') {
                    return Err(Error::new(ErrorKind::UnmatchedParen, start));
                }
                self.open -= 1;
                let height = self.nest([height + 1], start)?;
                let hir = Hir::capture(Capture {
                    index,
                    name: None,
                    sub: Box::new(sub),
                });
                return Ok((hir, height));
            }
            b'.' => Hir::dot(if self.newline {
                Dot::AnyByteExceptLF
            } else {
                Dot::AnyByte
            }),
            b'^' => Hir::look(if self.newline {
                Look::StartLF
            } else {
                Look::Start
            }),
            b'$' => Hir::look(if self.newline { Look::EndLF } else { Look::End }),
            b'[' => self.parse_bracket(start)?,
            b'\\' => self.parse_escape(start)?,
            _ => self.literal(b),
        };
        Ok((hir, 1))
    }

    fn parse_escape(&mut self, start: usize) -> Result<Hir, Error> {
        let Some(b) = self.bump() else {
            return Err(Error::new(ErrorKind::TrailingBackslash, start));
        };
        Ok(match b {
            b'1'..=b'9' => return Err(Error::new(ErrorKind::InvalidBackReference, start)),
            b'w' | b'W' => self.class(word_class(), b == b'W'),
            b's' | b'S' => self.class(space_class(), b == b'S'),
            b'b' => Hir::look(Look::WordAscii),
            b'B' => Hir::look(Look::WordAsciiNegate),
            b'<' => Hir::look(Look::WordStartAscii),
            b'>' => Hir::look(Look::WordEndAscii),
            b'`' => Hir::look(Look::Start),
            b'\'' => Hir::look(Look::End),
            _ => self.literal(b),
        })
    }

    /// `[` at `start` has been consumed.
    fn parse_bracket(&mut self, start: usize) -> Result<Hir, Error> {
        let unmatched = Error::new(ErrorKind::UnmatchedBracket, start);
        let negated = self.eat(b'^');
        let mut class = ClassBytes::empty();
        let mut first = true;
        loop {
            let item_start = self.pos;
            let item = match self.bump() {
                None => return Err(unmatched),
                Some(b']') if !first => break,
                Some(b'[') => self.parse_bracket_element(start)?,
                Some(b) => BracketItem::Byte(b),
            };
            first = false;

            if self.peek() == Some(b'-') && self.peek_at(1).is_some_and(|b| b != b']') {
                self.pos += 1;
                let BracketItem::Byte(lo) = item else {
                    return Err(Error::new(ErrorKind::InvalidRange, item_start));
                };
                let end_start = self.pos;
                let hi = match self.bump() {
                    Some(b'[') => match self.parse_bracket_element(start)? {
                        BracketItem::Byte(b) => b,
                        BracketItem::Class(_) => {
                            return Err(Error::new(ErrorKind::InvalidRange, end_start))
                        }
                    },
                    Some(b) => b,
                    None => return Err(unmatched),
                };
                if lo > hi {
                    return Err(Error::new(ErrorKind::InvalidRange, item_start));
                }
                class.push(ClassBytesRange::new(lo, hi));
            } else {
                match item {
                    BracketItem::Byte(b) => class.push(ClassBytesRange::new(b, b)),
                    BracketItem::Class(c) => class.union(&c),
                }
            }
        }
        Ok(self.class(class, negated))
    }

    /// `[:name:]`, `[=c=]` or `[.c.]`; a lone `[` is literal. The `[` has been
    /// consumed.
    fn parse_bracket_element(&mut self, bracket: usize) -> Result<BracketItem, Error> {
        let start = self.pos - 1;
        let delim = match self.peek() {
            Some(d @ (b':' | b'=' | b'.')) => d,
            _ => return Ok(BracketItem::Byte(b'[')),
        };
        self.pos += 1;

        let pattern = self.pattern;
        let body_start = self.pos;
        let len = pattern[body_start..]
            .windows(2)
            .position(|w| w == [delim, b']'])
            .ok_or(Error::new(ErrorKind::UnmatchedBracket, bracket))?;
        let body = &pattern[body_start..body_start + len];
        self.pos = body_start + len + 2;

        match (delim, body) {
            (b':', name) => posix_class(name)
                .map(BracketItem::Class)
                .ok_or(Error::new(ErrorKind::InvalidClassName, start)),
            (_, &[b]) => Ok(BracketItem::Byte(b)),
            _ => Err(Error::new(ErrorKind::InvalidCollation, start)),
        }
    }

    fn class(&self, mut class: ClassBytes, negated: bool) -> Hir {
        if self.case_insensitive {
            class.case_fold_simple();
        }
        if negated {
            class.negate();
            if self.newline {
                class.difference(&ClassBytes::new([ClassBytesRange::new(b'\n', b'\n')]));
            }
        }
        Hir::class(Class::Bytes(class))
    }

    fn literal(&self, b: u8) -> Hir {
        if self.case_insensitive && b.is_ascii_alphabetic() {
            self.class(ClassBytes::new([ClassBytesRange::new(b, b)]), false)
        } else {
            Hir::literal(vec![b])
        }
    }
}

fn ranges(ranges: &[(u8, u8)]) -> ClassBytes {
    ClassBytes::new(
        ranges
            .iter()
            .map(|&(lo, hi)| ClassBytesRange::new(lo, hi)),
    )
}

fn word_class() -> ClassBytes {
    ranges(&[(b'0', b'9'), (b'A', b'Z'), (b'_', b'_'), (b'a', b'z')])
}

fn space_class() -> ClassBytes {
    ranges(&[(b'\t', b'\r'), (b' ', b' ')])
}

fn posix_class(name: &[u8]) -> Option<ClassBytes> {
    Some(match name {
        b"alnum" => ranges(&[(b'0', b'9'), (b'A', b'Z'), (b'a', b'z')]),
        b"alpha" => ranges(&[(b'A', b'Z'), (b'a', b'z')]),
        b"blank" => ranges(&[(b'\t', b'\t'), (b' ', b' ')]),
        b"cntrl" => ranges(&[(0, 0x1f), (0x7f, 0x7f)]),
        b"digit" => ranges(&[(b'0', b'9')]),
        b"graph" => ranges(&[(b'!', b'~')]),
        b"lower" => ranges(&[(b'a', b'z')]),
        b"print" => ranges(&[(b' ', b'~')]),
        b"punct" => ranges(&[(b'!', b'/'), (b':', b'@'), (b'[', b'`'), (b'{', b'~')]),
        b"space" => space_class(),
        b"upper" => ranges(&[(b'A', b'Z')]),
        b"xdigit" => ranges(&[(b'0', b'9'), (b'A', b'F'), (b'a', b'f')]),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use regex_syntax::ParserBuilder;
    use rstest::rstest;

    use super::*;

    fn parse(pattern: &str) -> Hir {
        ParserBuilder::new()
            .utf8(false)
            .build()
            .parse(pattern)
            .unwrap()
    }

    #[test]
    fn literal() {
        assert_eq!(parse_ere().call(b"abc").unwrap(), parse("abc"));
        assert_eq!(parse_ere().call(b"^a.b$").unwrap(), parse(r"(?s-u)^a.b$"));
        assert_eq!(parse_ere().call(br"a\.\*").unwrap(), parse(r"a\.\*"));
        // Unmatched `)` is ordinary
        assert_eq!(parse_ere().call(b"a)").unwrap(), parse(r"a\)"));
    }

    #[test]
    fn group() {
        assert_eq!(parse_ere().call(b"(a)|b").unwrap(), parse("(a)|b"));
        assert_eq!(parse_ere().call(b"(a(b))(c)").unwrap(), parse("(a(b))(c)"));
        assert_eq!(parse_ere().call(b"a|").unwrap(), parse("a|"));
        assert_eq!(
            parse_ere().call(b"()").unwrap(),
            Hir::capture(Capture {
                index: 1,
                name: None,
                sub: Box::new(Hir::empty()),
            })
        );
    }

    #[test]
    fn repetition() {
        assert_eq!(parse_ere().call(b"ab*").unwrap(), parse("ab*"));
        assert_eq!(parse_ere().call(b"a+b?").unwrap(), parse("a+b?"));
        assert_eq!(parse_ere().call(b"a{2,3}").unwrap(), parse("a{2,3}"));
        assert_eq!(parse_ere().call(b"a{2,}").unwrap(), parse("a{2,}"));
        assert_eq!(parse_ere().call(b"a{,3}").unwrap(), parse("a{0,3}"));
        assert_eq!(parse_ere().call(b"(ab){2}").unwrap(), parse("(ab){2}"));
    }

    #[test]
    fn bracket() {
        assert_eq!(parse_ere().call(b"[]a-c]").unwrap(), parse(r"(?-u)[\]a-c]"));
        assert_eq!(parse_ere().call(b"[a-]").unwrap(), parse(r"(?-u)[a\-]"));
        assert_eq!(parse_ere().call(br"[\d]").unwrap(), parse(r"(?-u)[\\d]"));
        assert_eq!(
            parse_ere().call(b"[[:digit:]x]").unwrap(),
            parse(r"(?-u)[0-9x]")
        );
        assert_eq!(
            parse_ere().call(b"[[.-.][=a=]]").unwrap(),
            parse(r"(?-u)[\-a]")
        );
        assert_eq!(parse_ere().call(b"[^a]").unwrap(), parse(r"(?-u)[^a]"));
    }

    #[test]
    fn escape() {
        assert_eq!(parse_ere().call(br"\w\S").unwrap(), parse(r"(?-u)[0-9A-Za-z_][^\t-\r ]"));
        assert_eq!(
            parse_ere().call(br"\<a\>").unwrap(),
            Hir::concat(vec![
                Hir::look(Look::WordStartAscii),
                Hir::literal(vec![b'a']),
                Hir::look(Look::WordEndAscii),
            ])
        );
        assert_eq!(
            parse_ere().call(br"\`a\'").unwrap(),
            parse(r"\Aa\z")
        );
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(
            parse_ere().case_insensitive(true).call(b"a[b-c]1").unwrap(),
            parse(r"(?i-u)a[b-c]1")
        );
        assert_eq!(
            parse_ere().case_insensitive(true).call(b"[^a]").unwrap(),
            parse(r"(?-u)[^Aa]")
        );
    }

    #[test]
    fn newline() {
        assert_eq!(
            parse_ere().newline(true).call(b"^.[^a]$").unwrap(),
            parse(r"(?m-u)^[^\n][^a\n]$")
        );
    }

    #[rstest]
    #[case("*a", ErrorKind::BadRepeat, 0)]
    #[case("a|*b", ErrorKind::BadRepeat, 2)]
    #[case("(+a)", ErrorKind::BadRepeat, 1)]
    #[case("^*", ErrorKind::BadRepeat, 1)]
    #[case("a{1", ErrorKind::UnmatchedBrace, 1)]
    #[case("a{x}", ErrorKind::InvalidInterval, 1)]
    #[case("a{}", ErrorKind::InvalidInterval, 1)]
    #[case("a{3,2}", ErrorKind::InvalidInterval, 1)]
    #[case("a{32768}", ErrorKind::TooBig, 1)]
    #[case("(a", ErrorKind::UnmatchedParen, 0)]
    #[case("a(b(c)", ErrorKind::UnmatchedParen, 1)]
    #[case("[a", ErrorKind::UnmatchedBracket, 0)]
    #[case("[]", ErrorKind::UnmatchedBracket, 0)]
    #[case("x[[:alpha:", ErrorKind::UnmatchedBracket, 1)]
    #[case("[[:foo:]]", ErrorKind::InvalidClassName, 1)]
    #[case("[[.ab.]]", ErrorKind::InvalidCollation, 1)]
    #[case("[z-a]", ErrorKind::InvalidRange, 1)]
    #[case("[[:alpha:]-z]", ErrorKind::InvalidRange, 1)]
    #[case("a\\", ErrorKind::TrailingBackslash, 1)]
    #[case("(a)\\1", ErrorKind::InvalidBackReference, 3)]
    fn error(#[case] pattern: &str, #[case] kind: ErrorKind, #[case] offset: usize) {
        let err = parse_ere().call(pattern.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), kind);
        assert_eq!(err.offset(), offset);
    }

    #[test]
    fn error_message() {
        let err = parse_ere().call(b"(a").unwrap_err();
        assert_eq!(err.to_string(), r"Unmatched ( or \(");
        let err = parse_ere().call(b"a{1").unwrap_err();
        assert_eq!(err.to_string(), r"Unmatched \{");
    }

    #[test]
    fn nest_limit() {
        let pattern = "(".repeat(300) + &")".repeat(300);
        let err = parse_ere().call(pattern.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooBig);

        let pattern = "(".repeat(100) + &")".repeat(100);
        assert!(parse_ere().call(pattern.as_bytes()).is_ok());

        // Repetitions count towards the nesting of the groups around them
        let pattern = "(".repeat(249) + "a" + &")*".repeat(249);
        let err = parse_ere().call(pattern.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooBig);

        let pattern = "(".repeat(100) + "a" + &")*".repeat(100);
        assert!(parse_ere().call(pattern.as_bytes()).is_ok());

        let pattern = "a".to_owned() + &"{1}".repeat(300);
        let err = parse_ere().call(pattern.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooBig);
    }
}
