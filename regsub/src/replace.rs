/*!
Replacement templates and [`Pattern::replace`].

A template is copied verbatim except for sequences introduced by [`ESC`]:

<pre class="rust">
%0        the whole match
%1 .. %9  the text captured by the corresponding group, or nothing if the group
          did not participate in the match
%%        a literal %
</pre>

Any other `%`, including one at the end of the template, stands for itself and
scanning continues with the byte after it: `100%` and `%x` are copied as is.
*/
use bon::bon;
use tracing::trace;

use crate::{ascii::find_byte, Captures, Error, Pattern};

/// The escape byte of templates.
pub const ESC: u8 = b'%';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Piece<'t> {
    Literal(&'t [u8]),
    /// Index of a capture group, `0..=9`.
    Group(usize),
}

/// A parsed replacement template.
///
/// Parsing never fails. A template can be expanded any number of times.
///
/// ```
/// use regsub::{Pattern, Template};
///
/// let re = Pattern::new("([a-z]+)@([a-z]+)")?;
/// let template = Template::parse(b"%2: %1 (100%)");
/// let subject = b"mail alice@example now";
/// let caps = re.captures(subject, 0)?.unwrap();
///
/// let mut dst = Vec::new();
/// template.expand(subject, &caps, &mut dst)?;
/// assert_eq!(dst, b"example: alice (100%)");
/// # Ok::<(), regsub::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template<'t> {
    pieces: Vec<Piece<'t>>,
}

impl<'t> Template<'t> {
    pub fn parse(template: &'t [u8]) -> Self {
        fn push_literal<'t>(pieces: &mut Vec<Piece<'t>>, literal: &'t [u8]) {
            if !literal.is_empty() {
                pieces.push(Piece::Literal(literal));
            }
        }

        let mut pieces = Vec::new();
        let mut literal_start = 0;
        let mut pos = 0;
        while let Some(i) = find_byte(&template[pos..], ESC).map(|i| pos + i) {
            match template.get(i + 1) {
                Some(&d) if d.is_ascii_digit() => {
                    push_literal(&mut pieces, &template[literal_start..i]);
                    pieces.push(Piece::Group(usize::from(d - b'0')));
                    literal_start = i + 2;
                    pos = i + 2;
                }
                Some(&ESC) => {
                    // Keep the first `%`, drop the second
                    push_literal(&mut pieces, &template[literal_start..=i]);
                    literal_start = i + 2;
                    pos = i + 2;
                }
                _ => pos = i + 1,
            }
        }
        push_literal(&mut pieces, &template[literal_start..]);

        Self { pieces }
    }

    pub fn pieces(&self) -> &[Piece<'t>] {
        &self.pieces
    }

    /// Append the expansion for a match of `subject` to `dst`.
    ///
    /// # Errors
    /// [`Error::OutOfMemory`] if `dst` cannot grow.
    pub fn expand(&self, subject: &[u8], caps: &Captures, dst: &mut Vec<u8>) -> Result<(), Error> {
        for piece in &self.pieces {
            match *piece {
                Piece::Literal(literal) => append(dst, literal)?,
                Piece::Group(index) => {
                    if let Some(group) = caps.get_bytes(subject, index) {
                        append(dst, group)?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn append(dst: &mut Vec<u8>, bytes: &[u8]) -> Result<(), Error> {
    dst.try_reserve(bytes.len())?;
    dst.extend_from_slice(bytes);
    Ok(())
}

fn lazy_buffer(dst: &mut Option<Vec<u8>>, capacity: usize) -> Result<&mut Vec<u8>, Error> {
    if dst.is_none() {
        let mut buf = Vec::new();
        buf.try_reserve(capacity)?;
        *dst = Some(buf);
    }
    Ok(dst.get_or_insert_with(Vec::new))
}

#[bon]
impl Pattern {
    /// Replace the first match in `subject`, or every match with
    /// [`all`](PatternReplaceBuilder::all), by the expansion of `template`.
    ///
    /// Returns `None` if nothing matched, so that the caller can keep using
    /// `subject` without a copy.
    ///
    /// Every search after the first runs on the rest of `subject` as if it
    /// were a subject of its own: `^` and `\b` anchor at the position where the
    /// previous match ended. After an empty match one byte is copied as is
    /// before searching again, so that each position is matched at most once
    /// and the loop always terminates.
    ///
    /// # Example
    /// ```
    /// use regsub::Pattern;
    ///
    /// let re = Pattern::new("x*")?;
    /// assert_eq!(re.replace(b"abc", b"-").all(true).call()?.unwrap(), b"-a-b-c-");
    ///
    /// let re = Pattern::new("^a")?;
    /// assert_eq!(re.replace(b"aaba", b"x").all(true).call()?.unwrap(), b"xxba");
    ///
    /// let re = Pattern::new("[0-9]+")?;
    /// assert_eq!(re.replace(b"abc", b"#").call()?, None);
    /// # Ok::<(), regsub::Error>(())
    /// ```
    #[builder]
    pub fn replace(
        &self,
        #[builder(start_fn)] subject: &[u8],
        #[builder(start_fn)] template: &[u8],
        /// Replace every match instead of only the first one.
        #[builder(default)]
        all: bool,
    ) -> Result<Option<Vec<u8>>, Error> {
        let template = Template::parse(template);
        let mut caps = Captures::new();
        let mut dst = None;
        let mut cursor = 0;
        let mut replacements = 0usize;
        while self.execute(&subject[cursor..], 0, &mut caps)? {
            let rest = &subject[cursor..];
            let Some(span) = caps.get(0) else { break };
            let buf = lazy_buffer(&mut dst, rest.len())?;
            append(buf, &rest[..span.start])?;
            template.expand(rest, &caps, buf)?;
            cursor += span.end;
            replacements += 1;

            if !all {
                break;
            }
            if span.is_empty() {
                match subject.get(cursor..=cursor) {
                    Some(byte) => {
                        append(buf, byte)?;
                        cursor += 1;
                    }
                    None => break,
                }
            }
        }
        trace!(replacements, all, "replace");

        match dst {
            Some(mut buf) => {
                append(&mut buf, &subject[cursor..])?;
                Ok(Some(buf))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn parse() {
        let template = Template::parse(b"<%1>");
        assert_eq!(
            template.pieces(),
            [Piece::Literal(b"<"), Piece::Group(1), Piece::Literal(b">")]
        );
        assert_eq!(Template::parse(b"100%").pieces(), [Piece::Literal(b"100%")]);
        assert_eq!(Template::parse(b"%x%").pieces(), [Piece::Literal(b"%x%")]);
        assert_eq!(
            Template::parse(b"a%%b").pieces(),
            [Piece::Literal(b"a%"), Piece::Literal(b"b")]
        );
        assert_eq!(Template::parse(b"%0%9").pieces(), [Piece::Group(0), Piece::Group(9)]);
        assert!(Template::parse(b"").pieces().is_empty());
    }

    #[test]
    fn expand() {
        let re = Pattern::new("(a)(b)?").unwrap();
        let subject = b"xac";
        let caps = re.captures(subject, 0).unwrap().unwrap();
        let template = Template::parse(b"[%0|%1|%2|%5]");

        let mut dst = Vec::new();
        template.expand(subject, &caps, &mut dst).unwrap();
        assert_eq!(dst, b"[a|a||]");
        // Same input, same output
        template.expand(subject, &caps, &mut dst).unwrap();
        assert_eq!(dst, b"[a|a||][a|a||]");
    }

    #[rstest]
    #[case("([a-z]+)", "hello 42 world", "<%1>", false, Some("<hello> 42 world"))]
    #[case("([a-z]+)", "hello 42 world", "<%1>", true, Some("<hello> 42 <world>"))]
    #[case("[0-9]+", "abc", "X", true, None)]
    #[case("(a)(b)?", "ac", "[%1][%2]", false, Some("[a][]c"))]
    #[case(".", "ab", "%%", true, Some("%%"))]
    #[case("o", "foo", "0", false, Some("f0o"))]
    #[case("o", "foo", "", true, Some("f"))]
    #[case("b+", "abbbc", "%0%0", true, Some("abbbbbbc"))]
    #[case("(x)|y", "y", "[%1]", false, Some("[]"))]
    #[case("[0-9]", "a1b2", "%", true, Some("a%b%"))]
    #[case("[0-9]", "a1b2", "%q%", true, Some("a%q%b%q%"))]
    fn replace(
        #[case] pattern: &str,
        #[case] subject: &str,
        #[case] template: &str,
        #[case] all: bool,
        #[case] expected: Option<&str>,
    ) {
        let re = Pattern::new(pattern).unwrap();
        let result = re
            .replace(subject.as_bytes(), template.as_bytes())
            .all(all)
            .call()
            .unwrap();
        assert_eq!(result.as_deref(), expected.map(str::as_bytes));
    }

    #[rstest]
    #[case("x*", "abc", "-a-b-c-")]
    #[case("a*", "baaac", "-b--c-")]
    #[case("a*", "", "-")]
    #[case("^", "abc", "-a-b-c-")]
    #[case("$", "abc", "abc-")]
    #[case(r"\b", "ab cd", "-a-b -c-d")]
    fn replace_empty_match(#[case] pattern: &str, #[case] subject: &str, #[case] expected: &str) {
        let re = Pattern::new(pattern).unwrap();
        let result = re
            .replace(subject.as_bytes(), b"-")
            .all(true)
            .call()
            .unwrap();
        assert_eq!(result.as_deref(), Some(expected.as_bytes()));
    }

    #[test]
    fn anchor_reapplied() {
        let re = Pattern::new("^a").unwrap();
        let result = re.replace(b"aaa", b"x").all(true).call().unwrap();
        assert_eq!(result.unwrap(), b"xxx");
        let result = re.replace(b"aaa", b"x").call().unwrap();
        assert_eq!(result.unwrap(), b"xaa");

        // Groups are expanded from the rest of the subject
        let re = Pattern::new("^(.)").unwrap();
        let result = re.replace(b"abc", b"[%1]").all(true).call().unwrap();
        assert_eq!(result.unwrap(), b"[a][b][c]");
    }

    #[test]
    fn bytes() {
        let re = Pattern::new(b"\0|\xff").unwrap();
        let result = re.replace(b"a\0b", b"%%").call().unwrap();
        assert_eq!(result.unwrap(), b"a%b");
    }
}
