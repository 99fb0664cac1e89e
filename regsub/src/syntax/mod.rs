/*!
Pattern syntax front-ends for [`Pattern`](crate::Pattern).

Patterns are parsed into [`Hir`](regex_syntax::hir::Hir) and then compiled by
[`regex_automata`]. The only syntax at the moment is [POSIX extended regular
expressions](ere), as understood by a system `regcomp(REG_EXTENDED)`.

## Example
```
use regsub::{syntax::ere::parse_ere, Pattern};

let hir = parse_ere().case_insensitive(true).call(b"^foo[0-9]+$")?;
let re = Pattern::builder().build_from_hir(hir)?;
assert!(re.is_match(b"FOO42"));
# Ok::<(), regsub::Error>(())
```

### Matching one byte

<pre class="rust">
.             any byte (any byte except new line in newline mode)
[xyz]         a bracket expression matching either x, y or z
[^xyz]        any byte except x, y and z (and new line in newline mode)
[a-z]         any byte in range a-z
[]a]          a leading ] is literal
[a-]          a leading or trailing - is literal
[[:alpha:]]   POSIX character class
[[=a=]]       equivalence class (single byte only)
[[.-.]]       collating symbol (single byte only)
\w  \W        word byte ([[:alnum:]_]) and its negation
\s  \S        whitespace byte ([[:space:]]) and its negation
\c            literal c, for any other byte c except 1 to 9
</pre>

Unlike Perl-style syntaxes, `\` is an ordinary byte inside brackets: `[\d]`
matches `\` or `d`.

### Composites and repetitions

<pre class="rust">
xy        concatenation
x|y       alternation (either branch may be empty)
(x)       capture group, numbered by its opening parenthesis
x*        zero or more of x
x+        one or more of x
x?        zero or one of x
x{n}      exactly n x
x{n,}     at least n x
x{n,m}    at least n x and at most m x
x{,m}     at most m x
</pre>

All repetitions are greedy. Counts are limited to [`DUP_MAX`](ere::DUP_MAX).
A `)` without a matching `(` is an ordinary byte.

### Empty matches

<pre class="rust">
^         the beginning of the subject (or of a line in newline mode)
$         the end of the subject (or of a line in newline mode)
\`        only the beginning of the subject
\'        only the end of the subject
\b  \B    ASCII word boundary and its negation
\<  \>    start-of-word and end-of-word boundary
</pre>

`^` and `$` are anchors anywhere in the pattern, not only at its ends.

### POSIX character classes

<pre class="rust">
[[:alnum:]]    alphanumeric ([0-9A-Za-z])
[[:alpha:]]    alphabetic ([A-Za-z])
[[:blank:]]    blank ([\t ])
[[:cntrl:]]    control ([\x00-\x1F\x7F])
[[:digit:]]    digits ([0-9])
[[:graph:]]    graphical ([!-~])
[[:lower:]]    lower case ([a-z])
[[:print:]]    printable ([ -~])
[[:punct:]]    punctuation ([!-/:-@\[-`{-~])
[[:space:]]    whitespace ([\t\n\v\f\r ])
[[:upper:]]    upper case ([A-Z])
[[:xdigit:]]   hex digit ([0-9A-Fa-f])
</pre>

### Not supported
Back-references (`\1` to `\9`) are rejected: the engine is a finite automaton.
*/
pub mod ere;
