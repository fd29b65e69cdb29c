//! Timed-text (LRC) parser
//!
//! Parses loosely structured lyrics of the form:
//! [00:12.34]Hello world
//! [00:15.00]Another line
//!
//! Non-matching lines are skipped, never fatal. Zero valid lines is a
//! normal "not found" outcome.

/// A single transcript line with the playback offset at which it becomes
/// current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedLine {
    /// Offset in milliseconds from track start.
    pub offset_ms: u64,
    /// The lyric text, trimmed, never empty.
    pub text: String,
}

impl TimedLine {
    pub fn new(offset_ms: u64, text: impl Into<String>) -> Self {
        Self {
            offset_ms,
            text: text.into(),
        }
    }
}

/// An ordered transcript, non-decreasing by offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    lines: Vec<TimedLine>,
}

impl Transcript {
    /// Parse raw timed text. Returns `None` when no line matched the
    /// `[MM:SS.CC]text` pattern with non-empty text.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut lines: Vec<TimedLine> = raw.lines().filter_map(parse_line).collect();
        if lines.is_empty() {
            return None;
        }
        // Stable sort: equal offsets keep their input order.
        lines.sort_by_key(|l| l.offset_ms);
        Some(Self { lines })
    }

    /// Single-line transcript used when every source came up empty.
    pub fn placeholder(text: &str) -> Self {
        Self {
            lines: vec![TimedLine::new(0, text)],
        }
    }

    pub fn lines(&self) -> &[TimedLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

/// Parse one `[MM:SS.CC]text` line. Fields are exactly two digits;
/// anything else is rejected.
fn parse_line(line: &str) -> Option<TimedLine> {
    let rest = line.strip_prefix('[')?;
    let (stamp, text) = rest.split_once(']')?;

    let (min, rest) = stamp.split_once(':')?;
    let (sec, cents) = rest.split_once('.')?;
    let min = parse_two_digits(min)?;
    let sec = parse_two_digits(sec)?;
    let cents = parse_two_digits(cents)?;

    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    Some(TimedLine::new(min * 60_000 + sec * 1_000 + cents * 10, text))
}

fn parse_two_digits(s: &str) -> Option<u64> {
    if s.len() != 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_timestamped_lines() {
        let raw = "[00:12.34]First line\n[00:15.00]Second line";
        let t = Transcript::parse(raw).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.lines()[0].offset_ms, 12_340);
        assert_eq!(t.lines()[0].text, "First line");
        assert_eq!(t.lines()[1].offset_ms, 15_000);
    }

    #[test]
    fn skips_malformed_and_metadata_lines() {
        let raw = "[ti:Some Title]\nnot a lyric\n[1:2.3]bad widths\n[00:01.00]ok";
        let t = Transcript::parse(raw).unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.lines()[0].text, "ok");
    }

    #[test]
    fn drops_empty_text_after_trim() {
        let raw = "[00:01.00]   \n[00:02.00]kept";
        let t = Transcript::parse(raw).unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.lines()[0].text, "kept");
    }

    #[test]
    fn no_valid_lines_is_not_found() {
        assert!(Transcript::parse("plain text\nmore text").is_none());
        assert!(Transcript::parse("").is_none());
        assert!(Transcript::parse("[00:01.00]  ").is_none());
    }

    #[test]
    fn sorts_by_offset_keeping_equal_order() {
        let raw = "[00:10.00]late\n[00:01.00]early\n[00:10.00]late2";
        let t = Transcript::parse(raw).unwrap();
        let texts: Vec<_> = t.lines().iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["early", "late", "late2"]);
    }

    #[test]
    fn parse_is_deterministic() {
        let raw = "[00:30.00]b\n[00:10.00]a\njunk\n[00:30.00]c";
        let a = Transcript::parse(raw).unwrap();
        let b = Transcript::parse(raw).unwrap();
        assert_eq!(a, b);
        assert!(
            a.lines()
                .windows(2)
                .all(|w| w[0].offset_ms <= w[1].offset_ms)
        );
    }

    #[test]
    fn offset_arithmetic() {
        let t = Transcript::parse("[02:03.45]x").unwrap();
        assert_eq!(t.lines()[0].offset_ms, 2 * 60_000 + 3 * 1_000 + 45 * 10);
    }
}
