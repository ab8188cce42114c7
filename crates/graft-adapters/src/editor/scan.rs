//! A lexical pass that tells code apart from strings and comments.
//!
//! Good enough for locating imports, declarations and balanced brackets in
//! C-family sources. Template literals are treated as opaque strings,
//! including any `${}` inside them.

pub(super) struct Scanned<'a> {
    pub source: &'a str,
    code: Vec<bool>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    LineComment,
    BlockComment,
    Str(u8),
}

impl<'a> Scanned<'a> {
    pub fn new(source: &'a str) -> Self {
        let bytes = source.as_bytes();
        let mut code = vec![false; bytes.len()];
        let mut state = State::Code;
        let mut i = 0;

        while i < bytes.len() {
            let b = bytes[i];
            let next = bytes.get(i + 1).copied();
            match state {
                State::Code => match (b, next) {
                    (b'/', Some(b'/')) => {
                        state = State::LineComment;
                        i += 2;
                        continue;
                    }
                    (b'/', Some(b'*')) => {
                        state = State::BlockComment;
                        i += 2;
                        continue;
                    }
                    (b'"' | b'\'' | b'`', _) => state = State::Str(b),
                    _ => code[i] = true,
                },
                State::LineComment => {
                    if b == b'\n' {
                        state = State::Code;
                        code[i] = true;
                    }
                }
                State::BlockComment => {
                    if b == b'*' && next == Some(b'/') {
                        state = State::Code;
                        i += 2;
                        continue;
                    }
                }
                State::Str(quote) => {
                    if b == b'\\' {
                        i += 2;
                        continue;
                    }
                    if b == quote {
                        state = State::Code;
                    }
                }
            }
            i += 1;
        }

        Self { source, code }
    }

    pub fn is_code(&self, index: usize) -> bool {
        self.code.get(index).copied().unwrap_or(false)
    }

    /// First code-level occurrence of `needle` at or after `from`, delimited
    /// as a whole word when it starts or ends with an identifier character.
    pub fn find_word(&self, needle: &str, from: usize) -> Option<usize> {
        let bytes = self.source.as_bytes();
        let mut start = from;
        while let Some(offset) = self.source.get(start..)?.find(needle) {
            let at = start + offset;
            let end = at + needle.len();
            let before_ok = at == 0
                || !is_ident(bytes[at - 1])
                || !needle.as_bytes().first().copied().is_some_and(is_ident);
            let after_ok = end >= bytes.len()
                || !is_ident(bytes[end])
                || !needle.as_bytes().last().copied().is_some_and(is_ident);
            if self.is_code(at) && before_ok && after_ok {
                return Some(at);
            }
            start = at + 1;
        }
        None
    }

    /// Next code-level `byte` at or after `from`.
    pub fn find_byte(&self, byte: u8, from: usize) -> Option<usize> {
        let bytes = self.source.as_bytes();
        (from..bytes.len()).find(|&i| bytes[i] == byte && self.is_code(i))
    }

    /// Index of the bracket closing the one at `open`.
    pub fn matching(&self, open: usize) -> Option<usize> {
        let bytes = self.source.as_bytes();
        let (open_b, close_b) = match bytes.get(open)? {
            b'(' => (b'(', b')'),
            b'{' => (b'{', b'}'),
            b'[' => (b'[', b']'),
            _ => return None,
        };
        let mut depth = 0usize;
        for i in open..bytes.len() {
            if !self.is_code(i) {
                continue;
            }
            if bytes[i] == open_b {
                depth += 1;
            } else if bytes[i] == close_b {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
        }
        None
    }

    /// Start of the line containing `index`.
    pub fn line_start(&self, index: usize) -> usize {
        self.source[..index].rfind('\n').map_or(0, |i| i + 1)
    }

    /// Index just past the newline ending the line containing `index`.
    pub fn line_end(&self, index: usize) -> usize {
        self.source[index..]
            .find('\n')
            .map_or(self.source.len(), |i| index + i + 1)
    }

    /// Leading whitespace of the line containing `index`.
    pub fn indent_at(&self, index: usize) -> &'a str {
        let start = self.line_start(index);
        let line = &self.source[start..];
        let width = line.len() - line.trim_start_matches([' ', '\t']).len();
        &line[..width]
    }
}

pub(super) fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Whitespace-insensitive form for "already present" checks.
pub(super) fn normalized(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split on commas that are not nested inside brackets or strings.
pub(super) fn split_top_level(text: &str) -> Vec<&str> {
    let scanned = Scanned::new(text);
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if !scanned.is_code(i) {
            continue;
        }
        match b {
            b'(' | b'{' | b'[' | b'<' => depth += 1,
            b')' | b'}' | b']' | b'>' => depth -= 1,
            b',' if depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = text[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_and_comments_are_not_code() {
        let src = "a // b\n/* c */ 'd' \"e\" `f` g";
        let scanned = Scanned::new(src);
        let code: String = src
            .char_indices()
            .filter(|(i, _)| scanned.is_code(*i))
            .map(|(_, c)| c)
            .collect();
        assert_eq!(code.split_whitespace().collect::<Vec<_>>(), vec!["a", "g"]);
    }

    #[test]
    fn matching_skips_brackets_in_strings() {
        let src = "f(a, \")\", (b)) + 1";
        let scanned = Scanned::new(src);
        assert_eq!(scanned.matching(1), Some(13));
    }

    #[test]
    fn find_word_respects_boundaries() {
        let src = "const setupX = 1;\nfunction setup() {}";
        let scanned = Scanned::new(src);
        let at = scanned.find_word("function setup", 0).unwrap();
        assert!(src[at..].starts_with("function setup("));
        assert!(scanned.find_word("setup", 0).is_some_and(|i| i > 20));
    }

    #[test]
    fn top_level_split_ignores_nested_commas() {
        assert_eq!(
            split_top_level("a: number, b: Map<string, number>, c = f(1, 2)"),
            vec!["a: number", "b: Map<string, number>", "c = f(1, 2)"]
        );
    }
}
