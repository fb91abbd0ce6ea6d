//! Shell-style glob patterns compiled to anchored regular expressions.
//!
//! Supported syntax: `*`, `?`, bracket classes (`[abc]`, `[a-z]`, `[!x]`,
//! `[^x]`) and `\` to escape the next character.

use regex::Regex;

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct Glob {
    source: String,
    regex: Regex,
}

impl Glob {
    /// Compile a glob pattern.
    ///
    /// Returns a human-readable reason on failure.
    pub fn new(pattern: &str) -> Result<Self, String> {
        let translated = translate(pattern)?;
        let regex = Regex::new(&translated).map_err(|e| e.to_string())?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `text` matches the whole pattern.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

fn translate(pattern: &str) -> Result<String, String> {
    let mut out = String::with_capacity(pattern.len() * 2 + 8);
    out.push_str("^(?s:");

    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' => {
                // trailing backslash matches itself
                let c = chars.get(i + 1).copied().unwrap_or('\\');
                push_literal(&mut out, c);
                i += 1;
            }
            '[' => {
                i = translate_class(&chars, i, &mut out)?;
            }
            c => push_literal(&mut out, c),
        }
        i += 1;
    }

    out.push_str(")$");
    Ok(out)
}

/// Translate the bracket class starting at `chars[start] == '['`.
///
/// Returns the index of the closing `]`.
fn translate_class(chars: &[char], start: usize, out: &mut String) -> Result<usize, String> {
    let mut i = start + 1;
    let mut class = String::from("[");

    if matches!(chars.get(i), Some('!' | '^')) {
        class.push('^');
        i += 1;
    }

    let body_start = i;
    loop {
        let Some(&c) = chars.get(i) else {
            return Err(format!("unterminated character class at position {start}"));
        };
        match c {
            // `]` right after the opening bracket is a literal member
            ']' if i > body_start => break,
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .copied()
                    .ok_or_else(|| format!("dangling escape in character class at position {start}"))?;
                push_class_literal(&mut class, escaped);
                i += 1;
            }
            '-' if i > body_start && chars.get(i + 1).is_some_and(|n| *n != ']') => class.push('-'),
            c => push_class_literal(&mut class, c),
        }
        i += 1;
    }

    class.push(']');
    out.push_str(&class);
    Ok(i)
}

fn push_literal(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

fn push_class_literal(class: &mut String, c: char) {
    if matches!(c, '\\' | '[' | ']' | '^' | '-' | '&' | '~') {
        class.push('\\');
    }
    class.push(c);
}
