// crates/notifier/src/markdown.rs
//! Escaping for the bot API's MarkdownV2 dialect.

const RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escapes every MarkdownV2 reserved character with a backslash. This is
/// a simple sequential pass, not a parser — it does not special-case an
/// already-escaped character, which matches the upstream bot API's own
/// escaping rules (every reserved character must be escaped, full stop).
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if RESERVED.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_every_reserved_character() {
        assert_eq!(escape_markdown("a.b!c"), "a\\.b\\!c");
        assert_eq!(escape_markdown("[link](url)"), "\\[link\\]\\(url\\)");
    }

    #[test]
    fn leaves_plain_text_untouched() {
        assert_eq!(escape_markdown("hello world"), "hello world");
    }

    #[test]
    fn handles_cyrillic_text_alongside_reserved_characters() {
        assert_eq!(escape_markdown("Аня добавил(а) элемент"), "Аня добавил\\(а\\) элемент");
    }
}
