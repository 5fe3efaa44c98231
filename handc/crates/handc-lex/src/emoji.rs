//! Character classes for the HAND lexer.
//!
//! Emoji tokenization follows a maximal-run rule: a run starts at a
//! non-ASCII character with the Unicode Emoji property and extends over
//! zero-width joiners, variation selectors and skin-tone modifiers as
//! well as further emoji characters. The whole run is one EMOJI token.

/// Zero-width joiner.
pub const ZWJ: char = '\u{200D}';
/// Variation selector 15 (text presentation).
pub const VS15: char = '\u{FE0E}';
/// Variation selector 16 (emoji presentation).
pub const VS16: char = '\u{FE0F}';

/// True if `c` can start an emoji run.
///
/// ASCII characters are excluded even though `#`, `*` and the digits
/// technically carry the Emoji property (keycap bases); they must lex
/// as operators and numbers.
pub fn is_emoji_start(c: char) -> bool {
    !c.is_ascii() && unic_emoji_char::is_emoji(c)
}

/// True if `c` can extend an emoji run already in progress.
pub fn is_emoji_continue(c: char) -> bool {
    if c == ZWJ || c == VS15 || c == VS16 {
        return true;
    }
    if ('\u{1F3FB}'..='\u{1F3FF}').contains(&c) {
        return true;
    }
    is_emoji_start(c)
}

/// True if `c` is a valid ASCII identifier start.
pub fn is_ascii_ident_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

/// True if `c` may continue an identifier.
///
/// Identifiers must start with ASCII but may continue with non-ASCII
/// alphabetic characters, so `FUNCIÓN` is a single identifier while a
/// leading `Ó` is rejected by the lexer.
pub fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric() || (!c.is_ascii() && c.is_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emoji_start() {
        assert!(is_emoji_start('🎬'));
        assert!(is_emoji_start('🔧'));
        assert!(is_emoji_start('▶'));
        assert!(!is_emoji_start('a'));
        // Keycap bases are ASCII and must not start a run.
        assert!(!is_emoji_start('*'));
        assert!(!is_emoji_start('3'));
        // Letters with diacritics are identifiers, not emoji.
        assert!(!is_emoji_start('Ó'));
    }

    #[test]
    fn test_emoji_continue() {
        assert!(is_emoji_continue(ZWJ));
        assert!(is_emoji_continue(VS15));
        assert!(is_emoji_continue(VS16));
        assert!(is_emoji_continue('\u{1F3FB}'));
        assert!(is_emoji_continue('👩'));
        assert!(!is_emoji_continue(' '));
        assert!(!is_emoji_continue('x'));
    }

    #[test]
    fn test_ident_classes() {
        assert!(is_ascii_ident_start('a'));
        assert!(is_ascii_ident_start('_'));
        assert!(!is_ascii_ident_start('1'));
        assert!(!is_ascii_ident_start('É'));
        assert!(is_ident_continue('9'));
        assert!(is_ident_continue('Ó'));
        assert!(!is_ident_continue('-'));
    }
}
