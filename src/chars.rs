//! Character classes shared by the comment cursor and the type scanner.

use unicode_xid::UnicodeXID;

/// Punctuation that terminates a type name.
const TYPE_PUNCTUATION: &str = "><(){}[],:*|?!=";

#[inline]
pub fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Whitespace that is not a line terminator.
#[inline]
pub fn is_white_space(ch: char) -> bool {
    matches!(
        ch,
        ' ' | '\t'
            | '\u{000B}' // vertical tab
            | '\u{000C}' // form feed
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{180E}'
            | '\u{2000}'..='\u{200A}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

#[inline]
pub fn is_octal_digit(ch: char) -> bool {
    matches!(ch, '0'..='7')
}

#[inline]
pub fn is_identifier_start(ch: char) -> bool {
    matches!(ch, '$' | '_' | '\\')
        || ch.is_ascii_alphabetic()
        || (!ch.is_ascii() && ch.is_xid_start())
}

#[inline]
pub fn is_identifier_part(ch: char) -> bool {
    matches!(ch, '$' | '_' | '\\' | '\u{200C}' | '\u{200D}')
        || ch.is_ascii_alphanumeric()
        || (!ch.is_ascii() && ch.is_xid_continue())
}

/// Whether `ch` may appear inside a type name token.
#[inline]
pub fn is_type_name(ch: char) -> bool {
    !TYPE_PUNCTUATION.contains(ch) && !is_white_space(ch) && !is_line_terminator(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_space_excludes_line_terminators() {
        assert!(is_white_space('\u{3000}'));
        assert!(is_white_space('\t'));
        assert!(!is_white_space('\n'));
        assert!(is_line_terminator('\u{2028}'));
    }

    #[test]
    fn test_identifier_classes() {
        assert!(is_identifier_start('$'));
        assert!(is_identifier_start('é'));
        assert!(!is_identifier_start('1'));
        assert!(is_identifier_part('1'));
        assert!(!is_identifier_part('-'));
    }

    #[test]
    fn test_type_name_characters() {
        assert!(is_type_name('.'));
        assert!(is_type_name('"'));
        assert!(!is_type_name('|'));
        assert!(!is_type_name(' '));
    }
}
