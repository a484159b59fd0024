use super::*;

#[test]
fn lowercase_shares_uppercase_glyphs() {
    assert_eq!(glyph('a'), glyph('A'));
    assert_eq!(glyph('z'), glyph('Z'));
}

#[test]
fn space_is_empty() {
    assert_eq!(glyph(' '), [0; 7]);
}

#[test]
fn unknown_characters_render_as_a_box() {
    assert_eq!(glyph('€'), FALLBACK);
    assert_eq!(glyph('~'), FALLBACK);
    assert_ne!(glyph('A'), FALLBACK);
}

#[test]
fn glyphs_fit_the_cell() {
    for c in ' '..='z' {
        for row in glyph(c) {
            assert_eq!(row >> GLYPH_WIDTH, 0, "glyph {c:?} overflows its cell");
        }
    }
}

#[test]
fn digits_and_letters_are_distinct() {
    let mut seen = std::collections::HashSet::new();
    for c in ('0'..='9').chain('A'..='Z') {
        assert!(seen.insert(glyph(c)), "duplicate glyph for {c:?}");
    }
}
