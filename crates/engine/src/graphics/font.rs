//! 3x5 bitmap font shared by every surface so text metrics agree between the
//! software rasterizer and recorded output.

pub const GLYPH_WIDTH: u32 = 3;
pub const GLYPH_HEIGHT: u32 = 5;

// Rows are top to bottom; bit 2 is the leftmost column. Covers ' '..='`'.
const LOW_ASCII: [[u8; 5]; 65] = [
    [0, 0, 0, 0, 0], // ' '
    [2, 2, 2, 0, 2], // !
    [5, 5, 0, 0, 0], // "
    [5, 7, 5, 7, 5], // #
    [7, 6, 7, 3, 7], // $
    [5, 1, 2, 4, 5], // %
    [2, 5, 2, 5, 3], // &
    [2, 2, 0, 0, 0], // '
    [1, 2, 2, 2, 1], // (
    [4, 2, 2, 2, 4], // )
    [0, 5, 2, 5, 0], // *
    [0, 2, 7, 2, 0], // +
    [0, 0, 0, 2, 4], // ,
    [0, 0, 7, 0, 0], // -
    [0, 0, 0, 0, 2], // .
    [1, 1, 2, 4, 4], // /
    [7, 5, 5, 5, 7], // 0
    [2, 6, 2, 2, 7], // 1
    [7, 1, 7, 4, 7], // 2
    [7, 1, 7, 1, 7], // 3
    [5, 5, 7, 1, 1], // 4
    [7, 4, 7, 1, 7], // 5
    [7, 4, 7, 5, 7], // 6
    [7, 1, 2, 2, 2], // 7
    [7, 5, 7, 5, 7], // 8
    [7, 5, 7, 1, 7], // 9
    [0, 2, 0, 2, 0], // :
    [0, 2, 0, 2, 4], // ;
    [1, 2, 4, 2, 1], // <
    [0, 7, 0, 7, 0], // =
    [4, 2, 1, 2, 4], // >
    [7, 1, 3, 0, 2], // ?
    [7, 5, 7, 4, 7], // @
    [2, 5, 7, 5, 5], // A
    [6, 5, 6, 5, 6], // B
    [7, 4, 4, 4, 7], // C
    [6, 5, 5, 5, 6], // D
    [7, 4, 6, 4, 7], // E
    [7, 4, 6, 4, 4], // F
    [7, 4, 5, 5, 7], // G
    [5, 5, 7, 5, 5], // H
    [7, 2, 2, 2, 7], // I
    [7, 1, 1, 5, 7], // J
    [5, 5, 6, 5, 5], // K
    [4, 4, 4, 4, 7], // L
    [5, 7, 7, 5, 5], // M
    [5, 7, 7, 7, 5], // N
    [7, 5, 5, 5, 7], // O
    [6, 5, 6, 4, 4], // P
    [7, 5, 5, 7, 1], // Q
    [6, 5, 6, 5, 5], // R
    [7, 4, 7, 1, 7], // S
    [7, 2, 2, 2, 2], // T
    [5, 5, 5, 5, 7], // U
    [5, 5, 5, 5, 2], // V
    [5, 5, 7, 7, 5], // W
    [5, 5, 2, 5, 5], // X
    [5, 5, 2, 2, 2], // Y
    [7, 1, 2, 4, 7], // Z
    [6, 4, 4, 4, 6], // [
    [4, 4, 2, 1, 1], // \
    [3, 1, 1, 1, 3], // ]
    [2, 5, 0, 0, 0], // ^
    [0, 0, 0, 0, 7], // _
    [4, 2, 0, 0, 0], // `
];

const FALLBACK: [u8; 5] = [7, 1, 3, 0, 2];

/// Lowercase renders with the uppercase glyphs; anything outside printable
/// ASCII renders as '?'.
pub fn glyph_rows(ch: char) -> [u8; 5] {
    match ch {
        ' '..='`' => LOW_ASCII[ch as usize - ' ' as usize],
        'a'..='z' => LOW_ASCII[ch.to_ascii_uppercase() as usize - ' ' as usize],
        '{' => [3, 2, 6, 2, 3],
        '|' => [2, 2, 2, 2, 2],
        '}' => [6, 2, 3, 2, 6],
        '~' => [0, 3, 6, 0, 0],
        _ => FALLBACK,
    }
}

pub fn glyph_advance(scale: f32) -> f32 {
    (GLYPH_WIDTH + 1) as f32 * scale
}

/// Rendered width without the trailing inter-glyph gap.
pub fn text_width(text: &str, scale: f32) -> f32 {
    let count = text.chars().count();
    if count == 0 {
        return 0.0;
    }
    count as f32 * glyph_advance(scale) - scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercase_matches_uppercase() {
        assert_eq!(glyph_rows('k'), glyph_rows('K'));
    }

    #[test]
    fn unknown_characters_fall_back() {
        assert_eq!(glyph_rows('é'), glyph_rows('?'));
    }

    #[test]
    fn text_width_drops_trailing_gap() {
        assert_eq!(text_width("", 2.0), 0.0);
        assert_eq!(text_width("A", 2.0), 6.0);
        assert_eq!(text_width("AB", 2.0), 14.0);
    }
}
