//! Canned 8×8 patterns for the LED matrix convenience blocks.
//!
//! Each pattern is the 16-character hex form produced by
//! [`LedBitmap::to_hex`](super::matrix::LedBitmap::to_hex): one byte per row,
//! row 0 first, column 0 in the least significant bit.

/// Letters `A`–`Z`, digits `0`–`9`, then pictograms.
pub const GLYPHS: &[(&str, &str)] = &[
    ("A", "1C22223E22222200"),
    ("B", "1E22221E22221E00"),
    ("C", "1C22020202221C00"),
    ("D", "1E22222222221E00"),
    ("E", "3E02021E02023E00"),
    ("F", "3E02021E02020200"),
    ("G", "1C22023A22223C00"),
    ("H", "2222223E22222200"),
    ("I", "1C08080808081C00"),
    ("J", "7020202020221C00"),
    ("K", "22120A060A122200"),
    ("L", "0202020202023E00"),
    ("M", "22362A2A22222200"),
    ("N", "22262A3222222200"),
    ("O", "1C22222222221C00"),
    ("P", "1E22221E02020200"),
    ("Q", "1C2222222A122C00"),
    ("R", "1E22221E0A122200"),
    ("S", "3C02021C20201E00"),
    ("T", "3E08080808080800"),
    ("U", "2222222222221C00"),
    ("V", "2222222222140800"),
    ("W", "2222222A2A362200"),
    ("X", "2222140814222200"),
    ("Y", "2222140808080800"),
    ("Z", "3E20100804023E00"),
    ("0", "1C22322A26221C00"),
    ("1", "080C080808081C00"),
    ("2", "1C22201008043E00"),
    ("3", "3E10081020221C00"),
    ("4", "101814123E101000"),
    ("5", "3E021E2020221C00"),
    ("6", "1804021E22221C00"),
    ("7", "3E20100804040400"),
    ("8", "1C22221C22221C00"),
    ("9", "1C22223C20100C00"),
    ("heart", "0036FFFF7E3C1800"),
    ("small_heart", "0000143E3E1C0800"),
    ("smile", "3C42A581A599423C"),
    ("sad", "3C42A58199A5423C"),
    ("surprised", "3C42A5819999423C"),
    ("angry", "3C42C3A581BD423C"),
    ("wink", "3C4285E1A599423C"),
    ("sleepy", "3C4281E78199423C"),
    ("arrow_up", "183C7EFF18181818"),
    ("arrow_down", "18181818FF7E3C18"),
    ("arrow_left", "080C0EFFFF0E0C08"),
    ("arrow_right", "103070FFFF703010"),
    ("check", "0080C061331E0C00"),
    ("cross", "8142241818244281"),
    ("square", "FF818181818181FF"),
    ("small_square", "00003C24243C0000"),
    ("diamond", "1824428181422418"),
    ("triangle", "001824244242FF00"),
    ("circle", "3C4281818181423C"),
    ("star", "1818FF7E3C66C300"),
    ("music", "784848486E6F0600"),
    ("umbrella", "187EFF0808080A04"),
    ("house", "183C7EFF425A5A7E"),
    ("tree", "183C7E3C7EFF1818"),
    ("rabbit", "1212121E2D3F1E12"),
    ("cat", "41637F557F493E00"),
    ("duck", "0C0A0F04FC7C3800"),
    ("ghost", "3C7EDBFFFFFFDB89"),
    ("skull", "7EFF9999FF663C24"),
    ("rocket", "183C243C3C7EDB99"),
    ("pacman", "3C7E2F1F1F3F7E3C"),
    ("checker", "55AA55AA55AA55AA"),
];

/// Look up a glyph pattern by name.
///
/// Letters match case-insensitively; pictogram names are lowercase with
/// underscores (`"small_heart"`).
#[must_use]
pub fn find(name: &str) -> Option<&'static str> {
    let name = name.trim();
    GLYPHS
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, hex)| *hex)
}

/// Names of every glyph, in table order.
pub fn names() -> impl Iterator<Item = &'static str> {
    GLYPHS.iter().map(|(name, _)| *name)
}
