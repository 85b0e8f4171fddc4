//! Hanzi → Hanyu Pinyin (tone diacritics, space-separated), copy non-Chinese as-is.
//!
//! Example:
//!   输入: "综上所述，汉字 2025！"
//!   输出: "zōng shàng suǒ shù，hàn zì 2025！"
use pinyin::ToPinyin;

/// Convert Chinese text into Hanyu Pinyin with tone diacritics, space-separated.
/// Non-Chinese characters are copied as-is.
///
/// Per-character conversion without word segmentation, so polyphonic characters
/// get their default reading.
pub fn to_pinyin_diacritics(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);

    // Spaces only go between consecutive Hanzi syllables.
    let mut last_was_hanzi = false;

    for ch in text.chars() {
        if let Some(py) = ch.to_pinyin() {
            if last_was_hanzi {
                out.push(' ');
            }
            out.push_str(py.with_tone());
            last_was_hanzi = true;
        } else {
            out.push(ch);
            last_was_hanzi = false;
        }
    }

    out
}
