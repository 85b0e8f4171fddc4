//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// No nesting or conditionals.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// True if unicode char belongs to CJK ranges.
pub fn is_cjk(ch: char) -> bool {
  ('\u{4E00}'..='\u{9FFF}').contains(&ch)
    || ('\u{3400}'..='\u{4DBF}').contains(&ch)
    || ('\u{20000}'..='\u{2A6DF}').contains(&ch)
    || ('\u{2A700}'..='\u{2B73F}').contains(&ch)
    || ('\u{2B740}'..='\u{2B81F}').contains(&ch)
    || ('\u{2B820}'..='\u{2CEAF}').contains(&ch)
    || ('\u{F900}'..='\u{FAFF}').contains(&ch)
}

/// Log-safe preview of user text. Counts chars, not bytes, so Hanzi never split.
pub fn trunc_for_log(s: &str, max_chars: usize) -> String {
  let total = s.chars().count();
  if total <= max_chars {
    s.to_string()
  } else {
    let head: String = s.chars().take(max_chars).collect();
    format!("{}… ({} chars total)", head, total)
  }
}
