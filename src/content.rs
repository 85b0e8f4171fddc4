//! Built-in reference content: the passage, quiz, skim signposts, hunt targets
//! and debate arguments. Loaded synchronously at startup and read-only after.

use crate::domain::{ArticleSection, DebateArgument, DebateSide, HuntTarget, QuizQuestion};

pub const ARTICLE_TITLE: &str = "为什么要简化汉字";

/// Immutable content shared by every session.
#[derive(Clone, Debug)]
pub struct ContentStore {
  pub title: String,
  pub sections: Vec<ArticleSection>,
  pub quiz: Vec<QuizQuestion>,
  pub signposts: Vec<String>,
  pub skimming_tips: Vec<String>,
  pub hunt_targets: Vec<HuntTarget>,
  pub debate: Vec<DebateArgument>,
  pub preset_concepts: Vec<String>,
}

impl ContentStore {
  /// Passage text joined with single spaces; used as the grading context.
  pub fn full_text(&self) -> String {
    self
      .sections
      .iter()
      .map(|s| s.content.as_str())
      .collect::<Vec<_>>()
      .join(" ")
  }

  pub fn question(&self, id: u32) -> Option<&QuizQuestion> {
    self.quiz.iter().find(|q| q.id == id)
  }

  pub fn argument(&self, id: &str) -> Option<&DebateArgument> {
    self.debate.iter().find(|a| a.id == id)
  }

  pub fn is_signpost(&self, text: &str) -> bool {
    self.signposts.iter().any(|s| s == text)
  }

  pub fn builtin() -> Self {
    Self {
      title: ARTICLE_TITLE.into(),
      sections: builtin_sections(),
      quiz: builtin_quiz(),
      signposts: ["首先", "其次", "最后", "综上所述"].map(String::from).to_vec(),
      skimming_tips: [
        "略读法可以增加阅读的数量，扩大视野。",
        "略读法可以增广见闻，提高阅读效率。",
        "略读法可以迅速掌握文章大意和要点。",
        "找出文中“路标”（如：首先、其次、最后）。",
      ]
      .map(String::from)
      .to_vec(),
      hunt_targets: builtin_hunt_targets(),
      debate: builtin_debate(),
      preset_concepts: ["Horse (Ma)", "Door (Men)", "Learn (Xue)", "Dragon (Long)"]
        .map(String::from)
        .to_vec(),
    }
  }
}

fn section(id: &str, content: &str) -> ArticleSection {
  ArticleSection { id: id.into(), content: content.into() }
}

fn builtin_sections() -> Vec<ArticleSection> {
  vec![
    section("intro", "很长一段时间，网络上有些人认为应该坚持使用繁体字，不应该简化汉字。他们认为简化后的汉字没有了汉字基本的象形含义，缺乏美感。我认为人们之所以有这种想法是因为对汉字的发展缺乏了解，很容易“跟风跑”，从而赞同使用繁体字。"),
    section("point1", "首先，大家应该明白文字最初的用途是记录。对于记录来说，最关键的是高效。古代刚出现文字时，是用刻字的方式来记录的，如果笔画太复杂，不但占的面积大，速度也慢。后来，中国人发明了印刷术，对部分汉字的笔画进行简化。笔画太多，印出来的字可能会看不清楚。从那时起，人们对文字进行了严格的规范，要求字形保持一致。于是文字就得到了统一，书写效率就更高了。"),
    section("point2", "其次，文字要具备可识别性和易书写性，这样才能很好地传承下去。从汉字的发展过程来看，古代的汉字只有社会上层人士才会书写和识别。但随着不同朝代对文字的简化，不仅社会上层人士能写能认，很多平民也会写会认，这样的简化是为提高汉字的易书写性和易读性。"),
    section("point3", "最后，因为新中国成立后，不识字的人有四亿之多，教这些人认字、写字是个大问题。因此，我们需要简化汉字来提高书写效率和易识别性。于是，汉字又开始了新一轮的简化。"),
    section("conclusion", "综上所述，不论是从汉字的历史发展来看，还是从汉字的书写和交流需要来看，汉字确实需要简化。"),
  ]
}

fn builtin_quiz() -> Vec<QuizQuestion> {
  [
    "为什么有些人不同意简化汉字？",
    "为什么有些人会“跟风跑”？",
    "“跟风跑”是什么意思？",
    "文字最初的用途是什么？",
    "古代人是如何记录文字的？",
    "为什么中国人发明了印刷术就要对汉字进行简化？",
    "文字要传承下去需要具备什么特点？",
    "古代的汉字发展存在什么问题？",
    "为什么中国不同的朝代都要对汉字进行简化？",
    "新中国成立后，有多少人不识字？",
  ]
  .iter()
  .zip(1u32..)
  .map(|(q, id)| QuizQuestion { id, question: (*q).into() })
  .collect()
}

fn builtin_hunt_targets() -> Vec<HuntTarget> {
  [
    ("效率", "Find the word for 'Efficiency' (Key reason for simplification)"),
    ("印刷术", "Find the word for 'Printing Technology' (Invention that required clearer characters)"),
    ("传承", "Find the word for 'Inherit/Pass down' (Why texts need to be readable)"),
    ("平民", "Find the word for 'Common People' (Who gained access to literacy)"),
    ("象形", "Find the word for 'Pictographic' (The meaning some say was lost)"),
  ]
  .iter()
  .map(|(term, clue)| HuntTarget { term: (*term).into(), clue: (*clue).into() })
  .collect()
}

fn builtin_debate() -> Vec<DebateArgument> {
  [
    ("a1", "Lacks aesthetic beauty (缺乏美感)", DebateSide::Anti),
    ("a2", "Loses pictographic meaning (象形含义)", DebateSide::Anti),
    ("a3", "Increases writing efficiency (书写效率)", DebateSide::Pro),
    ("a4", "Easier for common people to learn (易书写性)", DebateSide::Pro),
    ("a5", "Clearer for printing (印刷清晰)", DebateSide::Pro),
    ("a6", "Traditional heritage (传统文化)", DebateSide::Anti),
  ]
  .iter()
  .map(|(id, text, side)| DebateArgument { id: (*id).into(), text: (*text).into(), side: *side })
  .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_signpost_and_hunt_term_occurs_in_the_passage() {
    let store = ContentStore::builtin();
    let text = store.full_text();
    for s in &store.signposts {
      assert!(text.contains(s.as_str()), "signpost {s} missing from passage");
    }
    for t in &store.hunt_targets {
      assert!(text.contains(t.term.as_str()), "hunt term {} missing from passage", t.term);
    }
  }

  #[test]
  fn full_text_joins_sections_in_order_with_spaces() {
    let store = ContentStore::builtin();
    let text = store.full_text();
    assert!(text.starts_with("很长一段时间"));
    assert!(text.ends_with("汉字确实需要简化。"));
    assert_eq!(text.matches(' ').count(), store.sections.len() - 1);
  }

  #[test]
  fn lookups() {
    let store = ContentStore::builtin();
    assert_eq!(store.quiz.len(), 10);
    assert_eq!(store.question(4).map(|q| q.question.as_str()), Some("文字最初的用途是什么？"));
    assert!(store.question(11).is_none());
    assert_eq!(store.argument("a5").map(|a| a.side), Some(DebateSide::Pro));
    assert!(store.is_signpost("综上所述"));
    assert!(!store.is_signpost("综上"));
  }
}
