//! Table mining — lifts row-oriented tables out of chat messages.
//!
//! Two encodings are recognised: inline pipe-delimited grids and
//! embedded `<table>` markup. At most one extraction path runs per
//! message; the markup path is skipped whenever the delimited path
//! already produced tables, so the same content is never recorded
//! twice.

use std::sync::OnceLock;

use athanor_core::chat::{Chat, ChatMessage, MinedTable};
use regex::Regex;
use scraper::{Html, Selector};

/// Truncation applied to the preceding-message prompt text.
const PROMPT_MAX: usize = 240;
/// Truncation applied to the derived title.
const TITLE_MAX: usize = 50;

fn grid_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    // Header row, separator row, then one or more body rows.
    Regex::new(r"\|.*\|.*\n\|[\s|:-]+\n(?:\|.*\|.*\n)+")
      .expect("literal grid pattern")
  })
}

/// Mine every table in a chat's messages, pairing each with the text of
/// the message that preceded it.
pub fn mine_tables(chat: &Chat, messages: &[ChatMessage]) -> Vec<MinedTable> {
  let mut mined = Vec::new();

  for (i, msg) in messages.iter().enumerate() {
    let bodies = extract_from_message(&msg.content);
    if bodies.is_empty() {
      continue;
    }

    let prompt_text = if i > 0 { messages[i - 1].content.as_str() } else { "" };
    let prompt = truncate(prompt_text, PROMPT_MAX);
    let title =
      truncate(prompt_text.lines().next().unwrap_or_default(), TITLE_MAX);

    for content in bodies {
      mined.push(MinedTable {
        chat_id: chat.id.clone(),
        content,
        prompt: prompt.clone(),
        title: title.clone(),
        topic: chat.topic.clone(),
      });
    }
  }

  mined
}

/// One extraction path per message: delimited grids win, markup is the
/// fallback.
fn extract_from_message(content: &str) -> Vec<String> {
  let delimited = extract_delimited(content);
  if !delimited.is_empty() {
    return delimited;
  }
  if content.contains("<table") {
    return extract_markup(content);
  }
  Vec::new()
}

fn extract_delimited(content: &str) -> Vec<String> {
  // Cheap gate before the regex runs, as the vast majority of messages
  // contain no grid at all.
  if !(content.contains('|') && content.contains("---")) {
    return Vec::new();
  }
  // A grid at the very end of a message still needs its closing newline.
  let mut normalized = content.to_owned();
  if !normalized.ends_with('\n') {
    normalized.push('\n');
  }
  grid_pattern()
    .find_iter(&normalized)
    .map(|m| m.as_str().trim_end().to_owned())
    .collect()
}

/// Normalise embedded `<table>` markup into the same pipe-grid shape the
/// delimited path produces.
fn extract_markup(content: &str) -> Vec<String> {
  let table_sel = Selector::parse("table").expect("literal selector");
  let row_sel = Selector::parse("tr").expect("literal selector");
  let cell_sel = Selector::parse("th, td").expect("literal selector");

  let fragment = Html::parse_fragment(content);
  let mut tables = Vec::new();

  for table in fragment.select(&table_sel) {
    let mut lines = Vec::new();
    for row in table.select(&row_sel) {
      let cells: Vec<String> = row
        .select(&cell_sel)
        .map(|c| c.text().collect::<String>().trim().to_owned())
        .collect();
      if !cells.is_empty() {
        lines.push(format!("| {} |", cells.join(" | ")));
      }
    }
    if !lines.is_empty() {
      tables.push(lines.join("\n"));
    }
  }

  tables
}

fn truncate(text: &str, max: usize) -> String {
  let text = text.trim();
  if text.chars().count() <= max {
    return text.to_owned();
  }
  let cut: String = text.chars().take(max.saturating_sub(1)).collect();
  format!("{cut}…")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn chat() -> Chat {
    Chat {
      id:         "c1".to_owned(),
      title:      "t".to_owned(),
      created_at: None,
      topic:      "Alchemy".to_owned(),
      path:       "p".to_owned(),
    }
  }

  fn msg(i: u32, role: &str, content: &str) -> ChatMessage {
    ChatMessage {
      chat_id:     "c1".to_owned(),
      role:        role.to_owned(),
      content:     content.to_owned(),
      order_index: i,
    }
  }

  const GRID: &str = "\
| Metal | Planet |\n\
|---|---|\n\
| Gold | Sun |\n\
| Silver | Moon |";

  #[test]
  fn mines_delimited_grid_with_prompt_and_title() {
    let messages = vec![
      msg(0, "user", "Tabulate the seven metals and their planets, please."),
      msg(1, "assistant", &format!("Here you go:\n\n{GRID}\n\nAnything else?")),
    ];
    let mined = mine_tables(&chat(), &messages);
    assert_eq!(mined.len(), 1);
    assert_eq!(mined[0].content, GRID);
    assert_eq!(
      mined[0].title,
      "Tabulate the seven metals and their planets, plea…"
    );
    assert_eq!(mined[0].topic, "Alchemy");
  }

  #[test]
  fn mines_markup_table_when_no_grid_present() {
    let html = "<table><tr><th>Stage</th><th>Color</th></tr>\
                <tr><td>Nigredo</td><td>Black</td></tr></table>";
    let messages =
      vec![msg(0, "user", "stages?"), msg(1, "assistant", html)];
    let mined = mine_tables(&chat(), &messages);
    assert_eq!(mined.len(), 1);
    assert_eq!(mined[0].content, "| Stage | Color |\n| Nigredo | Black |");
  }

  #[test]
  fn markup_path_is_skipped_when_grid_already_matched() {
    let both = format!(
      "{GRID}\n\n<table><tr><td>Gold</td><td>Sun</td></tr></table>"
    );
    let messages = vec![msg(0, "user", "?"), msg(1, "assistant", &both)];
    let mined = mine_tables(&chat(), &messages);
    assert_eq!(mined.len(), 1);
    assert_eq!(mined[0].content, GRID);
  }

  #[test]
  fn message_without_table_yields_nothing() {
    let messages = vec![msg(0, "assistant", "plain | prose, no table")];
    assert!(mine_tables(&chat(), &messages).is_empty());
  }

  #[test]
  fn first_message_table_gets_empty_prompt() {
    let messages = vec![msg(0, "assistant", GRID)];
    let mined = mine_tables(&chat(), &messages);
    assert_eq!(mined.len(), 1);
    assert_eq!(mined[0].prompt, "");
    assert_eq!(mined[0].title, "");
  }
}
