//! Prompt extraction — user questions, classified by move and stage.
//!
//! Any line of a user-authored message containing `?` is a prompt. The
//! move and stage classifiers are deliberately shallow keyword
//! heuristics; first match wins and the defaults (Investigate, Nigredo)
//! carry everything that matches nothing.

use athanor_core::{
  chat::{Chat, ChatMessage, MoveType, Prompt},
  graph::{Entity, entity_kind},
};

/// Extract classified prompts from a chat's messages. `catalog` supplies
/// the scholar- and text-typed names checked for the mention flags.
pub fn extract_prompts(
  chat: &Chat,
  messages: &[ChatMessage],
  catalog: &[Entity],
) -> Vec<Prompt> {
  let scholars: Vec<&Entity> =
    catalog.iter().filter(|e| e.kind == entity_kind::SCHOLAR).collect();
  let texts: Vec<&Entity> =
    catalog.iter().filter(|e| e.kind == entity_kind::TEXT).collect();

  let mut prompts = Vec::new();
  for msg in messages.iter().filter(|m| m.is_user_authored()) {
    for line in msg.content.lines() {
      if !line.contains('?') {
        continue;
      }
      let text = line.trim().to_owned();
      let lower = text.to_lowercase();

      prompts.push(Prompt {
        chat_id:          chat.id.clone(),
        move_type:        classify_move(&lower),
        opus_stage:       classify_stage(&lower).to_owned(),
        order_index:      prompts.len() as u32,
        mentions_scholar: first_mentioned(&lower, &scholars),
        mentions_text:    first_mentioned(&lower, &texts),
        text,
      });
    }
  }
  prompts
}

fn classify_move(lower: &str) -> MoveType {
  if lower.contains("summarize") {
    MoveType::Summarize
  } else if lower.contains("table") {
    MoveType::Tabulate
  } else if lower.contains("link")
    || lower.contains("compare")
    || lower.contains("relationship")
  {
    MoveType::CrossReference
  } else if lower.contains("critique")
    || lower.contains("evaluate")
    || lower.contains("bias")
  {
    MoveType::Critique
  } else {
    MoveType::Investigate
  }
}

fn classify_stage(lower: &str) -> &'static str {
  const ALBEDO: [&str; 5] = ["white", "purif", "clean", "silver", "moon"];
  const CITRINITAS: [&str; 5] = ["yellow", "gold", "sun", "solar", "citrin"];
  const RUBEDO: [&str; 6] = ["red", "blood", "stone", "fire", "king", "rubedo"];

  if ALBEDO.iter().any(|w| lower.contains(w)) {
    "Albedo"
  } else if CITRINITAS.iter().any(|w| lower.contains(w)) {
    "Citrinitas"
  } else if RUBEDO.iter().any(|w| lower.contains(w)) {
    "Rubedo"
  } else {
    "Nigredo"
  }
}

/// First catalog name appearing (case-insensitive substring) in the
/// prompt, in catalog order. Returns the canonical (stored) casing.
fn first_mentioned(lower: &str, entities: &[&Entity]) -> Option<String> {
  entities
    .iter()
    .find(|e| lower.contains(&e.name.to_lowercase()))
    .map(|e| e.name.clone())
}

#[cfg(test)]
mod tests {
  use athanor_core::graph::AttrMap;

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

  fn entity(id: i64, name: &str, kind: &str) -> Entity {
    Entity {
      id,
      name: name.to_owned(),
      kind: kind.to_owned(),
      attributes: AttrMap::new(),
    }
  }

  #[test]
  fn only_user_question_lines_become_prompts() {
    let messages = vec![
      msg(0, "user", "Hello there.\nWhat is the prima materia?"),
      msg(1, "assistant", "Is this a question? The assistant asked it."),
      msg(2, "you", "And the philosopher's stone?"),
    ];
    let prompts = extract_prompts(&chat(), &messages, &[]);
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0].text, "What is the prima materia?");
    assert_eq!(prompts[1].text, "And the philosopher's stone?");
    // Dense per-chat ordering, independent of message indices.
    assert_eq!(prompts[0].order_index, 0);
    assert_eq!(prompts[1].order_index, 1);
  }

  #[test]
  fn move_heuristic_matches_in_declared_order() {
    let cases = [
      ("Can you summarize the Ripley Scroll?", MoveType::Summarize),
      ("Could you put the metals in a table?", MoveType::Tabulate),
      ("How do these two emblems compare?", MoveType::CrossReference),
      ("Can you evaluate the author's bias?", MoveType::Critique),
      ("What is the green lion?", MoveType::Investigate),
      // "summarize" outranks "table" when both appear.
      ("Summarize this table for me?", MoveType::Summarize),
    ];
    for (text, expected) in cases {
      let prompts = extract_prompts(&chat(), &[msg(0, "user", text)], &[]);
      assert_eq!(prompts[0].move_type, expected, "{text}");
    }
  }

  #[test]
  fn stage_heuristic_defaults_to_nigredo() {
    let cases = [
      ("Why is purification done under the moon?", "Albedo"),
      ("What does the yellowing to gold signify?", "Citrinitas"),
      ("Is the red king consumed by fire?", "Rubedo"),
      ("What happens during putrefaction?", "Nigredo"),
    ];
    for (text, expected) in cases {
      let prompts = extract_prompts(&chat(), &[msg(0, "user", text)], &[]);
      assert_eq!(prompts[0].opus_stage, expected, "{text}");
    }
  }

  #[test]
  fn mention_flags_use_canonical_casing() {
    let catalog = vec![
      entity(1, "Carl Jung", entity_kind::SCHOLAR),
      entity(2, "Ripley Scroll", entity_kind::TEXT),
      entity(3, "Mercury", entity_kind::MATERIAL),
    ];
    let messages = vec![msg(
      0,
      "user",
      "What did carl jung write about the ripley scroll and mercury?",
    )];
    let prompts = extract_prompts(&chat(), &messages, &catalog);
    assert_eq!(prompts[0].mentions_scholar.as_deref(), Some("Carl Jung"));
    assert_eq!(prompts[0].mentions_text.as_deref(), Some("Ripley Scroll"));
  }

  #[test]
  fn no_catalog_hit_leaves_flags_empty() {
    let catalog = vec![entity(1, "Carl Jung", entity_kind::SCHOLAR)];
    let prompts = extract_prompts(
      &chat(),
      &[msg(0, "user", "What is calcination?")],
      &catalog,
    );
    assert_eq!(prompts[0].mentions_scholar, None);
    assert_eq!(prompts[0].mentions_text, None);
  }
}
