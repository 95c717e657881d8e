//! Prompt construction.
//!
//! Turns retrieved chunks, recent conversation turns, and the user's
//! question into a single rendered [`Prompt`]. Pure functions: no I/O, no
//! side effects — output depends only on the inputs, which keeps the prompt
//! shape trivially testable.

use crate::models::{Chunk, ConversationTurn, Prompt};

/// Shown in place of the history block for the first question of a session,
/// so the template never has a dangling section.
const EMPTY_HISTORY_PLACEHOLDER: &str = "(no previous conversation)";

/// Build the prompt for one question.
///
/// The context block concatenates chunk texts in retrieval order, separated
/// by blank lines. The history block holds the last `max_turns` exchanges,
/// most recent last. The question is included verbatim.
pub fn assemble(
    chunks: &[Chunk],
    history: &[ConversationTurn],
    max_turns: usize,
    question: &str,
) -> Prompt {
    let context = chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let text = format!(
        "You are an intelligent document assistant. Your role is to help users \
understand and extract information from their loaded documents.\n\
\n\
INSTRUCTIONS:\n\
- Answer questions based ONLY on the provided context from the documents\n\
- If the answer is not in the documents, clearly state that\n\
- Be concise but comprehensive\n\
- Use bullet points for lists\n\
- Quote relevant passages when appropriate\n\
\n\
CONTEXT FROM DOCUMENTS:\n\
{}\n\
\n\
CHAT HISTORY:\n\
{}\n\
\n\
USER QUESTION: {}\n\
\n\
RESPONSE:",
        context,
        format_history(history, max_turns),
        question
    );

    Prompt { text }
}

/// Render the last `max_turns` exchanges as alternating Q/A lines, most
/// recent last. Empty history renders as a fixed placeholder.
fn format_history(history: &[ConversationTurn], max_turns: usize) -> String {
    if history.is_empty() {
        return EMPTY_HISTORY_PLACEHOLDER.to_string();
    }

    let start = history.len().saturating_sub(max_turns);
    history[start..]
        .iter()
        .map(|turn| format!("Q: {}\nA: {}", turn.question, turn.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(index: i64, text: &str) -> Chunk {
        Chunk {
            id: format!("c{}", index),
            source_name: "doc.pdf".to_string(),
            page_number: Some(1),
            chunk_index: index,
            text: text.to_string(),
            hash: String::new(),
        }
    }

    fn turn(i: usize) -> ConversationTurn {
        ConversationTurn {
            question: format!("question {}", i),
            answer: format!("answer {}", i),
        }
    }

    #[test]
    fn includes_chunks_in_retrieval_order() {
        let chunks = vec![chunk(0, "first passage"), chunk(1, "second passage")];
        let prompt = assemble(&chunks, &[], 5, "what?");
        let first = prompt.text.find("first passage").unwrap();
        let second = prompt.text.find("second passage").unwrap();
        assert!(first < second);
        assert!(prompt.text.contains("first passage\n\nsecond passage"));
    }

    #[test]
    fn empty_history_uses_placeholder() {
        let prompt = assemble(&[chunk(0, "context passage")], &[], 5, "what?");
        assert!(prompt.text.contains("(no previous conversation)"));
    }

    #[test]
    fn history_limited_to_max_turns_most_recent_last() {
        let history: Vec<ConversationTurn> = (0..7).map(turn).collect();
        let prompt = assemble(&[chunk(0, "context passage")], &history, 5, "what?");

        assert!(!prompt.text.contains("question 0"));
        assert!(!prompt.text.contains("question 1"));
        for i in 2..7 {
            assert!(prompt.text.contains(&format!("question {}", i)));
        }
        let q5 = prompt.text.find("question 5").unwrap();
        let q6 = prompt.text.find("question 6").unwrap();
        assert!(q5 < q6);
    }

    #[test]
    fn question_appears_verbatim() {
        let question = "Why did revenue fall in Q3?";
        let prompt = assemble(&[chunk(0, "context passage")], &[], 5, question);
        assert!(prompt.text.contains(&format!("USER QUESTION: {}", question)));
    }

    #[test]
    fn pure_function_is_deterministic() {
        let chunks = vec![chunk(0, "alpha"), chunk(1, "beta")];
        let history = vec![turn(1)];
        let a = assemble(&chunks, &history, 5, "q");
        let b = assemble(&chunks, &history, 5, "q");
        assert_eq!(a.text, b.text);
    }
}
