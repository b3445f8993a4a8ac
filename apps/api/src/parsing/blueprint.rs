//! Blueprint Parser — turns the test-generation agent's text blueprint into
//! one `QuestionRecord` per competence.
//!
//! Blueprint shape (one block per competence, blocks separated by a `---` line
//! or by the next `COMPETENCE_ID:` line):
//!
//! ````text
//! COMPETENCE_ID: COMP_001
//! TYPE: MCQ
//! QUESTION: What does this print?
//! ```rust
//! println!("{}", 1 + 1);
//! ```
//! OPTION_A: 1
//! OPTION_B: 2
//! OPTION_C: 11
//! OPTION_D: nothing
//! CORRECT_ANSWER: B
//! DIFFICULTY: 2
//! ---
//! ````
//!
//! The parser is a line tokenizer feeding a small accumulator with two states
//! (no field open / field open). It never fails: blocks without a competence id
//! are dropped and unknown lines are continuation text.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Parsed questions keyed by competence id.
pub type QuestionMap = BTreeMap<String, QuestionRecord>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    Mcq,
}

/// One multiple-choice question extracted from a blueprint block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub competence_id: String,
    /// May span several lines and embed a fenced code block.
    pub question: String,
    pub question_type: QuestionType,
    /// `OPTION_A..OPTION_D` in that order, absent or empty ones omitted.
    pub options: Vec<String>,
    /// Trimmed and upper-cased. Not checked against A–D here.
    pub correct_answer: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Tokenizer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum FieldKey {
    CompetenceId,
    Type,
    Question,
    OptionA,
    OptionB,
    OptionC,
    OptionD,
    CorrectAnswer,
    Difficulty,
}

impl FieldKey {
    const ALL: [FieldKey; 9] = [
        FieldKey::CompetenceId,
        FieldKey::Type,
        FieldKey::Question,
        FieldKey::OptionA,
        FieldKey::OptionB,
        FieldKey::OptionC,
        FieldKey::OptionD,
        FieldKey::CorrectAnswer,
        FieldKey::Difficulty,
    ];

    const OPTIONS: [FieldKey; 4] = [
        FieldKey::OptionA,
        FieldKey::OptionB,
        FieldKey::OptionC,
        FieldKey::OptionD,
    ];

    fn label(self) -> &'static str {
        match self {
            FieldKey::CompetenceId => "COMPETENCE_ID",
            FieldKey::Type => "TYPE",
            FieldKey::Question => "QUESTION",
            FieldKey::OptionA => "OPTION_A",
            FieldKey::OptionB => "OPTION_B",
            FieldKey::OptionC => "OPTION_C",
            FieldKey::OptionD => "OPTION_D",
            FieldKey::CorrectAnswer => "CORRECT_ANSWER",
            FieldKey::Difficulty => "DIFFICULTY",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    /// A line holding only `---`.
    Separator,
    /// `KEY: value` for a recognized key, anchored at column 0.
    Field(FieldKey, &'a str),
    /// Anything else: continuation text for the open field.
    Text(&'a str),
}

fn tokenize(line: &str) -> Token<'_> {
    if line.trim() == "---" {
        return Token::Separator;
    }

    for key in FieldKey::ALL {
        let Some(rest) = line.strip_prefix(key.label()) else {
            continue;
        };
        if let Some(value) = rest.trim_start_matches([' ', '\t']).strip_prefix(':') {
            return Token::Field(key, value.trim_start_matches([' ', '\t']));
        }
    }

    Token::Text(line)
}

// ────────────────────────────────────────────────────────────────────────────
// Accumulator
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
enum Cursor<'a> {
    #[default]
    NoFieldOpen,
    FieldOpen { key: FieldKey, lines: Vec<&'a str> },
}

/// Collects the fields of a single block.
#[derive(Debug, Default)]
struct BlockBuilder<'a> {
    fields: HashMap<FieldKey, String>,
    cursor: Cursor<'a>,
}

impl<'a> BlockBuilder<'a> {
    fn open(&mut self, key: FieldKey, first_line: &'a str) {
        self.flush();
        self.cursor = Cursor::FieldOpen {
            key,
            lines: vec![first_line],
        };
    }

    fn push(&mut self, line: &'a str) {
        // Text before any key has nowhere to go.
        if let Cursor::FieldOpen { lines, .. } = &mut self.cursor {
            lines.push(line);
        }
    }

    fn flush(&mut self) {
        if let Cursor::FieldOpen { key, lines } = std::mem::take(&mut self.cursor) {
            self.fields.insert(key, lines.join("\n").trim().to_string());
        }
    }

    fn field(&self, key: FieldKey) -> &str {
        self.fields.get(&key).map(String::as_str).unwrap_or("")
    }

    fn finish(mut self) -> Option<QuestionRecord> {
        self.flush();

        let competence_id = self.field(FieldKey::CompetenceId);
        if competence_id.is_empty() {
            if !self.fields.is_empty() {
                debug!("Skipping blueprint block without COMPETENCE_ID");
            }
            return None;
        }

        let options = FieldKey::OPTIONS
            .iter()
            .map(|key| self.field(*key))
            .filter(|option| !option.is_empty())
            .map(str::to_string)
            .collect();

        Some(QuestionRecord {
            competence_id: competence_id.to_string(),
            question: self.field(FieldKey::Question).to_string(),
            question_type: QuestionType::Mcq,
            options,
            correct_answer: self.field(FieldKey::CorrectAnswer).trim().to_uppercase(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Parser
// ────────────────────────────────────────────────────────────────────────────

/// Parses a blueprint into questions keyed by competence id.
///
/// A later block with the same competence id replaces the earlier one.
pub fn parse_blueprint(blueprint: &str) -> QuestionMap {
    let mut questions = QuestionMap::new();
    let mut block = BlockBuilder::default();

    let mut close_block = |block| {
        if let Some(record) = BlockBuilder::finish(block) {
            questions.insert(record.competence_id.clone(), record);
        }
    };

    for line in blueprint.trim().lines() {
        match tokenize(line) {
            Token::Separator => close_block(std::mem::take(&mut block)),
            Token::Field(FieldKey::CompetenceId, value) => {
                close_block(std::mem::take(&mut block));
                block.open(FieldKey::CompetenceId, value);
            }
            Token::Field(key, value) => block.open(key, value),
            Token::Text(text) => block.push(text),
        }
    }
    close_block(block);

    debug!("Parsed {} questions from blueprint", questions.len());
    questions
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = "COMPETENCE_ID: C1\nTYPE: MCQ\nQUESTION: What is 2+2?\nOPTION_A: 3\nOPTION_B: 4\nOPTION_C: 5\nOPTION_D: 6\nCORRECT_ANSWER: B\nDIFFICULTY: 1\n---";

    /// Writes questions back in blueprint form.
    fn render_blueprint(questions: &QuestionMap) -> String {
        let mut out = String::new();
        for record in questions.values() {
            out.push_str(&format!("COMPETENCE_ID: {}\n", record.competence_id));
            out.push_str("TYPE: MCQ\n");
            out.push_str(&format!("QUESTION: {}\n", record.question));
            for (letter, option) in ["A", "B", "C", "D"].iter().zip(&record.options) {
                out.push_str(&format!("OPTION_{letter}: {option}\n"));
            }
            out.push_str(&format!("CORRECT_ANSWER: {}\n", record.correct_answer));
            out.push_str("---\n");
        }
        out
    }

    #[test]
    fn test_parse_simple_block() {
        let questions = parse_blueprint(SIMPLE);
        assert_eq!(questions.len(), 1);

        let q = &questions["C1"];
        assert_eq!(q.question, "What is 2+2?");
        assert_eq!(q.options, vec!["3", "4", "5", "6"]);
        assert_eq!(q.correct_answer, "B");
        assert_eq!(q.question_type, QuestionType::Mcq);
    }

    #[test]
    fn test_question_type_serializes_lowercase() {
        let questions = parse_blueprint(SIMPLE);
        let value = serde_json::to_value(&questions["C1"]).unwrap();
        assert_eq!(value["question_type"], "mcq");
    }

    #[test]
    fn test_multiline_question_with_code_block() {
        let blueprint = "COMPETENCE_ID: COMP_001\n\
TYPE: MCQ\n\
QUESTION: What does this print?\n\
```cpp\n\
int x = 1;\n\
\n\
std::cout << x++ << x;\n\
```\n\
OPTION_A: 11\n\
OPTION_B: 12\n\
OPTION_C: 22\n\
OPTION_D: undefined\n\
CORRECT_ANSWER: b\n\
---";
        let questions = parse_blueprint(blueprint);
        let q = &questions["COMP_001"];
        assert_eq!(
            q.question,
            "What does this print?\n```cpp\nint x = 1;\n\nstd::cout << x++ << x;\n```"
        );
        assert_eq!(q.correct_answer, "B");
        assert_eq!(q.options.len(), 4);
    }

    #[test]
    fn test_blocks_split_on_competence_id_without_separator() {
        let blueprint = "COMPETENCE_ID: C1\nQUESTION: First?\nOPTION_A: x\nCORRECT_ANSWER: A\n\
COMPETENCE_ID: C2\nQUESTION: Second?\nOPTION_A: y\nCORRECT_ANSWER: A";
        let questions = parse_blueprint(blueprint);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions["C1"].question, "First?");
        assert_eq!(questions["C2"].question, "Second?");
    }

    #[test]
    fn test_block_without_competence_id_is_skipped() {
        let blueprint = "QUESTION: Orphan?\nOPTION_A: x\n---\n\
COMPETENCE_ID: C2\nQUESTION: Kept?\nCORRECT_ANSWER: C\n---";
        let questions = parse_blueprint(blueprint);
        assert_eq!(questions.len(), 1);
        assert!(questions.contains_key("C2"));
    }

    #[test]
    fn test_empty_competence_id_is_skipped() {
        let questions = parse_blueprint("COMPETENCE_ID:   \nQUESTION: Nope\n---");
        assert!(questions.is_empty());
    }

    #[test]
    fn test_missing_options_are_omitted_in_order() {
        let blueprint = "COMPETENCE_ID: C1\nQUESTION: Q\nOPTION_A: a\nOPTION_C: c\nOPTION_D:\nCORRECT_ANSWER: A";
        let questions = parse_blueprint(blueprint);
        assert_eq!(questions["C1"].options, vec!["a", "c"]);
    }

    #[test]
    fn test_later_duplicate_wins() {
        let blueprint = "COMPETENCE_ID: C1\nQUESTION: Old\n---\nCOMPETENCE_ID: C1\nQUESTION: New\n---";
        let questions = parse_blueprint(blueprint);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions["C1"].question, "New");
    }

    #[test]
    fn test_unrecognized_key_is_continuation() {
        let blueprint = "COMPETENCE_ID: C1\nQUESTION: Line one\nHINT: not a key\nCORRECT_ANSWER: D";
        let questions = parse_blueprint(blueprint);
        assert_eq!(questions["C1"].question, "Line one\nHINT: not a key");
    }

    #[test]
    fn test_text_before_first_key_is_ignored() {
        let blueprint = "Here is your blueprint:\n\nCOMPETENCE_ID: C1\nQUESTION: Q?\nCORRECT_ANSWER: A";
        let questions = parse_blueprint(blueprint);
        assert_eq!(questions["C1"].question, "Q?");
    }

    #[test]
    fn test_correct_answer_is_not_validated() {
        let questions = parse_blueprint("COMPETENCE_ID: C1\nCORRECT_ANSWER:  maybe e \n");
        assert_eq!(questions["C1"].correct_answer, "MAYBE E");
        assert_eq!(questions["C1"].question, "");
        assert!(questions["C1"].options.is_empty());
    }

    #[test]
    fn test_key_with_space_before_colon() {
        let questions = parse_blueprint("COMPETENCE_ID : C9\nQUESTION :Why?");
        assert_eq!(questions["C9"].question, "Why?");
    }

    #[test]
    fn test_indented_key_is_not_a_key() {
        let questions = parse_blueprint("COMPETENCE_ID: C1\nQUESTION: Q\n  OPTION_A: indented");
        assert_eq!(questions["C1"].question, "Q\n  OPTION_A: indented");
        assert!(questions["C1"].options.is_empty());
    }

    #[test]
    fn test_garbage_never_panics() {
        assert!(parse_blueprint("").is_empty());
        assert!(parse_blueprint("---\n---\n\n").is_empty());
        assert!(parse_blueprint("random prose with no keys at all").is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let blueprint = "COMPETENCE_ID: C1\r\nQUESTION: Q?\r\nOPTION_A: x\r\nCORRECT_ANSWER: a\r\n---\r\n";
        let questions = parse_blueprint(blueprint);
        assert_eq!(questions["C1"].question, "Q?");
        assert_eq!(questions["C1"].correct_answer, "A");
    }

    #[test]
    fn test_reparse_of_rendered_form_is_stable() {
        let blueprint = format!(
            "{SIMPLE}\nCOMPETENCE_ID: C2\nQUESTION: Output?\n```python\nprint(1)\n```\nOPTION_A: 1\nOPTION_C: 0\nCORRECT_ANSWER: a\n"
        );
        let first = parse_blueprint(&blueprint);
        let second = parse_blueprint(&render_blueprint(&first));
        assert_eq!(first, second);
    }

    #[test]
    fn test_tokenize_rejects_longer_key_names() {
        assert_eq!(tokenize("OPTION_AB: x"), Token::Text("OPTION_AB: x"));
        assert_eq!(tokenize("TYPES: x"), Token::Text("TYPES: x"));
        assert_eq!(tokenize("---"), Token::Separator);
        assert_eq!(
            tokenize("DIFFICULTY: 3"),
            Token::Field(FieldKey::Difficulty, "3")
        );
    }
}
