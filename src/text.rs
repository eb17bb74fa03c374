use once_cell::sync::Lazy;
use regex::Regex;

/// Substituted whenever cleaning strips a text down to nothing.
pub const PLACEHOLDER_TEXT: &str = "Story content available in video";

const TITLE_MAX_CHARS: usize = 50;

/// Metadata lines the model sometimes prefixes to its output.
static METADATA_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(TITLE|GENRE|DATE)\s*:").expect("metadata regex compiles"));

/// Sentinels that mark the start of leaked prompt/instruction text; everything
/// from the first match onward is cut. Order matters: earliest match wins.
const CUT_SENTINELS: &[&str] = &[
    "STORY:",
    "TITLE:",
    "THE STORY:",
    "STORY SCRIPT",
    "Genre:",
    "Part:",
    "Generated:",
    "Story ID:",
    "NOTES:",
    "Duration:",
    "Word count:",
    "Character count:",
    "For continuation",
    "This story",
    "This 30-60 second",
    "CRITICAL:",
    "ONLY write",
    "DO NOT include",
    "Start directly",
    "End with",
    "Nothing else",
];

/// Lowercased fragments that flag a whole line as instruction leakage.
const INSTRUCTION_FRAGMENTS: &[&str] = &[
    "note:",
    "instruction:",
    "important:",
    "remember:",
    "focus on",
    "the story should",
    "make sure",
    "ensure",
    "critical:",
    "only return",
    "do not include",
    "start directly",
    "end with",
    "nothing else",
];

const INSTRUCTION_PREFIXES: &[&str] = &["This story", "This 30-60", "Note:", "Instruction:"];

/// Normalize raw model output into clean narration prose: metadata lines
/// stripped, whitespace collapsed, terminal punctuation guaranteed. Never
/// returns an empty string.
pub fn clean_story_text(raw: &str) -> String {
    let mut kept = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || METADATA_LINE.is_match(line) {
            continue;
        }
        kept.push(line);
    }

    let mut cleaned = kept.join(" ").split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.is_empty() {
        cleaned = PLACEHOLDER_TEXT.to_string();
    }

    if !cleaned.ends_with(['.', '!', '?']) {
        cleaned.push('.');
    }

    cleaned
}

/// Stricter cleaning for on-screen captions: cut at the first leaked
/// sentinel, drop instruction-like lines, fall back to the placeholder when
/// not enough survives.
pub fn clean_caption_text(text: &str) -> String {
    let mut cleaned = text.to_string();
    for sentinel in CUT_SENTINELS {
        if let Some(idx) = cleaned.find(sentinel) {
            cleaned.truncate(idx);
        }
    }

    let mut kept = Vec::new();
    for line in cleaned.lines() {
        let line = line.trim();
        let lower = line.to_lowercase();
        if INSTRUCTION_FRAGMENTS.iter().any(|f| lower.contains(f)) {
            continue;
        }
        if INSTRUCTION_PREFIXES.iter().any(|p| line.starts_with(p)) {
            continue;
        }
        if line.chars().count() > 5 {
            kept.push(line);
        }
    }

    let cleaned = kept.join(" ");
    if cleaned.trim().chars().count() < 10 {
        return PLACEHOLDER_TEXT.to_string();
    }
    cleaned.trim().to_string()
}

/// First line of the cleaned story, truncated to 50 characters.
pub fn derive_title(story: &str) -> String {
    let first_line = story.lines().next().unwrap_or("").trim();
    if first_line.chars().count() > TITLE_MAX_CHARS {
        let truncated: String = first_line.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", truncated)
    } else {
        first_line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleaned_story_ends_with_terminal_punctuation() {
        for raw in [
            "A quiet morning turned strange",
            "It ended well!",
            "Did it though?",
            "Line one\nLine two",
        ] {
            let cleaned = clean_story_text(raw);
            assert!(!cleaned.is_empty());
            let last = cleaned.chars().last().unwrap();
            assert!(matches!(last, '.' | '!' | '?'), "got {:?}", cleaned);
        }
    }

    #[test]
    fn metadata_lines_are_stripped() {
        let raw = "TITLE: My Story\nGENRE: horror\nDATE: 2024-01-01\nThe lights went out.";
        assert_eq!(clean_story_text(raw), "The lights went out.");
    }

    #[test]
    fn whitespace_collapses_to_single_spaces() {
        let raw = "One   two\n\n three\t four";
        assert_eq!(clean_story_text(raw), "One two three four.");
    }

    #[test]
    fn empty_input_becomes_placeholder_sentence() {
        let cleaned = clean_story_text("TITLE: nothing else here\n\n");
        assert_eq!(cleaned, "Story content available in video.");
    }

    #[test]
    fn caption_cleaning_cuts_at_sentinel() {
        let text = "The neighbor waved back at last. NOTES: keep it under 60 seconds";
        assert_eq!(clean_caption_text(text), "The neighbor waved back at last.");
    }

    #[test]
    fn caption_cleaning_drops_instruction_lines() {
        let text = "The letter arrived on a Tuesday morning.\nMake sure the tone stays light.\nShe read it twice before smiling.";
        let cleaned = clean_caption_text(text);
        assert!(!cleaned.contains("Make sure"));
        assert!(cleaned.contains("letter arrived"));
        assert!(cleaned.contains("read it twice"));
    }

    #[test]
    fn caption_cleaning_falls_back_to_placeholder() {
        assert_eq!(clean_caption_text(""), PLACEHOLDER_TEXT);
        assert_eq!(clean_caption_text("hi"), PLACEHOLDER_TEXT);
    }

    #[test]
    fn titles_truncate_at_fifty_chars() {
        let long = "a".repeat(80);
        let title = derive_title(&long);
        assert_eq!(title.chars().count(), 53);
        assert!(title.ends_with("..."));

        assert_eq!(derive_title("Short title."), "Short title.");
    }
}
