/// Genre prompt tables. All templates ask for original, family-friendly
/// stories sized for a roughly 60-second read.
pub const GENRES: &[&str] = &[
    "aita",
    "confessions",
    "horror",
    "malicious_compliance",
    "inspiring",
];

const AITA: &[&str] = &[
    "Write a 60-second original story about someone questioning if they were wrong in a situation. Make it relatable and family-friendly, suitable for all audiences.",
    "Create a short original story about a moral dilemma where the person wonders if they made the right choice. Keep it clean and thought-provoking.",
    "Write an original story about a conflict where the person seeks validation about their actions. Make it engaging without being controversial.",
    "Generate an original story about someone questioning their behavior in a social situation. Keep it wholesome and relatable.",
    "Create an original story about a person wondering if they overreacted to something. Make it entertaining and suitable for all ages.",
];

const CONFESSIONS: &[&str] = &[
    "Write a 60-second original story about someone sharing a secret or hidden truth. Make it light-hearted and family-friendly.",
    "Create a short original story about someone revealing something they've kept hidden. Keep it positive and uplifting.",
    "Write an original story about someone confessing to a small mistake or misunderstanding. Make it relatable and humorous.",
    "Generate an original story about someone sharing a surprising revelation. Keep it clean and entertaining.",
    "Create an original story about someone admitting to an embarrassing but harmless situation. Make it funny and wholesome.",
];

const HORROR: &[&str] = &[
    "Write a 60-second original story about a spooky but not terrifying experience. Make it family-friendly and more mystery than horror.",
    "Create a short original story about an unexplained event that turns out to have a logical explanation. Keep it suitable for all audiences.",
    "Write an original story about someone's imagination playing tricks on them. Make it light-hearted and not scary.",
    "Generate an original story about a mysterious situation that gets resolved positively. Keep it engaging but not frightening.",
    "Create an original story about a 'haunted' place that turns out to be something else entirely. Make it fun and family-safe.",
];

const MALICIOUS_COMPLIANCE: &[&str] = &[
    "Write a 60-second original story about someone following rules exactly as written with unexpected results. Make it clever and family-friendly.",
    "Create a short original story about someone technically following instructions but not as intended. Keep it humorous and clean.",
    "Write an original story about someone using the letter of the law against itself. Make it smart and entertaining.",
    "Generate an original story about someone following directions literally with funny consequences. Keep it light-hearted and positive.",
    "Create an original story about someone using rules creatively to solve a problem. Make it clever and inspiring.",
];

const INSPIRING: &[&str] = &[
    "Write a 60-second original story about a relatable everyday situation with a surprising twist. Make it engaging and family-friendly.",
    "Create a short original story about a workplace misunderstanding that gets resolved in an unexpected way. Keep it clean and entertaining.",
    "Write an original story about a friendship challenge that teaches a valuable lesson. Make it inspiring and suitable for all audiences.",
    "Generate an original story about a family gathering that takes an unexpected turn. Keep it wholesome and relatable.",
    "Create a short original story about a neighborly dispute that gets resolved through kindness. Make it heartwarming and positive.",
];

/// Unknown genres fall back to the `inspiring` set.
pub fn templates_for(genre: &str) -> &'static [&'static str] {
    match genre {
        "aita" => AITA,
        "confessions" => CONFESSIONS,
        "horror" => HORROR,
        "malicious_compliance" => MALICIOUS_COMPLIANCE,
        _ => INSPIRING,
    }
}

/// Opening-line instruction injected ahead of the story template to bias
/// toward an attention-grabbing first sentence.
pub fn hook_instruction(genre: &str) -> &'static str {
    match genre {
        "aita" => "Start with a shocking revelation or controversial statement that immediately grabs attention. Use phrases like 'You won't believe what happened next' or 'This changed everything'.",
        "confessions" => "Begin with a surprising admission or secret that creates instant curiosity. Use phrases like 'I've been hiding this for years' or 'What I'm about to tell you will shock you'.",
        "horror" => "Start with an eerie atmosphere or unexplained event that creates tension. Use phrases like 'Something wasn't right' or 'I should have known better'.",
        "malicious_compliance" => "Begin with a situation where someone follows rules to the extreme with unexpected results. Use phrases like 'I did exactly what they asked' or 'They got what they wanted, but not what they expected'.",
        _ => "Start with a relatable problem or challenge that everyone faces. Use phrases like 'We've all been there' or 'This moment changed everything'.",
    }
}

pub fn hook_type(genre: &str) -> &'static str {
    match genre {
        "aita" => "controversial_statement",
        "confessions" => "surprising_admission",
        "horror" => "eerie_atmosphere",
        "malicious_compliance" => "rule_following_extreme",
        _ => "relatable_problem",
    }
}

pub fn continuation_prompt(genre: &str, original_story: &str) -> String {
    format!(
        "This is a continuation of a {} story. The original story was:\n\n\"{}\"\n\nNow write the next part of this story. Make it engaging and continue the narrative naturally. Keep it around 60 seconds when read aloud. Make sure it has a satisfying continuation that builds on the original story.",
        genre, original_story
    )
}
