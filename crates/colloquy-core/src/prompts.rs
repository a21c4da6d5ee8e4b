//! Instructions sent to the text-understanding capability.

use crate::domain::Category;

/// System instruction for the routing call.
pub fn router_instruction() -> String {
    let mut text = String::from(
        "You route a conversation transcript to speech-feedback analysts.\n\
         Pick the categories that apply to the transcript and order them by how \
         prevalent or severe the issue is, most prevalent first. Never list a \
         category twice. If the transcript has no evaluable content (for example \
         it only says \"transcribing...\"), return an empty list.\n\nCategories:\n",
    );
    for category in Category::ALL {
        text.push_str(&format!("- {category}: {}\n", category_focus(category)));
    }
    text
}

/// What an analyst for `category` measures.
pub fn category_focus(category: Category) -> &'static str {
    match category {
        Category::Fluency => "filler words (um, like), run-on sentences, words per minute",
        Category::Prosody => "pace, pauses, volume variation",
        Category::Pragmatics => "whether the question was answered, rambling",
        Category::Consideration => "hedging, acknowledgment of others, interruptions",
        Category::TimeBalance => "interruption ratio, share of speaking time",
    }
}

/// System instruction for evaluating `category`.
pub fn evaluator_instruction(category: Category) -> String {
    format!(
        "You are a speech coach analysing {category}: {}.\n\
         Score every raw_* field between 0.0 and 1.0 exactly as its description \
         says. Keep the commentary concise and specific to the transcript.",
        category_focus(category)
    )
}

/// Description of a raw field, shown to the capability in the schema.
pub fn raw_field_description(field: &str) -> &'static str {
    match field {
        "raw_filler_words" => "share of filler words; 0 = none, 1 = extreme",
        "raw_run_ons" => "share of run-on sentences; 0 = none, 1 = extreme",
        "raw_wpm" => "deviation from a comfortable pace; 0 = ideal, 1 = far too fast or slow",
        "raw_pace" => "pace deviation; 0 = ideal, 1 = far too fast or slow",
        "raw_pauses" => "excessive pausing; 0 = ideal, 1 = pauses far too much",
        "raw_volume_variance" => "volume variation; 0 = monotone, 1 = ideal variation",
        "raw_answered_question" => "how fully the question was answered; 0 = not at all, 1 = fully",
        "raw_rambling" => "amount of rambling; 0 = concise, 1 = rambles constantly",
        "raw_hedging" => "amount of hedging; 0 = none, 1 = excessive",
        "raw_acknowledgment" => "acknowledgment of others; 0 = none, 1 = frequent",
        "raw_interruptions" => "share of turns that interrupt; 0 = never, 1 = constantly",
        "raw_interruption_ratio" => "how often the speaker interrupts; 0 = never, 1 = constantly",
        "raw_speaking_share" => "imbalance of speaking time; 0 = balanced, 1 = dominates",
        _ => "score between 0.0 and 1.0",
    }
}

/// System instruction for the synthesis call.
pub fn synthesizer_instruction() -> String {
    "You are the final synthesizer. Combine the per-category reports into one \
     short, coherent summary of the speaker's strengths and what to work on. \
     If the transcript has no evaluable content (for example it only says \
     \"transcribing...\" or is extremely short), set \"degenerate\" to true and \
     the summary to \"No analysis\"."
        .to_string()
}
