//! Prompts compiled into the binary.

/// Answer generation prompt: context, optional history, question.
pub const ANSWER_PROMPT_ID: &str = "rag.answer";

/// Follow-up prompt: asks for a JSON array of three questions.
pub const FOLLOW_UP_PROMPT_ID: &str = "rag.follow_up";

const ANSWER_PROMPT_YAML: &str = include_str!("../prompts/rag.answer.yml");
const FOLLOW_UP_PROMPT_YAML: &str = include_str!("../prompts/rag.follow_up.yml");

/// Raw YAML of a built-in prompt.
pub fn builtin_source(prompt_id: &str) -> Option<&'static str> {
    match prompt_id {
        ANSWER_PROMPT_ID => Some(ANSWER_PROMPT_YAML),
        FOLLOW_UP_PROMPT_ID => Some(FOLLOW_UP_PROMPT_YAML),
        _ => None,
    }
}
