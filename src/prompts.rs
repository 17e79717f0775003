//! Fixed prompt text used by the debate and its moderator.

pub const MODERATOR_SYSTEM_MESSAGE: &str = "You are responsible for making a decision or \
giving an answer to an important question. To do so you have surrounded yourself with several \
assistants who will give you clues towards an answer. After listening to them you will be asked \
for your answer.";

pub const BOTS_SYSTEM_MESSAGE: &str = "You belong to a group of experts who must advise, from \
diverse points of view, on the following question:";

pub const CONTROL_SYSTEM_MESSAGE: &str = "You are an expert consulted on a crucial problem, \
we need you to give us an answer.";

/// Name given to the moderator built by `Group::create_bots`.
pub const MODERATOR_NAME: &str = "moderator";

/// Join the non-empty parts with single spaces, trimming the result.
pub fn seed_system_message(existing: Option<&str>, shared: Option<&str>, question: &str) -> String {
    [existing, shared, Some(question)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// An agent's reply as it is shown to the other agents.
pub fn format_turn(name: &str, reply: &str) -> String {
    format!("Assistant {}: {}", name, reply)
}

pub fn conclusion_prompt(question: &str) -> String {
    format!("What conclusion do you draw on the question: {}", question)
}
