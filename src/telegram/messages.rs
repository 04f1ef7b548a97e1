//! Reply texts

use crate::learning::Notice;

/// Telegram rejects longer messages, counted in UTF-16 code units
pub const MAX_MESSAGE_LEN: usize = 4096;

pub fn greeting(first_name: Option<&str>) -> String {
    match first_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("Hello, {}! Please type /help to get more information about me.", name),
        None => "Hello! Please type /help to get more information about me.".to_string(),
    }
}

pub fn help() -> String {
    [
        "I keep your personal dictionary and help you repeat it.",
        "",
        "/add_word <word> <meaning> — add a word or one more meaning",
        "/delete_word <word> — delete a word with all its meanings",
        "/delete_meaning <word> <meaning> — delete one meaning",
        "/my_dict — show your dictionary",
        "/learn — pick a word to repeat at growing intervals",
        "/check <answer> — answer the current question (a plain message works too)",
        "/stop_learning — stop the current repetition",
        "",
        "Anything else you write goes to the language assistant.",
    ]
    .join("\n")
}

/// Usage line for a command name without the slash, if it is one of ours
pub fn usage_for(command: &str) -> Option<&'static str> {
    let usage = match command {
        "start" => "Usage: /start",
        "help" => "Usage: /help",
        "add_word" => "Please write a word and its meaning in the format: /add_word <word> <meaning>",
        "delete_word" => "Please specify the word you want to delete: /delete_word <word>",
        "delete_meaning" => {
            "Please write the word and its meaning that you want to delete: /delete_meaning <word> <meaning>"
        }
        "my_dict" => "Usage: /my_dict (no arguments)",
        "learn" => "Usage: /learn, then send the word in the next message",
        "check" => "Please write your answer: /check <answer>",
        "stop_learning" => "Usage: /stop_learning (no arguments)",
        _ => return None,
    };
    Some(usage)
}

pub const WORD_ADDED: &str = "The new word has been successfully added!";
pub const MEANING_EXISTS: &str = "This word already has this meaning in the dictionary.";
pub const WORD_DELETED: &str = "The word has been successfully deleted.";
pub const MEANING_DELETED: &str = "The meaning has been successfully deleted.";
pub const DICTIONARY_EMPTY: &str = "Your dictionary is empty.";
pub const DICTIONARY_EMPTY_ADD_FIRST: &str = "Your dictionary is empty. Please add words first.";
pub const WORD_NOT_FOUND: &str = "There is no such word in the dictionary. Please check the spelling. \
                                  You can view your dictionary using the /my_dict command.";
pub const MEANING_NOT_FOUND: &str = "This meaning is not in the dictionary. Please check the spelling. \
                                     You can view your dictionary using the /my_dict command.";
pub const SAVE_FAILED: &str = "Sorry, I couldn't save your dictionary. Nothing was changed, please try again later.";

pub const ENTER_WORD: &str = "Enter the word you want to learn.";
pub const LEARN_WORD_NOT_FOUND: &str = "The word is not found in your dictionary.";
pub const NO_QUESTION: &str = "There is no question to answer right now. Use /learn to start repeating a word.";
pub const LEARNING_STOPPED: &str = "Learning stopped.";
pub const NOT_LEARNING: &str = "You are not learning any word right now.";
pub const CORRECT: &str = "Well done! This is the correct answer.";
pub const ANSWER_WORD_REMOVED: &str = "The word has been removed from the dictionary.";

pub const MODEL_UNAVAILABLE: &str =
    "Sorry, I can't reach the language assistant right now. Please try again a bit later.";

pub fn last_meaning_deleted(word: &str) -> String {
    format!(
        "{} It was the last meaning, so \"{}\" has left your dictionary.",
        MEANING_DELETED, word
    )
}

pub fn session_cancelled(word: &str) -> String {
    format!("Repetition of \"{}\" has been stopped.", word)
}

pub fn learning_started(steps: usize) -> String {
    format!(
        "The word has been successfully added to the study! I will ask you about it {} times.",
        steps
    )
}

pub fn previous_session_replaced() -> &'static str {
    "Your previous repetition has been stopped."
}

pub fn incorrect(meanings: &[String]) -> String {
    format!("You almost guessed it! Correct answers: {}.", meanings.join(", "))
}

pub fn completed(word: &str) -> String {
    format!("That was the last repetition of \"{}\". Great job!", word)
}

/// `Your dictionary:` followed by the entries
pub fn dictionary(entries: &[(String, Vec<String>)]) -> String {
    if entries.is_empty() {
        return DICTIONARY_EMPTY.to_string();
    }
    format!("Your dictionary:\n{}", dictionary_lines(entries))
}

/// One `word — m1, m2` line per word
pub fn dictionary_lines(entries: &[(String, Vec<String>)]) -> String {
    entries
        .iter()
        .map(|(word, meanings)| format!("{} — {}", word, meanings.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn notice(notice: &Notice) -> String {
    match notice {
        Notice::Reminder { word, step, total } => format!(
            "Let's repeat the vocabulary! How to translate \"{}\"? ({}/{})",
            word, step, total
        ),
        Notice::WordRemoved { word } => format!(
            "\"{}\" has been removed from your dictionary, so its repetition is over.",
            word
        ),
    }
}

/// Splits text into chunks Telegram accepts, preferring line breaks
///
/// `limit` is in UTF-16 code units, which is how Telegram measures length.
pub fn split_for_telegram(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = utf16_len(line);
        if current_len + line_len > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len > limit {
            // A single oversized line is cut on char boundaries
            for c in line.chars() {
                if current_len + c.len_utf16() > limit && !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                current.push(c);
                current_len += c.len_utf16();
            }
            continue;
        }
        current.push_str(line);
        current_len += line_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}
