use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Label vocabulary that never names a medicine: units, dosage forms,
/// schedules, routes, indications and plain English connectives.
const STOP_WORDS: &[&str] = &[
    "tablet", "tab", "capsule", "cap", "mg", "ml", "g", "mcg", "oz", "qty",
    "take", "daily", "every", "day", "night", "morning", "evening", "noon",
    "hours", "hrs", "bid", "tid", "qid", "po", "prn", "prescription", "rx",
    "disp", "sig", "refills", "dr", "doctor", "patient", "date", "pharmacy",
    "route", "oral", "mouth", "injection", "solution", "suspension", "drops",
    "cream", "gel", "ointment", "spray", "inhaler", "patch", "suppository",
    "food", "meals", "before", "after", "with", "water", "for", "use", "as",
    "directed", "needed", "pain", "fever", "infection", "inflammation",
    "blood", "pressure", "sugar", "heart", "cholesterol", "vitamin", "supplement",
    "substitution", "permissible", "brand", "generic", "interchangeable",
    "no", "yes", "not", "do", "dont", "does", "did", "was", "were", "is", "are",
    "the", "and", "or", "of", "in", "on", "at", "to", "from", "by",
];

static STOP_WORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| STOP_WORDS.iter().copied().collect());

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORD_SET.contains(token)
}
