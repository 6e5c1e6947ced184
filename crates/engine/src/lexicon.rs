//! Closed-class word lists and suffix heuristics used to tag tokens.

const PRONOUNS: &[&str] = &[
    "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them",
];
const POSSESSIVES: &[&str] = &["my", "your", "his", "its", "our", "their"];
const DETERMINERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "every", "each", "some", "any", "no",
];
const PREPOSITIONS: &[&str] = &[
    "in", "on", "at", "of", "for", "with", "by", "from", "about", "into", "over", "under",
    "after", "before", "between", "through", "during", "without",
];
const CONJUNCTIONS: &[&str] = &["and", "or", "but", "nor", "yet"];
const MODALS: &[&str] = &[
    "can", "could", "will", "would", "shall", "should", "may", "might", "must",
];

/// (form, tag, lemma) for frequent irregular verbs
const VERBS: &[(&str, &str, &str)] = &[
    ("am", "VBP", "be"),
    ("is", "VBZ", "be"),
    ("are", "VBP", "be"),
    ("was", "VBD", "be"),
    ("were", "VBD", "be"),
    ("be", "VB", "be"),
    ("been", "VBN", "be"),
    ("being", "VBG", "be"),
    ("has", "VBZ", "have"),
    ("have", "VBP", "have"),
    ("had", "VBD", "have"),
    ("does", "VBZ", "do"),
    ("do", "VBP", "do"),
    ("did", "VBD", "do"),
    ("saw", "VBD", "see"),
    ("went", "VBD", "go"),
    ("said", "VBD", "say"),
    ("made", "VBD", "make"),
    ("took", "VBD", "take"),
    ("came", "VBD", "come"),
    ("got", "VBD", "get"),
    ("gave", "VBD", "give"),
    ("found", "VBD", "find"),
    ("told", "VBD", "tell"),
    ("thought", "VBD", "think"),
    ("knew", "VBD", "know"),
];

/// Part-of-speech tag for `word`. `initial` marks the first token of a
/// sentence, where capitalisation says nothing about proper nouns.
pub fn tag(word: &str, initial: bool) -> &'static str {
    if word.chars().all(|c| !c.is_alphanumeric()) {
        return punctuation_tag(word);
    }
    if word.starts_with(|c: char| c.is_ascii_digit()) {
        return "CD";
    }

    let lower = word.to_lowercase();
    let lower = lower.as_str();
    if let Some((_, verb_tag, _)) = VERBS.iter().find(|(form, _, _)| *form == lower) {
        return *verb_tag;
    }
    if PRONOUNS.contains(&lower) {
        return "PRP";
    }
    if POSSESSIVES.contains(&lower) {
        return "PRP$";
    }
    if DETERMINERS.contains(&lower) {
        return "DT";
    }
    if lower == "to" {
        return "TO";
    }
    if PREPOSITIONS.contains(&lower) {
        return "IN";
    }
    if CONJUNCTIONS.contains(&lower) {
        return "CC";
    }
    if MODALS.contains(&lower) {
        return "MD";
    }

    let length = lower.chars().count();
    if length > 4 && lower.ends_with("ing") {
        "VBG"
    } else if length > 3 && lower.ends_with("ed") {
        "VBD"
    } else if length > 3 && lower.ends_with("ly") {
        "RB"
    } else if !initial && word.starts_with(char::is_uppercase) {
        "NNP"
    } else if length > 3 && lower.ends_with('s') && !lower.ends_with("ss") {
        "NNS"
    } else {
        "NN"
    }
}

pub fn lemma(word: &str, tag: &str) -> String {
    let lower = word.to_lowercase();
    if let Some((_, _, base)) = VERBS.iter().find(|(form, _, _)| *form == lower) {
        return base.to_string();
    }

    let stripped = match tag {
        "VBG" => lower.strip_suffix("ing"),
        "VBD" => lower.strip_suffix("ed"),
        "NNS" => lower.strip_suffix('s'),
        _ => None,
    };
    stripped.unwrap_or(&lower).to_string()
}

pub fn is_punctuation(tag: &str) -> bool {
    matches!(tag, "." | "," | ":" | "-LRB-" | "-RRB-" | "``" | "''")
}

pub fn is_verb(tag: &str) -> bool {
    tag.starts_with("VB") || tag == "MD"
}

pub fn is_nominal(tag: &str) -> bool {
    tag.starts_with("NN") || tag == "PRP" || tag == "CD"
}

fn punctuation_tag(word: &str) -> &'static str {
    match word {
        "." | "!" | "?" | "..." => ".",
        "," => ",",
        "(" | "[" | "{" => "-LRB-",
        ")" | "]" | "}" => "-RRB-",
        "\"" | "\u{201c}" => "``",
        "\u{201d}" => "''",
        "$" => "$",
        _ => ":",
    }
}
