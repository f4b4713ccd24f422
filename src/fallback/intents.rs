use std::sync::LazyLock;

use rand::RngCore;
use regex::Regex;

use super::arithmetic::{self, Expression};
use super::knowledge::KnowledgeBase;
use super::phrases;
use super::text::{is_stop_word, normalize};
use crate::conversation::{Turn, last_user_message};

/// Messages shorter than this (in characters) count as small talk.
pub const CASUAL_MAX_CHARS: usize = 20;

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new($re).expect(concat!("valid ", stringify!($name), " regex"))
        });
    };
}

pattern!(
    PRIME_MINISTER,
    r"(?i)\b(?:prime\s*minist?er|pm)\b.*\bind(?:ia|ai|a)\b|\bind(?:ia|ai|a)(?:'?s)?\s+(?:prime\s*minist?er|pm)\b"
);
pattern!(
    PAST_OFFICE,
    r"(?i)\b(?:first|former|previous|last|deputy|chief|second)\b"
);
pattern!(
    PUBLIC_FIGURE,
    r"(?i)\b(?:narendra\s+mod[iy]|narender\s+modi|nerendra\s+modi|modi\s*ji|pm\s+modi|modi)\b"
);
pattern!(
    TELL_ME_ABOUT,
    r"(?i)\btell\s+me\s+(?:something\s+|more\s+)?about\s+(.+)$"
);
pattern!(
    GREETING,
    r"(?i)^\s*(?:hi|hello|hey|hiya|howdy|greetings|namaste|hola|yo|good\s+(?:morning|afternoon|evening|day))\b"
);
pattern!(
    ABOUT_ME,
    r"(?i)\b(?:who|what)\s+are\s+you\b|\bwhat(?:'s|\s+is)\s+your\s+name\b|\byour\s+(?:capabilities|purpose|features|abilities)\b|\bwhat\s+can\s+you\s+do\b|\babout\s+yourself\b|\bare\s+you\s+(?:an?\s+)?(?:bot|robot|ai|human|real)\b"
);
pattern!(
    MATH_WORDS,
    r"(?i)\b(?:calculate|calculation|compute|math|maths|arithmetic|sum|multiply|divide|subtract|percentage|equation)\b"
);
pattern!(
    PROGRAMMING,
    r"(?i)\b(?:code|coding|program|programming|programmer|javascript|typescript|python|java|rust|golang|html|css|sql|function|variable|compiler?|debug(?:ging)?|algorithm|api|regex|git)\b"
);
pattern!(
    WRITING,
    r"(?i)\b(?:write|writing|essay|article|blog|grammar|paragraph|story|poem|letter|resume|proofread|summari[sz]e)\b"
);
pattern!(
    DEFINITION,
    r"(?i)^\s*(?:what\s+is|what's|whats|what\s+are|what\s+does|define|explain|meaning\s+of)\s+(.+?)(?:\s+mean)?[\s?.!]*$"
);
pattern!(
    HOW_TO,
    r"(?i)^\s*how\s+(?:to|do\s+i|can\s+i|should\s+i|do\s+you)\b|\bhow\s+to\b"
);
pattern!(
    INTERROGATIVE,
    r"(?i)\b(?:who|what|when|where|why|how|which|whose|whom|can|could|would|should|will|is|are|do|does|did)\b"
);
pattern!(
    TROUBLE,
    r"(?i)\b(?:problem|problems|issue|issues|trouble|error|errors|not\s+working|doesn'?t\s+work|broken|crash(?:es|ed|ing)?|fails?|failing|stuck)\b"
);
pattern!(
    GRATITUDE,
    r"(?i)\b(?:thanks|thank\s+you|thankyou|thx|ty|appreciate\s+it|grateful)\b"
);
pattern!(
    FEELINGS,
    r"(?i)\bi\s*(?:'m|am)\s+(?:feeling\s+)?(?:sad|happy|tired|bored|lonely|stressed|anxious|angry|excited|upset|depressed|good|great|fine|okay|ok)\b|\bi\s+feel\b"
);
pattern!(
    FAREWELL,
    r"(?i)\b(?:bye|goodbye|good\s+night|see\s+you|see\s+ya|take\s+care|farewell|later)\b"
);
pattern!(
    COMPLIMENT,
    r"(?i)\b(?:you(?:'re|\s+are)\s+(?:so\s+)?(?:great|awesome|amazing|smart|helpful|the\s+best|cool|brilliant)|good\s+job|well\s+done|nice\s+work|love\s+you)\b"
);
pattern!(
    TOPIC_FILLER,
    r"(?i)^(?:please|can\s+you|could\s+you|would\s+you|will\s+you|tell\s+me|i\s+want\s+to\s+know|i'd\s+like\s+to\s+know|i\s+need|do\s+you\s+know|what|who|when|where|why|how|which|is|are|does|do|about|the|a|an)\b[\s,]*"
);

/// What every rule sees: the trimmed message, its history, and the fact table.
pub struct Probe<'a> {
    pub message: &'a str,
    pub history: &'a [Turn],
    pub knowledge: &'a KnowledgeBase,
}

impl<'a> Probe<'a> {
    pub fn new(message: &'a str, history: &'a [Turn], knowledge: &'a KnowledgeBase) -> Self {
        Self {
            message: message.trim(),
            history,
            knowledge,
        }
    }

    fn is_question(&self) -> bool {
        self.message.contains('?')
    }
}

pub type Matcher = fn(&Probe<'_>) -> bool;

/// `None` falls through to the next rule.
pub type Responder = fn(&Probe<'_>, &mut dyn RngCore) -> Option<String>;

/// One classifier and the strategy that answers for it.
#[derive(Clone, Copy)]
pub struct IntentRule {
    pub name: &'static str,
    pub matches: Matcher,
    pub respond: Responder,
}

impl std::fmt::Debug for IntentRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentRule").field("name", &self.name).finish()
    }
}

/// Ordered rule list. Evaluated top to bottom; the first rule that matches
/// and responds wins.
#[derive(Debug, Clone)]
pub struct IntentCascade {
    rules: Vec<IntentRule>,
}

impl Default for IntentCascade {
    fn default() -> Self {
        Self::standard()
    }
}

impl IntentCascade {
    pub fn new(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    /// The production precedence, highest first.
    pub fn standard() -> Self {
        Self::new(vec![
            rule("knowledge", always, knowledge_answer),
            rule("prime_minister", is_prime_minister_query, prime_minister_answer),
            rule("public_figure", mentions_public_figure, public_figure_answer),
            rule("tell_me_about", is_tell_me_about, tell_me_about_answer),
            rule("greeting", is_greeting, greeting_answer),
            rule("about_me", is_about_me, about_me_answer),
            rule("arithmetic", is_arithmetic, arithmetic_answer),
            rule("programming", is_programming, programming_answer),
            rule("writing", is_writing, writing_answer),
            rule("definition", is_definition, definition_answer),
            rule("how_to", is_how_to, how_to_answer),
            rule("open_question", is_open_question, open_question_answer),
            rule("question", is_question, question_answer),
            rule("troubleshooting", is_trouble, trouble_answer),
            rule("social", is_social, social_answer),
            rule("casual", is_casual, casual_answer),
            rule("keyword", always, keyword_answer),
            rule("default", always, default_answer),
        ])
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    /// Run the cascade. Returns the winning rule's name and its text, or
    /// `None` if every rule fell through.
    pub fn evaluate(
        &self,
        probe: &Probe<'_>,
        rng: &mut dyn RngCore,
    ) -> Option<(&'static str, String)> {
        self.rules.iter().find_map(|r| {
            if !(r.matches)(probe) {
                return None;
            }
            (r.respond)(probe, rng).map(|text| (r.name, text))
        })
    }
}

fn rule(name: &'static str, matches: Matcher, respond: Responder) -> IntentRule {
    IntentRule {
        name,
        matches,
        respond,
    }
}

fn always(_: &Probe<'_>) -> bool {
    true
}

// --- 1. knowledge ---

fn knowledge_answer(probe: &Probe<'_>, _: &mut dyn RngCore) -> Option<String> {
    probe.knowledge.lookup(probe.message).map(str::to_owned)
}

// --- 2. prime minister ---

fn is_prime_minister_query(probe: &Probe<'_>) -> bool {
    PRIME_MINISTER.is_match(probe.message) && !PAST_OFFICE.is_match(probe.message)
}

fn prime_minister_answer(_: &Probe<'_>, _: &mut dyn RngCore) -> Option<String> {
    Some(phrases::PRIME_MINISTER_OF_INDIA.to_owned())
}

// --- 3. public figure ---

fn mentions_public_figure(probe: &Probe<'_>) -> bool {
    PUBLIC_FIGURE.is_match(probe.message)
}

fn public_figure_answer(_: &Probe<'_>, _: &mut dyn RngCore) -> Option<String> {
    Some(phrases::MODI_BIOGRAPHY.to_owned())
}

// --- 4. tell me about ---

fn is_tell_me_about(probe: &Probe<'_>) -> bool {
    TELL_ME_ABOUT.is_match(probe.message)
}

fn tell_me_about_answer(probe: &Probe<'_>, _: &mut dyn RngCore) -> Option<String> {
    let subject = TELL_ME_ABOUT.captures(probe.message)?.get(1)?.as_str();
    if let Some(answer) = probe.knowledge.lookup(subject) {
        return Some(answer.to_owned());
    }
    PUBLIC_FIGURE
        .is_match(subject)
        .then(|| phrases::MODI_BIOGRAPHY.to_owned())
}

// --- 5. greeting ---

fn is_greeting(probe: &Probe<'_>) -> bool {
    GREETING.is_match(probe.message)
}

fn greeting_answer(_: &Probe<'_>, rng: &mut dyn RngCore) -> Option<String> {
    Some(phrases::pick(phrases::GREETINGS, rng))
}

// --- 6. about me ---

fn is_about_me(probe: &Probe<'_>) -> bool {
    ABOUT_ME.is_match(probe.message)
}

fn about_me_answer(_: &Probe<'_>, rng: &mut dyn RngCore) -> Option<String> {
    Some(phrases::pick(phrases::ABOUT_ME, rng))
}

// --- 7. arithmetic ---

fn is_arithmetic(probe: &Probe<'_>) -> bool {
    arithmetic::contains_expression(probe.message) || MATH_WORDS.is_match(probe.message)
}

fn arithmetic_answer(probe: &Probe<'_>, _: &mut dyn RngCore) -> Option<String> {
    Some(match Expression::parse(probe.message) {
        Some(expression) => expression.answer(),
        None => phrases::MATH_HELP.to_owned(),
    })
}

// --- 8, 9. programming and writing ---

fn is_programming(probe: &Probe<'_>) -> bool {
    PROGRAMMING.is_match(probe.message)
}

fn programming_answer(_: &Probe<'_>, _: &mut dyn RngCore) -> Option<String> {
    Some(phrases::PROGRAMMING_HELP.to_owned())
}

fn is_writing(probe: &Probe<'_>) -> bool {
    WRITING.is_match(probe.message)
}

fn writing_answer(_: &Probe<'_>, _: &mut dyn RngCore) -> Option<String> {
    Some(phrases::WRITING_HELP.to_owned())
}

// --- 10. definition ---

fn is_definition(probe: &Probe<'_>) -> bool {
    DEFINITION.is_match(probe.message)
}

fn definition_answer(probe: &Probe<'_>, _: &mut dyn RngCore) -> Option<String> {
    let topic = DEFINITION.captures(probe.message)?.get(1)?.as_str().trim();
    if let Some(answer) = probe.knowledge.lookup(topic) {
        return Some(answer.to_owned());
    }
    Some(format!(
        "\"{topic}\" is a great thing to ask about, but I don't have a detailed \
         explanation of it yet. Could you tell me a bit more about what you'd like to know, \
         such as a specific aspect or the context you came across it in?"
    ))
}

// --- 11. how-to ---

fn is_how_to(probe: &Probe<'_>) -> bool {
    HOW_TO.is_match(probe.message)
}

fn how_to_answer(_: &Probe<'_>, _: &mut dyn RngCore) -> Option<String> {
    Some(phrases::HOW_TO_HELP.to_owned())
}

// --- 12, 13. questions ---

fn is_open_question(probe: &Probe<'_>) -> bool {
    probe.is_question() && INTERROGATIVE.is_match(probe.message)
}

fn open_question_answer(probe: &Probe<'_>, _: &mut dyn RngCore) -> Option<String> {
    Some(format!(
        "You asked: \"{}\". I don't have a reliable answer to that right now. \
         Could you add some detail or rephrase it? I'm good with general facts, \
         calculations, and writing or coding questions.",
        probe.message
    ))
}

fn is_question(probe: &Probe<'_>) -> bool {
    probe.is_question()
}

fn question_answer(_: &Probe<'_>, _: &mut dyn RngCore) -> Option<String> {
    Some(phrases::GENERIC_QUESTION.to_owned())
}

// --- 14. troubleshooting ---

fn is_trouble(probe: &Probe<'_>) -> bool {
    TROUBLE.is_match(probe.message)
}

fn trouble_answer(_: &Probe<'_>, _: &mut dyn RngCore) -> Option<String> {
    Some(phrases::TROUBLESHOOTING.to_owned())
}

// --- 15. social ---

fn social_set(message: &str) -> Option<&'static [&'static str]> {
    if GRATITUDE.is_match(message) {
        Some(phrases::GRATITUDE)
    } else if FEELINGS.is_match(message) {
        Some(phrases::FEELINGS)
    } else if FAREWELL.is_match(message) {
        Some(phrases::FAREWELLS)
    } else if COMPLIMENT.is_match(message) {
        Some(phrases::COMPLIMENTS)
    } else {
        None
    }
}

fn is_social(probe: &Probe<'_>) -> bool {
    social_set(probe.message).is_some()
}

fn social_answer(probe: &Probe<'_>, rng: &mut dyn RngCore) -> Option<String> {
    social_set(probe.message).map(|set| phrases::pick(set, rng))
}

// --- 16. casual ---

fn is_casual(probe: &Probe<'_>) -> bool {
    probe.message.chars().count() < CASUAL_MAX_CHARS && !probe.is_question()
}

fn casual_answer(_: &Probe<'_>, rng: &mut dyn RngCore) -> Option<String> {
    Some(phrases::pick(phrases::CASUAL, rng))
}

// --- 17. keyword scan ---

fn keyword_answer(probe: &Probe<'_>, _: &mut dyn RngCore) -> Option<String> {
    let normalized = normalize(probe.message);
    normalized
        .split_whitespace()
        .filter(|t| !is_stop_word(t))
        .find_map(|t| probe.knowledge.keyword(t))
        .map(str::to_owned)
}

// --- 18. default ---

const DEFAULT_FOLLOW_UP: &str = "I don't have specific information about that yet, \
    but I'm happy to help if you can share more details or ask a more specific question.";

fn default_answer(probe: &Probe<'_>, _: &mut dyn RngCore) -> Option<String> {
    let subject = extract_topic(probe.message).unwrap_or_else(|| probe.message.to_owned());
    let opening = if continues_conversation(probe) {
        format!("Based on our conversation, it sounds like you're interested in \"{subject}\".")
    } else {
        format!("It sounds like you're interested in \"{subject}\".")
    };
    Some(format!("{opening} {DEFAULT_FOLLOW_UP}"))
}

/// Strip leading question words and filler. `None` when nothing is left.
pub fn extract_topic(message: &str) -> Option<String> {
    let mut topic = message.trim();
    loop {
        let stripped = TOPIC_FILLER.replace(topic, "");
        let stripped = stripped.trim();
        if stripped.len() == topic.len() {
            break;
        }
        // Offsets are stable because `replace` only removes a prefix.
        topic = &topic[topic.len() - stripped.len()..];
    }
    let topic = topic.trim_end_matches(['?', '.', '!', ',', ' ']);
    (!topic.is_empty()).then(|| topic.to_owned())
}

/// History exists and the last thing the user said differs from this message.
fn continues_conversation(probe: &Probe<'_>) -> bool {
    if probe.history.is_empty() {
        return false;
    }
    last_user_message(probe.history).is_none_or(|last| last.trim() != probe.message)
}
