//! Fixed response texts for the intent rules.

use rand::{Rng, RngCore};

pub const GREETINGS: &[&str] = &[
    "Hello! How can I help you today?",
    "Hi there! What would you like to talk about?",
    "Hey! Ask me anything and I'll do my best to help.",
    "Hello! It's nice to hear from you. What's on your mind?",
    "Hi! I'm ready when you are. What can I do for you?",
];

pub const ABOUT_ME: &[&str] = &[
    "I'm a friendly assistant. I can answer general-knowledge questions, do quick calculations, and help with writing or coding questions.",
    "I'm an AI helper built into this site. Ask me about facts, math, writing tips or programming and I'll do my best.",
    "Think of me as a helpful companion: I can look up common facts, work out percentages and sums, and point you in the right direction on many topics.",
];

pub const GRATITUDE: &[&str] = &[
    "You're welcome! Let me know if there's anything else I can help with.",
    "Happy to help! Feel free to ask me anything else.",
    "Anytime! Is there something else you'd like to know?",
];

pub const FEELINGS: &[&str] = &[
    "Thanks for sharing how you feel. I'm here to listen if you'd like to talk more about it.",
    "I appreciate you telling me that. Would you like to talk about what's going on?",
    "Feelings matter. If there's anything I can do to help, just let me know.",
];

pub const FAREWELLS: &[&str] = &[
    "Goodbye! Have a wonderful day.",
    "See you later! Come back anytime you have a question.",
    "Take care! It was nice chatting with you.",
];

pub const COMPLIMENTS: &[&str] = &[
    "Thank you, that's very kind of you!",
    "That's nice to hear, thanks! I'm glad I could help.",
    "You're too kind! Let me know what else I can do for you.",
];

pub const CASUAL: &[&str] = &[
    "I see. Tell me more!",
    "Interesting! What else is on your mind?",
    "Got it. Is there something specific I can help you with?",
    "Okay! Feel free to ask me a question anytime.",
];

pub const PRIME_MINISTER_OF_INDIA: &str =
    "Narendra Modi is the current Prime Minister of India. He has held the office since May 2014.";

pub const MODI_BIOGRAPHY: &str = "Narendra Modi is an Indian politician who has served as the 14th Prime Minister of India since May 2014. He was previously Chief Minister of Gujarat from 2001 to 2014 and is a member of the Bharatiya Janata Party (BJP).";

pub const MATH_HELP: &str = "I can help with basic math! Try something like \"What is 25 + 37?\", \"12 * 8\", \"100 / 4\" or \"Calculate 15% of 200\".";

pub const PROGRAMMING_HELP: &str = "I'd be glad to help with programming. Share the language you're using, what you're trying to do, and any error message or code snippet. Breaking the problem into small steps and testing each one usually makes bugs much easier to find.";

pub const WRITING_HELP: &str = "I can help with writing! Tell me the topic, the audience and the length you need. A good structure is a clear introduction, a few focused paragraphs with one idea each, and a short conclusion. Reading it aloud afterwards helps catch awkward sentences.";

pub const HOW_TO_HELP: &str = "Here's a general approach: break the task into small steps, gather what you need before you start, and check your progress after each step. If you tell me more about exactly what you're trying to do, I can give more specific guidance.";

pub const GENERIC_QUESTION: &str = "That's an interesting question! I don't have a definite answer for it right now. Could you rephrase it or add a little more detail so I can help better?";

pub const TROUBLESHOOTING: &str = "Sorry to hear you're running into trouble. Let's work through it: describe what you expected to happen, what actually happened, and any error messages you see. Restarting, checking for updates and trying again step by step often reveals the cause.";

/// Last-resort text when every other path produced nothing.
pub const DEFAULT_CLARIFICATION: &str =
    "I'm not sure I understood that. Could you rephrase your message or give me a bit more detail?";

/// Uniform pick from a fixed set.
pub fn pick(set: &[&str], rng: &mut dyn RngCore) -> String {
    match set.len() {
        0 => DEFAULT_CLARIFICATION.to_owned(),
        len => set[rng.random_range(0..len)].to_owned(),
    }
}
