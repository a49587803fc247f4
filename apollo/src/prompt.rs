//! Prompt enhancement: validation, clamping, and the local fallback.
//!
//! Everything here is pure text transformation. The HTTP route validates the
//! incoming prompt against the configured character bound, asks the text
//! model to restructure it, clamps the model output back into the bound, and
//! substitutes [`fallback_enhance`] whenever the model call fails - the
//! enhancement operation never hard-fails after validation.

/// Character-count bound for prompts and enhanced output.
#[derive(Debug, Clone, Copy)]
pub struct PromptBounds {
    pub min_chars: usize,
    pub max_chars: usize,
}

impl Default for PromptBounds {
    fn default() -> Self {
        Self {
            min_chars: 100,
            max_chars: 1000,
        }
    }
}

/// Sentence appended when output falls short of the minimum length.
const PAD_SENTENCE: &str = "\n\nPlease provide implementation details and consider best practices.";

/// Topic keywords and their canned feature bullets, checked in order.
const TOPICS: &[(&str, [&str; 3])] = &[
    (
        "website",
        [
            "Responsive design for all devices",
            "Clean, intuitive user interface",
            "Fast loading and performance",
        ],
    ),
    (
        "app",
        [
            "User-friendly mobile interface",
            // The second bullet is filled with the prompt's opening words.
            "",
            "Offline capabilities",
        ],
    ),
    (
        "dashboard",
        [
            "Key metrics visualization",
            "Data filtering options",
            "Regular data updates",
        ],
    ),
    (
        "stats",
        [
            "Key metrics visualization",
            "Data filtering options",
            "Regular data updates",
        ],
    ),
    (
        "ai",
        [
            "AI-powered analysis",
            "Personalized recommendations",
            "Learning capabilities",
        ],
    ),
    (
        "personal",
        [
            "Privacy and security",
            "Customization options",
            "Personal data management",
        ],
    ),
];

/// Check the prompt against the bound. Returns the user-facing rejection
/// message on failure.
pub fn validate(prompt: &str, bounds: PromptBounds) -> Result<(), String> {
    let chars = prompt.chars().count();

    if chars < bounds.min_chars {
        return Err(format!("Input must be at least {} characters.", bounds.min_chars));
    }

    if chars > bounds.max_chars {
        return Err(format!(
            "Input is too long. Please limit to {} characters or less.",
            bounds.max_chars
        ));
    }

    Ok(())
}

/// Clamp enhanced output into the bound: truncate when too long, pad with a
/// closing sentence when too short.
pub fn clamp(text: &str, bounds: PromptBounds) -> String {
    let trimmed = text.trim();

    if trimmed.chars().count() > bounds.max_chars {
        return trimmed.chars().take(bounds.max_chars).collect();
    }

    let mut out = trimmed.to_string();
    while out.chars().count() < bounds.min_chars {
        out.push_str(PAD_SENTENCE);
    }
    if out.chars().count() > bounds.max_chars {
        out = out.chars().take(bounds.max_chars).collect();
    }

    out
}

/// Strip a leaked chain-of-thought preamble ("Thinking Process: ... Result:")
/// some models prepend despite instructions.
pub fn strip_reasoning_preamble(text: &str) -> &str {
    let lower = text.trim_start();
    if !lower.starts_with("Thinking Process:") {
        return text;
    }

    for marker in ["Result:", "Enhanced Prompt:"] {
        if let Some(pos) = lower.find(marker) {
            return lower[pos + marker.len()..].trim_start();
        }
    }

    text
}

/// Deterministic local enhancement used when the model call fails.
///
/// Lowercases the prompt, re-capitalizes sentence starts, picks the first
/// matching topic keyword, and emits that topic's canned three-point feature
/// list with a closing sentence; prompts with no recognized topic get a
/// generic template. Output is clamped to the bound.
pub fn fallback_enhance(prompt: &str, bounds: PromptBounds) -> String {
    let formatted = capitalize_sentences(&prompt.to_lowercase());
    let formatted = formatted.trim();

    let topic = TOPICS.iter().find(|(keyword, _)| formatted.to_lowercase().contains(keyword));

    let enhanced = match topic {
        Some((keyword, points)) => {
            let mut out = format!("Create a {keyword} with the following features:\n\n");
            for (i, point) in points.iter().enumerate() {
                if point.is_empty() {
                    // The "app" template folds the prompt's opening words into
                    // its functionality bullet.
                    let opening: Vec<&str> = prompt.split_whitespace().take(5).collect();
                    out.push_str(&format!("{}. Core functionality: {}\n", i + 1, opening.join(" ")));
                } else {
                    out.push_str(&format!("{}. {point}\n", i + 1));
                }
            }
            out.push_str("\nInclude design and implementation details.");
            out
        }
        None => {
            format!(
                "Develop {formatted} with these key features:\n\n\
                 1. User-friendly interface\n\
                 2. Core functionality\n\
                 3. Performance optimization\n\n\
                 Provide implementation approach."
            )
        }
    };

    clamp(&enhanced, bounds)
}

/// Uppercase the first letter of the text and of every sentence after
/// `.`, `!` or `?`.
fn capitalize_sentences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_sentence_start = true;

    for ch in text.chars() {
        if at_sentence_start && ch.is_alphabetic() {
            out.extend(ch.to_uppercase());
            at_sentence_start = false;
        } else {
            if matches!(ch, '.' | '!' | '?') {
                at_sentence_start = true;
            }
            out.push(ch);
        }
    }

    out
}
