//! Poll input validation and sanitization.
//!
//! Both functions are pure. Validation returns every problem it finds rather
//! than stopping at the first one, so the form can show them together.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_QUESTION_CHARS: usize = 500;
pub const MAX_OPTION_CHARS: usize = 200;
pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 10;

static SCRIPT_BLOCK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("Invalid SCRIPT_BLOCK_REGEX pattern")
});

static HTML_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("Invalid HTML_TAG_REGEX pattern"));

/// Checks a question and its options. An empty list means the input is valid.
pub fn validate_poll<S: AsRef<str>>(question: &str, options: &[S]) -> Vec<String> {
    let mut errors = Vec::new();

    let question = question.trim();
    if question.is_empty() {
        errors.push("Question is required".to_string());
    } else if question.chars().count() > MAX_QUESTION_CHARS {
        errors.push(format!(
            "Question must be less than {MAX_QUESTION_CHARS} characters"
        ));
    }

    if options.len() < MIN_OPTIONS {
        errors.push(format!("At least {MIN_OPTIONS} options are required"));
    } else if options.len() > MAX_OPTIONS {
        errors.push(format!("Maximum {MAX_OPTIONS} options allowed"));
    }

    for (i, option) in options.iter().enumerate() {
        let option = option.as_ref().trim();
        let n = i + 1;
        if option.is_empty() {
            errors.push(format!("Option {n} is required"));
        } else if option.chars().count() > MAX_OPTION_CHARS {
            errors.push(format!(
                "Option {n} must be less than {MAX_OPTION_CHARS} characters"
            ));
        }
    }

    errors
}

/// Removes `<script>` blocks (with their content) and then any other tag,
/// keeping the surrounding text.
pub fn sanitize(input: &str) -> String {
    let without_scripts = SCRIPT_BLOCK_REGEX.replace_all(input, "");
    HTML_TAG_REGEX.replace_all(&without_scripts, "").into_owned()
}

/// Question and options that passed validation and were sanitized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollDraft {
    pub question: String,
    pub options: Vec<String>,
}

impl PollDraft {
    /// Validates the raw input, sanitizes it, and validates again so that
    /// markup-only values cannot slip through as empty strings.
    pub fn from_input<S: AsRef<str>>(question: &str, options: &[S]) -> Result<Self, Vec<String>> {
        let errors = validate_poll(question, options);
        if !errors.is_empty() {
            return Err(errors);
        }

        let draft = Self {
            question: sanitize(question).trim().to_string(),
            options: options
                .iter()
                .map(|option| sanitize(option.as_ref()).trim().to_string())
                .collect(),
        };

        let errors = validate_poll(&draft.question, &draft.options);
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(draft)
    }
}
