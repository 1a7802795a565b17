//! Tolerant parsing of examiner responses.
//!
//! The examiner is asked to answer in a fixed line format (`Score: X/10`,
//! `Feedback: ...`, `Verdict: ...`, `Reason: ...`, `Name: ...`) but models
//! drift: labels come wrapped in markdown emphasis, spacing varies, lines go
//! missing. Parsing never fails hard. Every extractor reports a missing or
//! malformed value as a [`ParseError`] and the caller decides the fallback.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseError;
use crate::model::{round1, Verdict};

static SCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bscore\b[\s*_]*:[\s*_]*(\d+(?:\.\d+)?)\s*/\s*10\b")
        .expect("score regex is valid")
});

static SCORE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^.*\bscore\b[\s*_]*:.*$").expect("score line regex is valid")
});

static FEEDBACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\bfeedback\b[\s*_]*:[ \t*_]*(.*)").expect("feedback regex is valid")
});

static VERDICT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t>*_-]*verdict[ \t*_]*:[ \t*_]*(.*?)[ \t*_]*$")
        .expect("verdict regex is valid")
});

static REASON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ims)^[ \t>*_-]*reason[ \t*_]*:[ \t*_]*(.*)").expect("reason regex is valid")
});

static NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t>*_-]*name[ \t*_]*:[ \t*_]*(.*?)[ \t*_]*$")
        .expect("name regex is valid")
});

/// A parsed scoring response.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResponse {
    /// Score rounded to one decimal.
    pub score: Result<f64, ParseError>,
    pub feedback: String,
}

/// A parsed AI-detection response.
#[derive(Debug, Clone, PartialEq)]
pub struct VerdictResponse {
    pub verdict: Result<Verdict, ParseError>,
    pub reason: String,
}

/// Read `Score: X/10` and the feedback sentence from a scoring response.
pub fn parse_score_response(text: &str) -> ScoreResponse {
    ScoreResponse {
        score: parse_score(text),
        feedback: parse_feedback(text),
    }
}

/// Read the first `Score: X/10` value.
pub fn parse_score(text: &str) -> Result<f64, ParseError> {
    let caps = SCORE.captures(text).ok_or(ParseError::MissingScore)?;
    let value: f64 = caps[1].parse().map_err(|_| ParseError::MissingScore)?;
    if !(0.0..=10.0).contains(&value) {
        return Err(ParseError::ScoreOutOfRange(value));
    }
    Ok(round1(value))
}

/// Text after `Feedback:`, or the whole response minus its score line.
pub fn parse_feedback(text: &str) -> String {
    if let Some(caps) = FEEDBACK.captures(text) {
        return caps[1].trim().trim_end_matches(['*', '_']).trim().to_string();
    }
    SCORE_LINE.replace(text, "").trim().to_string()
}

/// Read the verdict line and its justification from a detection response.
pub fn parse_verdict_response(text: &str) -> VerdictResponse {
    VerdictResponse {
        verdict: parse_verdict(text),
        reason: parse_reason(text),
    }
}

/// Classify the first `Verdict:` line.
///
/// Only the verdict line counts. An answer that mentions "AI-generated"
/// elsewhere (for example in its reasoning) is not flagged by that mention.
pub fn parse_verdict(text: &str) -> Result<Verdict, ParseError> {
    let caps = VERDICT.captures(text).ok_or(ParseError::MissingVerdict)?;
    classify_verdict(&caps[1])
}

const VERDICT_PHRASES: &[(&str, Verdict)] = &[
    ("likely ai", Verdict::LikelyAi),
    ("ai-generated", Verdict::LikelyAi),
    ("ai generated", Verdict::LikelyAi),
    ("likely human", Verdict::LikelyHuman),
    ("human", Verdict::LikelyHuman),
    ("uncertain", Verdict::Uncertain),
];

/// Map a verdict phrase onto a [`Verdict`].
///
/// The earliest phrase wins, so `Uncertain (could be AI-generated)` stays
/// uncertain. Negated phrases (`not AI-generated`, `unlikely AI`) are ignored.
pub fn classify_verdict(phrase: &str) -> Result<Verdict, ParseError> {
    let lower = phrase.trim().to_lowercase();
    VERDICT_PHRASES
        .iter()
        .filter_map(|(needle, verdict)| {
            lower
                .match_indices(needle)
                .map(|(pos, _)| pos)
                .find(|&pos| !is_negated(&lower[..pos]))
                .map(|pos| (pos, *verdict))
        })
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, verdict)| verdict)
        .ok_or_else(|| ParseError::UnrecognizedVerdict(phrase.trim().to_string()))
}

fn is_negated(before: &str) -> bool {
    if before.ends_with("un") {
        return true;
    }
    let last_word = before
        .trim_end()
        .rsplit(|c: char| !c.is_alphanumeric() && c != '\'')
        .next()
        .unwrap_or_default();
    matches!(last_word, "not" | "unlikely" | "isn't" | "never")
}

/// Text after `Reason:`, empty if absent.
pub fn parse_reason(text: &str) -> String {
    REASON
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_default()
}

/// The value of the first `Name:` line, if any.
pub fn parse_student_name(text: &str) -> Option<String> {
    NAME.captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_plain() {
        assert_eq!(parse_score("Score: 9/10"), Ok(9.0));
        assert_eq!(parse_score("Score: 7.5/10\nFeedback: ok"), Ok(7.5));
    }

    #[test]
    fn score_tolerates_markdown_and_spacing() {
        assert_eq!(parse_score("**Score:** 8 / 10"), Ok(8.0));
        assert_eq!(parse_score("score:6/10"), Ok(6.0));
        assert_eq!(parse_score("Final SCORE :  4.25/10"), Ok(4.3));
    }

    #[test]
    fn score_missing_or_malformed() {
        assert_eq!(parse_score("Looks good overall."), Err(ParseError::MissingScore));
        assert_eq!(parse_score("Score: eight/10"), Err(ParseError::MissingScore));
        assert_eq!(parse_score("Score: 8/100"), Err(ParseError::MissingScore));
        assert_eq!(parse_score(""), Err(ParseError::MissingScore));
    }

    #[test]
    fn score_out_of_range() {
        assert_eq!(
            parse_score("Score: 12/10"),
            Err(ParseError::ScoreOutOfRange(12.0))
        );
    }

    #[test]
    fn feedback_after_label() {
        let resp = parse_score_response(
            "Score: 6/10\nFeedback: The answer omits the role of wavelength.",
        );
        assert_eq!(resp.score, Ok(6.0));
        assert_eq!(resp.feedback, "The answer omits the role of wavelength.");
    }

    #[test]
    fn feedback_with_markdown_label() {
        let resp = parse_score_response("**Score:** 5/10\n**Feedback:** Too brief.");
        assert_eq!(resp.feedback, "Too brief.");
    }

    #[test]
    fn feedback_falls_back_to_body() {
        let resp = parse_score_response("Score: 3/10\nMostly irrelevant to the question.");
        assert_eq!(resp.feedback, "Mostly irrelevant to the question.");
    }

    #[test]
    fn verdict_phrases() {
        assert_eq!(
            parse_verdict("Verdict: Likely AI-generated\nReason: uniform tone"),
            Ok(Verdict::LikelyAi)
        );
        assert_eq!(
            parse_verdict("Verdict: Likely human-written"),
            Ok(Verdict::LikelyHuman)
        );
        assert_eq!(parse_verdict("Verdict: Uncertain"), Ok(Verdict::Uncertain));
        assert_eq!(
            parse_verdict("**Verdict:** likely ai generated"),
            Ok(Verdict::LikelyAi)
        );
    }

    #[test]
    fn verdict_only_from_verdict_line() {
        let text = "Verdict: Likely human-written\nReason: not likely AI-generated, has typos";
        assert_eq!(parse_verdict(text), Ok(Verdict::LikelyHuman));
    }

    #[test]
    fn hedged_verdict_keeps_leading_phrase() {
        assert_eq!(
            parse_verdict("Verdict: Uncertain (could be AI-generated)"),
            Ok(Verdict::Uncertain)
        );
        assert_eq!(
            parse_verdict("Verdict: AI-generated, though possibly human edited"),
            Ok(Verdict::LikelyAi)
        );
    }

    #[test]
    fn negated_ai_phrase_is_not_flagged() {
        assert_eq!(
            parse_verdict("Verdict: Likely human-written, not AI-generated"),
            Ok(Verdict::LikelyHuman)
        );
        assert_eq!(
            parse_verdict("Verdict: Likely human-written (unlikely AI generated)"),
            Ok(Verdict::LikelyHuman)
        );
        assert_eq!(
            parse_verdict("Verdict: Not AI-generated"),
            Err(ParseError::UnrecognizedVerdict("Not AI-generated".into()))
        );
    }

    #[test]
    fn verdict_missing_or_unrecognized() {
        assert_eq!(
            parse_verdict("This is likely AI-generated."),
            Err(ParseError::MissingVerdict)
        );
        assert_eq!(
            parse_verdict("Verdict: plagiarised"),
            Err(ParseError::UnrecognizedVerdict("plagiarised".into()))
        );
    }

    #[test]
    fn reason_parsing() {
        let resp = parse_verdict_response("Verdict: Uncertain\nReason: Mixed signals.");
        assert_eq!(resp.verdict, Ok(Verdict::Uncertain));
        assert_eq!(resp.reason, "Mixed signals.");
        assert_eq!(parse_reason("Verdict: Uncertain"), "");
    }

    #[test]
    fn student_name() {
        assert_eq!(
            parse_student_name("Name: Priya Sharma"),
            Some("Priya Sharma".into())
        );
        assert_eq!(
            parse_student_name("Sure!\n**Name:** Arjun Mehta\n"),
            Some("Arjun Mehta".into())
        );
        assert_eq!(parse_student_name("Name:   "), None);
        assert_eq!(parse_student_name("I could not find one."), None);
    }
}
