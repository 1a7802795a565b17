//! Matching submission questions against the answer key.

use std::collections::BTreeSet;

use crate::model::QuestionMap;

/// Questions in `expected` that are absent from `attempted`, in string order.
pub fn diff(expected: &BTreeSet<String>, attempted: &BTreeSet<String>) -> BTreeSet<String> {
    expected.difference(attempted).cloned().collect()
}

/// Answer-key questions the submission did not attempt.
pub fn missing_questions(answer_key: &QuestionMap, submission: &QuestionMap) -> Vec<String> {
    let expected: BTreeSet<String> = answer_key.ids().map(str::to_string).collect();
    let attempted: BTreeSet<String> = submission.ids().map(str::to_string).collect();
    diff(&expected, &attempted).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn diff_is_set_difference() {
        let missing = diff(&set(&["1", "2", "3"]), &set(&["2"]));
        assert_eq!(missing, set(&["1", "3"]));
    }

    #[test]
    fn diff_empty_when_superset_attempted() {
        assert!(diff(&set(&["1", "2"]), &set(&["1", "2", "5"])).is_empty());
        assert!(diff(&set(&[]), &set(&["1"])).is_empty());
    }

    #[test]
    fn extra_attempts_are_not_reported() {
        let missing = diff(&set(&["1"]), &set(&["7", "8"]));
        assert_eq!(missing, set(&["1"]));
    }

    #[test]
    fn missing_from_question_maps() {
        let mut key = QuestionMap::new();
        key.insert("1", "a");
        key.insert("2", "b");
        key.insert("10", "c");
        let mut submission = QuestionMap::new();
        submission.insert("2", "answer");
        assert_eq!(missing_questions(&key, &submission), vec!["1", "10"]);
    }
}
