//! Summary statistics over a session's result table.

use serde::{Deserialize, Serialize};

use crate::model::{round2, Verdict};
use crate::table::ResultTable;

/// Aggregate view of a [`ResultTable`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub students: usize,
    pub mean_total: f64,
    pub min_total: f64,
    pub max_total: f64,
    /// Answers with a `LikelyAi` verdict.
    pub flagged_answers: usize,
    pub penalties_applied: usize,
    /// Records with at least one failed or unreadable examiner call.
    pub degraded_records: usize,
    /// Per question, in order of first appearance.
    pub per_question: Vec<QuestionStats>,
}

/// Statistics for one question across all students.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionStats {
    pub question_id: String,
    /// Students with a record for this question.
    pub answered: usize,
    pub avg_adjusted_score: f64,
    pub flagged: usize,
}

/// Compute summary statistics. All averages are rounded to 2 decimals.
pub fn summarize(table: &ResultTable) -> TableSummary {
    let evaluations = table.evaluations();
    if evaluations.is_empty() {
        return TableSummary::default();
    }

    let totals: Vec<f64> = evaluations.iter().map(|e| e.total).collect();
    let records = || evaluations.iter().flat_map(|e| &e.records);

    let per_question = table
        .question_ids()
        .into_iter()
        .map(|id| {
            let scores: Vec<(f64, Verdict)> = records()
                .filter(|r| r.question_id == id)
                .map(|r| (r.adjusted_score, r.verdict))
                .collect();
            let answered = scores.len();
            let avg = scores.iter().map(|(s, _)| s).sum::<f64>() / answered.max(1) as f64;
            QuestionStats {
                question_id: id,
                answered,
                avg_adjusted_score: round2(avg),
                flagged: scores.iter().filter(|(_, v)| *v == Verdict::LikelyAi).count(),
            }
        })
        .collect();

    TableSummary {
        students: evaluations.len(),
        mean_total: round2(totals.iter().sum::<f64>() / totals.len() as f64),
        min_total: totals.iter().copied().fold(f64::INFINITY, f64::min),
        max_total: totals.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        flagged_answers: records().filter(|r| r.verdict == Verdict::LikelyAi).count(),
        penalties_applied: records().filter(|r| r.penalty_applied).count(),
        degraded_records: records().filter(|r| r.is_degraded()).count(),
        per_question,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ScoreRecord, StudentEvaluation};

    fn record(id: &str, adjusted: f64, verdict: Verdict) -> ScoreRecord {
        ScoreRecord {
            question_id: id.into(),
            raw_score: adjusted,
            adjusted_score: adjusted,
            verdict,
            feedback: String::new(),
            ai_reason: String::new(),
            penalty_applied: verdict == Verdict::LikelyAi,
            failures: vec![],
        }
    }

    #[test]
    fn empty_table() {
        let summary = summarize(&ResultTable::new());
        assert_eq!(summary.students, 0);
        assert!(summary.per_question.is_empty());
    }

    #[test]
    fn summary_over_two_students() {
        let mut table = ResultTable::new();
        table.push(StudentEvaluation::accumulate(
            "A",
            vec![
                record("1", 8.0, Verdict::LikelyHuman),
                record("2", 0.0, Verdict::LikelyAi),
            ],
        ));
        table.push(StudentEvaluation::accumulate(
            "B",
            vec![record("1", 5.0, Verdict::Uncertain)],
        ));

        let summary = summarize(&table);
        assert_eq!(summary.students, 2);
        assert_eq!(summary.mean_total, 6.5);
        assert_eq!(summary.min_total, 5.0);
        assert_eq!(summary.max_total, 8.0);
        assert_eq!(summary.flagged_answers, 1);
        assert_eq!(summary.penalties_applied, 1);

        let q1 = &summary.per_question[0];
        assert_eq!(q1.question_id, "1");
        assert_eq!(q1.answered, 2);
        assert_eq!(q1.avg_adjusted_score, 6.5);
        assert_eq!(summary.per_question[1].flagged, 1);
    }
}
