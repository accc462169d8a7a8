use std::collections::BTreeSet;
use std::io::Write;

use itertools::Itertools;
use oj_api_utils::credentials::UserName;

use crate::schema::{AcmRankEntry, AcmSubmission, OiRankEntry, QuestionId, RankEntry};

/// Scores of a single contestant, one per question column, in column order.
#[derive(Clone, PartialEq, Debug)]
pub struct ScoreRow {
    pub username: UserName,
    pub scores: Vec<f64>,
    pub total: f64,
}

/// Every question id appearing in any entry, in ascending order.
pub fn question_ids<S>(entries: &[RankEntry<S>]) -> Vec<QuestionId> {
    entries
        .iter()
        .flat_map(|entry| entry.submission_info.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Full marks if accepted on the first attempt, half on the second, nothing otherwise.
pub fn acm_question_score(submission: Option<&AcmSubmission>, full: f64) -> f64 {
    match submission {
        Some(AcmSubmission {
            is_ac: true,
            error_number: 0,
        }) => full,
        Some(AcmSubmission {
            is_ac: true,
            error_number: 1,
        }) => full / 2.,
        _ => 0.,
    }
}

/// Questions share 100 points equally.
pub fn acm_rows(entries: &[AcmRankEntry], question_ids: &[QuestionId]) -> Vec<ScoreRow> {
    let full = if question_ids.is_empty() {
        0.
    } else {
        100. / question_ids.len() as f64
    };
    entries
        .iter()
        .map(|entry| {
            let scores = question_ids
                .iter()
                .map(|id| acm_question_score(entry.submission_info.get(id), full))
                .collect_vec();
            ScoreRow {
                username: entry.user.username.clone(),
                total: scores.iter().fold(0., |sum, score| sum + score),
                scores,
            }
        })
        .collect()
}

/// Raw points per question; the total is the server's `total_score` when reported.
pub fn oi_rows(entries: &[OiRankEntry], question_ids: &[QuestionId]) -> Vec<ScoreRow> {
    entries
        .iter()
        .map(|entry| ScoreRow {
            username: entry.user.username.clone(),
            scores: question_ids
                .iter()
                .map(|id| entry.submission_info.get(id).copied().unwrap_or(0.))
                .collect(),
            total: entry.total_score.unwrap_or_else(|| {
                entry
                    .submission_info
                    .values()
                    .fold(0., |sum, score| sum + score)
            }),
        })
        .collect()
}

fn header(question_ids: &[QuestionId], total_column: &str) -> Vec<String> {
    std::iter::once("username".to_owned())
        .chain(
            question_ids
                .iter()
                .enumerate()
                .map(|(i, id)| format!("Q{}({id})", i + 1)),
        )
        .chain(std::iter::once(total_column.to_owned()))
        .collect()
}

fn write_rows(
    writer: impl Write,
    header: Vec<String>,
    rows: &[ScoreRow],
    format_score: impl Fn(f64) -> String,
) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(
            std::iter::once(row.username.to_string())
                .chain(row.scores.iter().map(|&score| format_score(score)))
                .chain(std::iter::once(format_score(row.total))),
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Scores are written with two decimal places.
pub fn write_acm_csv(entries: &[AcmRankEntry], writer: impl Write) -> anyhow::Result<()> {
    let question_ids = question_ids(entries);
    let rows = acm_rows(entries, &question_ids);
    write_rows(writer, header(&question_ids, "total"), &rows, |score| {
        format!("{score:.2}")
    })
}

pub fn write_oi_csv(entries: &[OiRankEntry], writer: impl Write) -> anyhow::Result<()> {
    let question_ids = question_ids(entries);
    let rows = oi_rows(entries, &question_ids);
    write_rows(
        writer,
        header(&question_ids, "total_score"),
        &rows,
        |score| score.to_string(),
    )
}
