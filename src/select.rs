use crate::filter::{EvalError, Evaluator, FilterNode, LeafMatcher};
use crate::record::FieldRecord;
use colored::Colorize;
use comfy_table::{Cell, Color, Table};
use log::warn;
use serde_json::json;
use std::fmt::Write;

/// Verdict for one candidate record
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub index: usize,
    pub verdict: Result<bool, EvalError>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub outcomes: Vec<Outcome>,
}

impl Selection {
    pub fn matched_indices(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .filter_map(|o| matches!(o.verdict, Ok(true)).then_some(o.index))
            .collect()
    }

    pub fn errors(&self) -> impl Iterator<Item = (usize, &EvalError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.verdict.as_ref().err().map(|e| (o.index, e)))
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// Evaluate one filter against every candidate.
///
/// Stops at the first record that cannot be evaluated unless `keep_going`
/// is set, in which case the error is recorded and the next record tried.
pub fn select<M: LeafMatcher>(
    evaluator: &Evaluator<M>,
    filter: &FilterNode,
    records: &[FieldRecord],
    keep_going: bool,
) -> Result<Selection, (usize, EvalError)> {
    let mut selection = Selection::default();

    for (index, record) in records.iter().enumerate() {
        let verdict = evaluator.evaluate(filter, record);
        if let Err(e) = &verdict {
            if !keep_going {
                return Err((index, e.clone()));
            }
            warn!("record {index} skipped: {e}");
        }
        selection.outcomes.push(Outcome { index, verdict });
    }

    Ok(selection)
}

pub fn format_selection_text(selection: &Selection) -> String {
    let mut out = String::new();
    let matched = selection.matched_indices();

    let mut table = Table::new();
    table.set_header(vec!["#", "Result"]);
    for outcome in &selection.outcomes {
        let cell = match &outcome.verdict {
            Ok(true) => Cell::new("MATCH").fg(Color::Green),
            Ok(false) => Cell::new("no match"),
            Err(e) => Cell::new(format!("ERROR: {e}")).fg(Color::Red),
        };
        table.add_row(vec![Cell::new(outcome.index), cell]);
    }
    let _ = writeln!(out, "{table}");

    let summary = format!(
        "{} of {} record{} matched",
        matched.len(),
        selection.total(),
        if selection.total() == 1 { "" } else { "s" }
    );
    let _ = writeln!(out, "{}", summary.bold());

    let error_count = selection.errors().count();
    if error_count > 0 {
        let _ = writeln!(
            out,
            "{}",
            format!("{error_count} record(s) could not be evaluated").red()
        );
    }
    out
}

pub fn format_selection_json(selection: &Selection) -> String {
    let errors: Vec<_> = selection
        .errors()
        .map(|(index, e)| {
            json!({
                "index": index,
                "error": e.to_string(),
                "configuration": e.is_configuration(),
            })
        })
        .collect();

    let body = json!({
        "total": selection.total(),
        "matched": selection.matched_indices(),
        "errors": errors,
    });
    serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string())
}
