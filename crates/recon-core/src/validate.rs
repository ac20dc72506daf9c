//! Validator rule catalogue.
//!
//! Each rule partitions its input exactly: every row lands in the valid or
//! the invalid dataset, never both, never neither. Rejections are soft
//! findings (messages and counts), not errors; the invalid partition is
//! what carries them out of the pipeline.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use recon_config::{
    LineBreakAction, MatchMode, NullPolicy, RegexMode, TextEncoding, ValidatorConfig,
};
use recon_model::{Dataset, Record, ValidationOutcome, clean_document};

/// Ambient inputs a rule may need: where relative roster paths resolve,
/// what "today" is for age windows, and how external files are encoded.
#[derive(Debug, Clone, Copy)]
pub struct ValidatorEnv<'a> {
    pub base_dir: &'a Path,
    pub reference_date: NaiveDate,
    pub encoding: TextEncoding,
}

/// Run one validator rule over a dataset.
pub fn run_validator(
    config: &ValidatorConfig,
    dataset: &Dataset,
    env: &ValidatorEnv<'_>,
) -> ValidationOutcome {
    let mut outcome = match config {
        ValidatorConfig::Required { columns } => {
            partition(dataset, |row| columns.iter().all(|column| !row.is_blank(column)))
        }
        ValidatorConfig::Status {
            column,
            include,
            exclude,
        } => {
            let include = normalize_set(include);
            let exclude = normalize_set(exclude);
            partition(dataset, |row| {
                let value = row.trimmed(column).to_uppercase();
                let included = include.is_empty() || include.contains(&value);
                included && !exclude.contains(&value)
            })
        }
        ValidatorConfig::TypeFilter {
            column,
            mode,
            include,
            exclude,
        } => partition(dataset, |row| {
            let value = row.trimmed(column).to_uppercase();
            let included =
                include.is_empty() || include.iter().any(|c| matches(*mode, &value, c));
            let excluded = exclude.iter().any(|c| matches(*mode, &value, c));
            included && !excluded
        }),
        ValidatorConfig::Aging {
            column,
            null_policy,
            min_date,
            max_date,
            max_age_days,
            min_age_days,
        } => partition(dataset, |row| match row.date(column) {
            None => matches!(null_policy, NullPolicy::Include),
            Some(date) => {
                let age = (env.reference_date - date).num_days();
                min_date.is_none_or(|bound| date >= bound)
                    && max_date.is_none_or(|bound| date <= bound)
                    && max_age_days.is_none_or(|bound| age <= bound)
                    && min_age_days.is_none_or(|bound| age >= bound)
            }
        }),
        ValidatorConfig::DateRange {
            column,
            min_year,
            max_year,
        } => {
            // 1900 floor guards against the implausible dates legacy
            // systems emit for unknown values.
            let min_year = min_year.unwrap_or(1900);
            let max_year = max_year.unwrap_or(9999);
            partition(dataset, |row| {
                if row.is_blank(column) {
                    return true;
                }
                match row.date(column) {
                    Some(date) => {
                        let year = chrono::Datelike::year(&date);
                        year >= min_year && year <= max_year
                    }
                    None => false,
                }
            })
        }
        ValidatorConfig::Blacklist {
            path,
            column,
            roster_column,
            whitelist,
        } => return run_blacklist(dataset, env, path, column, roster_column.as_deref(), *whitelist),
        ValidatorConfig::Regex {
            column,
            pattern,
            mode,
        } => match compile(pattern, *mode) {
            Ok(regex) => partition(dataset, |row| regex.is_match(row.trimmed(column))),
            Err(error) => {
                // Patterns are checked at config load; a failure here means
                // the rule cannot run, not that the rows are bad.
                let mut outcome = pass_through(dataset);
                outcome.errors.push(format!("regex: {error}"));
                return outcome;
            }
        },
        ValidatorConfig::LineBreak { columns, action } => {
            return run_line_break(dataset, columns, *action);
        }
    };

    if outcome.rejected() > 0 {
        outcome.errors.push(format!(
            "{}: rejected {} row(s)",
            config.rule_name(),
            outcome.rejected()
        ));
    }
    debug!(
        rule = config.rule_name(),
        valid = outcome.valid.len(),
        invalid = outcome.invalid.len(),
        "validator applied"
    );
    outcome
}

/// Run a validator chain: each rule consumes the previous rule's valid
/// partition; invalid rows accumulate across rules.
pub fn run_validators(
    configs: &[ValidatorConfig],
    dataset: Dataset,
    env: &ValidatorEnv<'_>,
) -> ValidationOutcome {
    let mut valid = dataset;
    let mut invalid = valid.empty_like();
    let mut errors = Vec::new();
    for config in configs {
        let outcome = run_validator(config, &valid, env);
        valid = outcome.valid;
        invalid.append(outcome.invalid);
        errors.extend(outcome.errors);
    }
    ValidationOutcome {
        valid,
        invalid,
        errors,
    }
}

fn partition<F>(dataset: &Dataset, predicate: F) -> ValidationOutcome
where
    F: FnMut(&Record) -> bool,
{
    let (valid, invalid) = dataset.partition(predicate);
    ValidationOutcome {
        valid,
        invalid,
        errors: Vec::new(),
    }
}

fn pass_through(dataset: &Dataset) -> ValidationOutcome {
    ValidationOutcome {
        valid: dataset.clone(),
        invalid: dataset.empty_like(),
        errors: Vec::new(),
    }
}

fn normalize_set(values: &[String]) -> BTreeSet<String> {
    values
        .iter()
        .map(|value| value.trim().to_uppercase())
        .collect()
}

fn matches(mode: MatchMode, value: &str, candidate: &str) -> bool {
    let candidate = candidate.trim().to_uppercase();
    match mode {
        MatchMode::Exact => value == candidate,
        MatchMode::Contains => value.contains(&candidate),
        MatchMode::Prefix => value.starts_with(&candidate),
    }
}

fn compile(pattern: &str, mode: RegexMode) -> Result<Regex, regex::Error> {
    let anchored = match mode {
        RegexMode::FullMatch => format!("^(?:{pattern})$"),
        RegexMode::Match => format!("^(?:{pattern})"),
        RegexMode::Search => pattern.to_string(),
    };
    Regex::new(&anchored)
}

fn run_blacklist(
    dataset: &Dataset,
    env: &ValidatorEnv<'_>,
    path: &Path,
    column: &str,
    roster_column: Option<&str>,
    whitelist: bool,
) -> ValidationOutcome {
    let resolved = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env.base_dir.join(path)
    };
    let roster = match recon_ingest::load_document_roster(&resolved, roster_column, env.encoding) {
        Ok(roster) => roster,
        Err(error) => {
            // Collaborator I/O failure: the rule cannot run, so the rows
            // pass untouched and the failure is reported upward.
            let mut outcome = pass_through(dataset);
            outcome.errors.push(format!("blacklist: {error}"));
            return outcome;
        }
    };
    let mut outcome = partition(dataset, |row| {
        let member = roster.contains(&clean_document(row.trimmed(column)));
        if whitelist { member } else { !member }
    });
    if outcome.rejected() > 0 {
        outcome.errors.push(format!(
            "blacklist: rejected {} row(s) against {} roster document(s)",
            outcome.rejected(),
            roster.len()
        ));
    }
    outcome
}

fn run_line_break(
    dataset: &Dataset,
    columns: &[String],
    action: LineBreakAction,
) -> ValidationOutcome {
    let has_break = |row: &Record| {
        columns.iter().any(|column| {
            row.get(column)
                .is_some_and(|value| value.contains('\r') || value.contains('\n'))
        })
    };
    match action {
        LineBreakAction::Reject => {
            let mut outcome = partition(dataset, |row| !has_break(row));
            if outcome.rejected() > 0 {
                outcome.errors.push(format!(
                    "line_break: rejected {} malformed row(s)",
                    outcome.rejected()
                ));
            }
            outcome
        }
        LineBreakAction::Clean => {
            let mut cleaned = dataset.clone();
            let mut touched = 0usize;
            cleaned.map_rows(|row| {
                for column in columns {
                    if let Some(value) = row.get(column) {
                        if value.contains('\r') || value.contains('\n') {
                            let fixed: String = value
                                .chars()
                                .filter(|ch| *ch != '\r' && *ch != '\n')
                                .collect();
                            row.set(column, fixed);
                            touched += 1;
                        }
                    }
                }
            });
            let mut outcome = ValidationOutcome {
                valid: cleaned,
                invalid: dataset.empty_like(),
                errors: Vec::new(),
            };
            if touched > 0 {
                outcome
                    .errors
                    .push(format!("line_break: cleaned {touched} cell(s)"));
            }
            outcome
        }
        LineBreakAction::Flag => {
            let flagged = dataset.rows().iter().filter(|row| has_break(row)).count();
            let mut outcome = pass_through(dataset);
            if flagged > 0 {
                outcome
                    .errors
                    .push(format!("line_break: flagged {flagged} row(s)"));
            }
            outcome
        }
    }
}
