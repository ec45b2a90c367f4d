//! Summing contributor commit counts across repositories
use crate::{Error, Result};
use serde_json::Value;
use std::{collections::BTreeMap, fmt::Write, path::Path};

/// Sum every repository's `lastYear` commit counts per contributor.
///
/// The input maps repository names to `{ "lastYear": [ {contributor: count}, .. ], .. }`.
/// Fractional counts are truncated.
pub fn sum_last_year(stats: &Value) -> Result<BTreeMap<String, i64>> {
    let repos = stats
        .as_object()
        .ok_or_else(|| Error::CommitLayout("expected an object of repositories".into()))?;

    let mut totals = BTreeMap::new();
    for (repo, commits) in repos {
        let commits = commits
            .as_object()
            .ok_or_else(|| Error::CommitLayout(format!("repository {repo:?} is not an object")))?;
        let Some(last_year) = commits.get("lastYear") else {
            continue;
        };
        let last_year = last_year
            .as_array()
            .ok_or_else(|| Error::CommitLayout(format!("repository {repo:?}: lastYear is not an array")))?;
        for entry in last_year {
            let entry = entry
                .as_object()
                .ok_or_else(|| Error::CommitLayout(format!("repository {repo:?}: lastYear entry is not an object")))?;
            for (contributor, count) in entry {
                let count = count.as_f64().ok_or_else(|| {
                    Error::CommitLayout(format!("repository {repo:?}: count for {contributor:?} is not a number"))
                })?;
                *totals.entry(contributor.clone()).or_insert(0) += count as i64;
            }
        }
    }
    Ok(totals)
}

/// One `"name", count` line per contributor
pub fn render(totals: &BTreeMap<String, i64>) -> String {
    let mut out = String::new();
    for (contributor, count) in totals {
        // infallible for String
        let _ = writeln!(out, "{contributor:?}, {count}");
    }
    out
}

/// Read the statistics in `path` and render the yearly totals
pub fn run(path: &Path) -> Result<String> {
    let data = std::fs::read_to_string(path).map_err(|source| Error::ReadFile {
        path: path.to_owned(),
        source,
    })?;
    let stats: Value = serde_json::from_str(&data).map_err(Error::DecodeCommits)?;
    Ok(render(&sum_last_year(&stats)?))
}
