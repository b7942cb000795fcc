//! Leaderboard Formatter.
//!
//! Ranks logged runs by one metric. The input is only borrowed; each row
//! holds its own sorted copy of the run's query list. Records without the
//! metric are skipped whatever their shape; a ranked record must name its
//! module.

use crate::error::{GraphVisError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub query: Vec<String>,
    /// Metrics and any other logged fields.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardRow {
    pub run_id: String,
    pub module: String,
    pub query: Vec<String>,
    pub metric: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    pub metric: String,
    pub rows: Vec<LeaderboardRow>,
}

/// Rank the runs that report `metric`, best first. Ties are ordered by run id.
pub fn create_leaderboard(data: &BTreeMap<String, RunRecord>, metric: &str) -> Result<Leaderboard> {
    let mut rows: Vec<LeaderboardRow> = Vec::new();
    for (run_id, record) in data {
        let Some(value) = record.fields.get(metric) else {
            continue;
        };
        let Some(metric_value) = value.as_f64() else {
            tracing::debug!(run = %run_id, metric, %value, "skipping non-numeric metric");
            continue;
        };
        let module = record.module.clone().ok_or_else(|| GraphVisError::MissingRunField {
            run: run_id.clone(),
            field: "module",
        })?;
        let mut query = record.query.clone();
        query.sort();
        rows.push(LeaderboardRow {
            run_id: run_id.clone(),
            module,
            query,
            metric: metric_value,
        });
    }

    rows.sort_by(|a, b| {
        b.metric
            .total_cmp(&a.metric)
            .then_with(|| a.run_id.cmp(&b.run_id))
    });

    Ok(Leaderboard {
        metric: metric.to_string(),
        rows,
    })
}

/// `['a', 'b']`
pub fn format_query(query: &[String]) -> String {
    let items: Vec<String> = query
        .iter()
        .map(|q| format!("'{}'", q.replace('\\', "\\\\").replace('\'', "\\'")))
        .collect();
    format!("[{}]", items.join(", "))
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Center,
    Right,
}

fn pad(s: &str, width: usize, align: Align) -> String {
    let len = s.chars().count();
    let gap = width.saturating_sub(len);
    match align {
        Align::Left => format!("{s}{}", " ".repeat(gap)),
        Align::Right => format!("{}{s}", " ".repeat(gap)),
        Align::Center => {
            let left = gap / 2;
            format!("{}{s}{}", " ".repeat(left), " ".repeat(gap - left))
        }
    }
}

impl fmt::Display for Leaderboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = ["Run ID", "Module", "Query", self.metric.as_str()];
        let aligns = [Align::Center, Align::Left, Align::Left, Align::Right];
        let cells: Vec<[String; 4]> = self
            .rows
            .iter()
            .map(|r| {
                [
                    r.run_id.clone(),
                    r.module.clone(),
                    format_query(&r.query),
                    r.metric.to_string(),
                ]
            })
            .collect();

        let mut widths = header.map(|h| h.chars().count());
        for row in &cells {
            for (w, c) in widths.iter_mut().zip(row) {
                *w = (*w).max(c.chars().count());
            }
        }

        let rule: String = widths
            .iter()
            .map(|w| format!("+{}", "-".repeat(w + 2)))
            .collect::<String>()
            + "+";

        writeln!(f, "{rule}")?;
        let head: Vec<String> = header
            .iter()
            .zip(widths)
            .map(|(h, w)| pad(h, w, Align::Center))
            .collect();
        writeln!(f, "| {} |", head.join(" | "))?;
        writeln!(f, "{rule}")?;
        for row in &cells {
            let line: Vec<String> = row
                .iter()
                .zip(widths)
                .zip(aligns)
                .map(|((c, w), a)| pad(c, w, a))
                .collect();
            writeln!(f, "| {} |", line.join(" | "))?;
        }
        write!(f, "{rule}")
    }
}
