//! Text reports of a metrics collection

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::str::FromStr;

use crate::error::SensitivityError;
use crate::metrics::SensitivityMetrics;
use crate::query::IndexFamily;
use crate::subset::VariableSubset;

/// Output layout of [`tabulate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableFormat {
    /// Tab separated
    #[default]
    Tsv,
    /// Comma separated, fields quoted when needed
    Csv,
    /// Space aligned columns for terminals
    Plain,
}

impl TableFormat {
    /// File extension for exported reports
    pub fn extension(&self) -> &'static str {
        match self {
            TableFormat::Tsv => "tsv",
            TableFormat::Csv => "csv",
            TableFormat::Plain => "txt",
        }
    }
}

impl FromStr for TableFormat {
    type Err = SensitivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tsv" => Ok(TableFormat::Tsv),
            "csv" => Ok(TableFormat::Csv),
            "plain" | "text" => Ok(TableFormat::Plain),
            _ => Err(SensitivityError::InvalidConfig {
                message: format!("unknown table format '{s}'"),
            }),
        }
    }
}

struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new(header: &[&str]) -> Self {
        Self {
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn render(&self, format: TableFormat) -> String {
        match format {
            TableFormat::Tsv => self.delimited('\t'),
            TableFormat::Csv => self.delimited(','),
            TableFormat::Plain => self.aligned(),
        }
    }

    fn delimited(&self, sep: char) -> String {
        let mut out = String::new();
        for row in std::iter::once(&self.header).chain(&self.rows) {
            let fields: Vec<String> = row.iter().map(|f| quote(f, sep)).collect();
            out.push_str(&fields.join(&sep.to_string()));
            out.push('\n');
        }
        out
    }

    fn aligned(&self) -> String {
        let mut widths: Vec<usize> = self.header.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (w, field) in widths.iter_mut().zip(row) {
                *w = (*w).max(field.chars().count());
            }
        }

        let mut out = String::new();
        let mut line = |row: &[String]| {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (field, &w))| {
                    if i == 0 {
                        format!("{field:<w$}")
                    } else {
                        format!("{field:>w$}")
                    }
                })
                .collect();
            let _ = writeln!(out, "{}", cells.join("  ").trim_end());
        };
        line(self.header.as_slice());
        let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
        line(rule.as_slice());
        for row in &self.rows {
            line(row.as_slice());
        }
        out
    }
}

fn quote(field: &str, sep: char) -> String {
    if sep == ',' && (field.contains(',') || field.contains('"') || field.contains('\n')) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn number(v: f64) -> String {
    format!("{v:.6}")
}

fn optional(v: Option<&f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| number(*v))
}

/// Render the reports `variables`, `closed`, `total`, `superset` and
/// `dimension` of `metrics`
///
/// Subset tables list every subset with `1 <= |S| <= max_order`, largest
/// value first. Orders above `max_order` are folded into the residual row
/// of the dimension report.
pub fn tabulate(
    metrics: &SensitivityMetrics,
    max_order: usize,
    format: TableFormat,
) -> BTreeMap<String, String> {
    let names = metrics.variables();
    let max_order = max_order.min(metrics.max_order());
    let mut reports = BTreeMap::new();

    let mut variables = Table::new(&["variable", "closed", "total", "superset"]);
    for (i, name) in names.iter().enumerate() {
        let s = VariableSubset::singleton(i);
        variables.push(vec![
            name.clone(),
            optional(metrics.closed().get(&s)),
            optional(metrics.total().get(&s)),
            optional(metrics.superset().get(&s)),
        ]);
    }
    reports.insert("variables".to_string(), variables.render(format));

    for family in IndexFamily::ALL {
        let mut entries: Vec<(&VariableSubset, f64)> = metrics
            .index(family)
            .iter()
            .filter(|(s, _)| (1..=max_order).contains(&s.len()))
            .map(|(s, &v)| (s, v))
            .collect();
        entries.sort_by(|(sa, va), (sb, vb)| vb.total_cmp(va).then_with(|| sa.cmp(sb)));

        let mut table = Table::new(&["subset", "order", family.as_str()]);
        for (s, v) in entries {
            table.push(vec![s.display_names(names), s.len().to_string(), number(v)]);
        }
        reports.insert(family.to_string(), table.render(format));
    }

    let mut dimension = Table::new(&["order", "variance share"]);
    let distribution = metrics.dimension_distribution();
    for (order, share) in distribution.iter().enumerate().take(max_order + 1).skip(1) {
        dimension.push(vec![order.to_string(), number(*share)]);
    }
    let folded: f64 = distribution.iter().skip(max_order + 1).sum();
    dimension.push(vec![
        format!(">{max_order}"),
        number(metrics.residual() + folded),
    ]);
    dimension.push(vec![
        "mean dimension".to_string(),
        number(metrics.mean_dimension()),
    ]);
    reports.insert("dimension".to_string(), dimension.render(format));

    reports
}
