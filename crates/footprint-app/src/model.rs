// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::Value;
use std::cmp::Ordering;

use crate::ids::RowId;
use crate::listview::ListRecord;

pub const TOTAL_ROW_NAME: &str = "Total production";
pub const CREDENTIAL_LABEL: &str = "Verifiable Credential";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Ours,
    Benchmark,
    Delta,
}

impl SortField {
    pub const ALL: [Self; 4] = [Self::Name, Self::Ours, Self::Benchmark, Self::Delta];

    pub const fn column_id(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Ours => "ourPrd",
            Self::Benchmark => "benchmark",
            Self::Delta => "delta",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "",
            Self::Ours => "Our Product",
            Self::Benchmark => "Benchmark",
            Self::Delta => "Delta",
        }
    }
}

/// The `(direction, field)` pair a comparator is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderingSpec<F> {
    pub direction: SortDirection,
    pub field: F,
}

impl<F> OrderingSpec<F> {
    pub const fn new(direction: SortDirection, field: F) -> Self {
        Self { direction, field }
    }
}

impl<F: Copy + PartialEq> OrderingSpec<F> {
    /// Header-click transition: a second click on an ascending column flips it to
    /// descending, anything else starts ascending on the clicked column.
    pub fn toggled(self, field: F) -> Self {
        let was_ascending = self.field == field && self.direction == SortDirection::Asc;
        Self {
            direction: if was_ascending {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            },
            field,
        }
    }
}

impl Default for OrderingSpec<SortField> {
    fn default() -> Self {
        Self::new(SortDirection::Asc, SortField::Name)
    }
}

/// Emission values are kg CO2e per functional unit.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionRow {
    pub id: RowId,
    pub name: String,
    pub ours: f64,
    pub benchmark: f64,
}

impl EmissionRow {
    pub fn new(id: usize, name: &str, ours: f64, benchmark: f64) -> Self {
        Self {
            id: RowId::new(id),
            name: name.to_owned(),
            ours,
            benchmark,
        }
    }

    pub fn delta(&self) -> Option<f64> {
        delta_percent(self.ours, self.benchmark)
    }

    pub fn is_total(&self) -> bool {
        self.name == TOTAL_ROW_NAME
    }
}

impl ListRecord for EmissionRow {
    type Field = SortField;

    fn id(&self) -> RowId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn cmp_field(&self, other: &Self, field: SortField) -> Ordering {
        match field {
            SortField::Name => self.name.cmp(&other.name),
            SortField::Ours => self.ours.total_cmp(&other.ours),
            SortField::Benchmark => self.benchmark.total_cmp(&other.benchmark),
            SortField::Delta => match (self.delta(), other.delta()) {
                (Some(left), Some(right)) => left.total_cmp(&right),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    }
}

/// Footer line under the comparison body. Never sorted, filtered or selected.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub name: String,
    pub ours: Option<f64>,
    pub benchmark: Option<f64>,
    pub highlighted: bool,
}

impl SummaryRow {
    pub fn new(name: &str, ours: Option<f64>, benchmark: Option<f64>) -> Self {
        Self {
            name: name.to_owned(),
            ours,
            benchmark,
            highlighted: false,
        }
    }

    pub fn highlighted(mut self) -> Self {
        self.highlighted = true;
        self
    }

    pub fn delta(&self) -> Option<f64> {
        match (self.ours, self.benchmark) {
            (Some(ours), Some(benchmark)) => delta_percent(ours, benchmark),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaTone {
    Better,
    Worse,
    Even,
}

/// Percent by which our value undercuts the benchmark. Positive is better.
pub fn delta_percent(ours: f64, benchmark: f64) -> Option<f64> {
    if benchmark == 0.0 || !benchmark.is_finite() || !ours.is_finite() {
        return None;
    }
    Some((benchmark - ours) / benchmark * 100.0)
}

pub fn delta_tone(delta: f64) -> DeltaTone {
    let rounded = round_to_tenth(delta);
    if rounded > 0.0 {
        DeltaTone::Better
    } else if rounded < 0.0 {
        DeltaTone::Worse
    } else {
        DeltaTone::Even
    }
}

pub fn format_delta(delta: Option<f64>) -> String {
    match delta {
        Some(value) => format!("{:.1}%", round_to_tenth(value).abs()),
        None => "n/a".to_owned(),
    }
}

pub fn format_amount(value: Option<f64>) -> String {
    match value {
        Some(value) => {
            let text = format!("{value:.3}");
            let text = text.trim_end_matches('0').trim_end_matches('.');
            if text.is_empty() || text == "-" {
                "0".to_owned()
            } else {
                text.to_owned()
            }
        }
        None => "variable".to_owned(),
    }
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// One entry of the remote credential collection, kept as raw JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialDocument(Value);

impl CredentialDocument {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn subject_type(&self) -> Option<&str> {
        self.0
            .get("credentialSubject")
            .and_then(|subject| subject.get("type"))
            .and_then(Value::as_str)
            .filter(|kind| !kind.is_empty())
    }

    pub fn label(&self) -> String {
        match self.subject_type() {
            Some(kind) => format!("{} {CREDENTIAL_LABEL}", capitalize_first(kind)),
            None => CREDENTIAL_LABEL.to_owned(),
        }
    }

    pub fn pretty(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| self.0.to_string())
    }
}

pub fn credential_label(document: Option<&CredentialDocument>) -> String {
    document.map_or_else(|| CREDENTIAL_LABEL.to_owned(), CredentialDocument::label)
}

pub fn capitalize_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
