// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Comparison, stable sort, name filter and paging for list views.
//!
//! Everything here is pure: inputs are borrowed, outputs are fresh vectors of
//! references into the source slice, so a derived view can be recomputed from
//! `(rows, ordering, query)` whenever state changes.

use std::cmp::Ordering;

use crate::ids::RowId;
use crate::model::{OrderingSpec, SortDirection};

pub trait ListRecord {
    type Field: Copy;

    fn id(&self) -> RowId;
    fn name(&self) -> &str;
    /// Natural order of `self` against `other` on one field.
    fn cmp_field(&self, other: &Self, field: Self::Field) -> Ordering;
}

/// Larger values first: `Less` when `b < a`, `Greater` when `b > a`.
pub fn descending_comparator<R: ListRecord>(a: &R, b: &R, field: R::Field) -> Ordering {
    b.cmp_field(a, field)
}

pub fn comparator<R: ListRecord>(ordering: OrderingSpec<R::Field>) -> impl Fn(&R, &R) -> Ordering {
    move |a: &R, b: &R| {
        let base = descending_comparator(a, b, ordering.field);
        match ordering.direction {
            SortDirection::Desc => base,
            SortDirection::Asc => base.reverse(),
        }
    }
}

/// Sorts by `compare`, breaking ties by source position so equal rows keep
/// their relative order whatever the underlying sort does.
pub fn stable_sort<'a, R, C>(rows: &'a [R], compare: C) -> Vec<&'a R>
where
    C: Fn(&R, &R) -> Ordering,
{
    let mut decorated: Vec<(usize, &R)> = rows.iter().enumerate().collect();
    decorated.sort_unstable_by(|(left_index, left), (right_index, right)| {
        compare(left, right).then_with(|| left_index.cmp(right_index))
    });
    decorated.into_iter().map(|(_, row)| row).collect()
}

pub fn name_matches(name: &str, query: &str) -> bool {
    name.to_lowercase().contains(&query.to_lowercase())
}

pub fn filter_by_name<'a, R: ListRecord>(rows: Vec<&'a R>, query: &str) -> Vec<&'a R> {
    if query.is_empty() {
        return rows;
    }
    rows.into_iter()
        .filter(|row| name_matches(row.name(), query))
        .collect()
}

/// Stable sort, then narrow to rows whose name contains `query` ignoring case.
/// The filter runs over the sorted rows, so matches keep the requested order.
pub fn apply_sort_filter<'a, R, C>(rows: &'a [R], compare: C, query: &str) -> Vec<&'a R>
where
    R: ListRecord,
    C: Fn(&R, &R) -> Ordering,
{
    filter_by_name(stable_sort(rows, compare), query)
}

pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    len.div_ceil(page_size).max(1)
}

/// Rows on 1-based `page`. Pages outside the data yield an empty slice.
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}
