// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::collections::BTreeSet;

use crate::ids::RowId;
use crate::listview::{ListRecord, apply_sort_filter, comparator, page_count, page_slice};
use crate::model::{CredentialDocument, OrderingSpec};

pub const DEFAULT_ROWS_PER_PAGE: usize = 5;
pub const MAX_ROWS_PER_PAGE: usize = 100;

/// Sortable, filterable, selectable and paged view over a fixed row set.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView<R: ListRecord> {
    rows: Vec<R>,
    ordering: OrderingSpec<R::Field>,
    query: String,
    selected: BTreeSet<RowId>,
    page: usize,
    rows_per_page: usize,
}

impl<R> TableView<R>
where
    R: ListRecord,
    R::Field: PartialEq,
{
    pub fn new(rows: Vec<R>, ordering: OrderingSpec<R::Field>, rows_per_page: usize) -> Result<Self> {
        validate_rows_per_page(rows_per_page)?;
        Ok(Self {
            rows,
            ordering,
            query: String::new(),
            selected: BTreeSet::new(),
            page: 1,
            rows_per_page,
        })
    }

    pub fn ordering(&self) -> OrderingSpec<R::Field> {
        self.ordering
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn request_sort(&mut self, field: R::Field) -> OrderingSpec<R::Field> {
        self.ordering = self.ordering.toggled(field);
        self.ordering
    }

    /// Query and page change together so no render sees the new query on a stale page.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_owned();
        self.page = 1;
    }

    pub fn select_all(&mut self, checked: bool) {
        if checked {
            self.selected = self.rows.iter().map(ListRecord::id).collect();
        } else {
            self.selected.clear();
        }
    }

    /// Returns whether the selection changed. Unknown ids are ignored.
    pub fn toggle_row(&mut self, id: RowId, checked: bool) -> bool {
        if !self.rows.iter().any(|row| row.id() == id) {
            return false;
        }
        if checked {
            self.selected.insert(id)
        } else {
            self.selected.remove(&id)
        }
    }

    pub fn is_selected(&self, id: RowId) -> bool {
        self.selected.contains(&id)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn all_selected(&self) -> bool {
        !self.rows.is_empty() && self.selected.len() == self.rows.len()
    }

    pub fn visible_rows(&self) -> Vec<&R> {
        apply_sort_filter(&self.rows, comparator::<R>(self.ordering), &self.query)
    }

    pub fn page_count(&self) -> usize {
        page_count(self.visible_rows().len(), self.rows_per_page)
    }

    pub fn set_page(&mut self, page: usize) -> usize {
        self.page = page.clamp(1, self.page_count());
        self.page
    }

    pub fn page_rows(&self) -> Vec<&R> {
        let visible = self.visible_rows();
        page_slice(&visible, self.page, self.rows_per_page).to_vec()
    }

    /// Blank rows that keep a later page as tall as a full one.
    pub fn empty_rows(&self) -> usize {
        if self.page <= 1 {
            return 0;
        }
        self.rows_per_page
            .saturating_sub(self.page_rows().len())
    }

    pub fn is_not_found(&self) -> bool {
        !self.query.is_empty() && self.visible_rows().is_empty()
    }
}

pub fn validate_rows_per_page(rows_per_page: usize) -> Result<()> {
    if !(1..=MAX_ROWS_PER_PAGE).contains(&rows_per_page) {
        bail!("rows per page must be between 1 and {MAX_ROWS_PER_PAGE}, got {rows_per_page}");
    }
    Ok(())
}

/// One-document-per-page cursor over the credential collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentPager {
    page: usize,
}

impl Default for DocumentPager {
    fn default() -> Self {
        Self { page: 1 }
    }
}

impl DocumentPager {
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn current_index(&self) -> usize {
        self.page - 1
    }

    /// Page 0 is ignored. Pages past the collection are kept and render the fallback.
    pub fn set_page(&mut self, page: usize) -> bool {
        if page == 0 || page == self.page {
            return false;
        }
        self.page = page;
        true
    }

    pub fn next(&mut self, len: usize) -> bool {
        if self.page >= len {
            return false;
        }
        self.page += 1;
        true
    }

    pub fn prev(&mut self, len: usize) -> bool {
        let target = self.page.saturating_sub(1).min(len).max(1);
        if target == self.page {
            return false;
        }
        self.page = target;
        true
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    pub fn current<'a>(&self, documents: &'a [CredentialDocument]) -> Option<&'a CredentialDocument> {
        documents.get(self.current_index())
    }
}

#[cfg(test)]
mod tests {
    use super::{DocumentPager, TableView, validate_rows_per_page};
    use crate::ids::RowId;
    use crate::model::{CredentialDocument, EmissionRow, OrderingSpec, SortDirection, SortField};
    use anyhow::Result;
    use serde_json::json;

    fn table(rows: Vec<EmissionRow>, rows_per_page: usize) -> Result<TableView<EmissionRow>> {
        TableView::new(rows, OrderingSpec::default(), rows_per_page)
    }

    fn production() -> Vec<EmissionRow> {
        vec![
            EmissionRow::new(0, "CO2", 3.1, 4.464),
            EmissionRow::new(1, "CH4", 0.8, 1.1),
            EmissionRow::new(2, "N2O", 0.02, 0.02),
            EmissionRow::new(3, "Total production", 3.92, 5.584),
        ]
    }

    fn names(view: &TableView<EmissionRow>) -> Vec<String> {
        view.page_rows().iter().map(|row| row.name.clone()).collect()
    }

    #[test]
    fn defaults_sort_by_name_ascending() -> Result<()> {
        let view = table(production(), 5)?;
        assert_eq!(
            view.ordering(),
            OrderingSpec::new(SortDirection::Asc, SortField::Name)
        );
        assert_eq!(view.page(), 1);
        assert_eq!(view.query(), "");
        assert_eq!(view.selected_count(), 0);
        assert_eq!(names(&view), vec!["CH4", "CO2", "N2O", "Total production"]);
        Ok(())
    }

    #[test]
    fn request_sort_toggles_direction_on_same_column() -> Result<()> {
        let mut view = table(production(), 5)?;
        view.request_sort(SortField::Ours);
        assert_eq!(names(&view), vec!["N2O", "CH4", "CO2", "Total production"]);

        let ordering = view.request_sort(SortField::Ours);
        assert_eq!(ordering.direction, SortDirection::Desc);
        assert_eq!(names(&view), vec!["Total production", "CO2", "CH4", "N2O"]);
        Ok(())
    }

    #[test]
    fn set_query_resets_page_in_one_step() -> Result<()> {
        let rows = (0..12)
            .map(|index| EmissionRow::new(index, &format!("gas-{index:02}"), 1.0, 2.0))
            .collect();
        let mut view = table(rows, 5)?;
        assert_eq!(view.set_page(3), 3);

        view.set_query("gas-1");
        assert_eq!(view.page(), 1);
        assert_eq!(view.visible_rows().len(), 2);
        Ok(())
    }

    #[test]
    fn not_found_requires_a_query() -> Result<()> {
        let mut view = table(Vec::new(), 5)?;
        assert!(!view.is_not_found());

        let mut view_with_rows = table(production(), 5)?;
        view_with_rows.set_query("sf6");
        assert!(view_with_rows.is_not_found());
        assert!(view_with_rows.page_rows().is_empty());

        view_with_rows.set_query("");
        assert!(!view_with_rows.is_not_found());

        view.set_query("co2");
        assert!(view.is_not_found());
        Ok(())
    }

    #[test]
    fn select_all_twice_returns_to_empty_even_with_duplicate_names() -> Result<()> {
        let rows = vec![
            EmissionRow::new(0, "CO2", 1.0, 2.0),
            EmissionRow::new(1, "CO2", 1.5, 2.0),
            EmissionRow::new(2, "CH4", 0.5, 1.0),
        ];
        let mut view = table(rows, 5)?;

        view.select_all(true);
        assert_eq!(view.selected_count(), 3);
        assert!(view.all_selected());

        view.select_all(false);
        assert_eq!(view.selected_count(), 0);
        assert!(!view.all_selected());
        Ok(())
    }

    #[test]
    fn toggling_one_duplicate_name_leaves_the_other_alone() -> Result<()> {
        let rows = vec![
            EmissionRow::new(0, "CO2", 1.0, 2.0),
            EmissionRow::new(1, "CO2", 1.5, 2.0),
        ];
        let mut view = table(rows, 5)?;

        assert!(view.toggle_row(RowId::new(1), true));
        assert!(view.is_selected(RowId::new(1)));
        assert!(!view.is_selected(RowId::new(0)));
        assert!(!view.toggle_row(RowId::new(1), true));
        assert!(view.toggle_row(RowId::new(1), false));
        assert!(!view.toggle_row(RowId::new(9), true));
        assert_eq!(view.selected_count(), 0);
        Ok(())
    }

    #[test]
    fn later_pages_pad_to_full_height() -> Result<()> {
        let rows = (0..7)
            .map(|index| EmissionRow::new(index, &format!("row-{index}"), 1.0, 2.0))
            .collect();
        let mut view = table(rows, 5)?;
        assert_eq!(view.page_count(), 2);
        assert_eq!(view.empty_rows(), 0);

        view.set_page(2);
        assert_eq!(view.page_rows().len(), 2);
        assert_eq!(view.empty_rows(), 3);

        assert_eq!(view.set_page(99), 2);
        assert_eq!(view.set_page(0), 1);
        Ok(())
    }

    #[test]
    fn rows_per_page_is_validated() {
        assert!(validate_rows_per_page(0).is_err());
        assert!(validate_rows_per_page(101).is_err());
        assert!(validate_rows_per_page(5).is_ok());
        let error = table(production(), 0).expect_err("zero page size should fail");
        assert!(error.to_string().contains("between 1 and 100"));
    }

    #[test]
    fn pager_index_is_page_minus_one() {
        let documents = vec![
            CredentialDocument::new(json!({ "credentialSubject": { "type": "piece" } })),
            CredentialDocument::new(json!({ "credentialSubject": { "type": "shipment" } })),
        ];
        let mut pager = DocumentPager::default();
        assert_eq!(pager.current_index(), 0);
        assert_eq!(
            pager.current(&documents).and_then(CredentialDocument::subject_type),
            Some("piece")
        );

        assert!(pager.next(documents.len()));
        assert_eq!(pager.current_index(), 1);
        assert!(!pager.next(documents.len()));

        assert!(pager.prev(documents.len()));
        assert!(!pager.prev(documents.len()));
        assert_eq!(pager.page(), 1);
    }

    #[test]
    fn pager_beyond_collection_yields_fallback_without_panicking() {
        let documents = vec![CredentialDocument::new(json!({}))];
        let mut pager = DocumentPager::default();
        assert!(!pager.set_page(0));
        assert!(pager.set_page(7));
        assert_eq!(pager.current_index(), 6);
        assert!(pager.current(&documents).is_none());
        assert!(pager.current(&[]).is_none());

        assert!(pager.prev(documents.len()));
        assert_eq!(pager.page(), 1);
    }
}
