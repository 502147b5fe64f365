// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use time::OffsetDateTime;

use crate::fetch::{FetchError, FetchState, PanelState, panel_state};
use crate::ids::{RequestId, RowId};
use crate::model::{CredentialDocument, EmissionRow, OrderingSpec, SortField, SummaryRow};
use crate::views::{DocumentPager, TableView};

#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    pub table: TableView<EmissionRow>,
    pub summary: Vec<SummaryRow>,
    pub documents: DocumentPager,
    pub fetch: FetchState,
    pub asset_id: String,
    pub status_line: Option<String>,
    mounted: bool,
    last_request: RequestId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageCommand {
    StartFetch,
    FetchCompleted {
        request_id: RequestId,
        result: Result<Vec<CredentialDocument>, FetchError>,
        finished_at: OffsetDateTime,
    },
    RequestSort(SortField),
    SetQuery(String),
    SelectAll(bool),
    ToggleRow { id: RowId, checked: bool },
    SetTablePage(usize),
    SetDocumentPage(usize),
    NextDocument,
    PrevDocument,
    SetStatus(String),
    ClearStatus,
    Unmount,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    FetchStarted(RequestId),
    FetchReady { count: usize },
    FetchFailed(FetchError),
    SortChanged(OrderingSpec<SortField>),
    QueryChanged(String),
    SelectionChanged(usize),
    TablePageChanged(usize),
    DocumentPageChanged(usize),
    StatusUpdated(String),
    StatusCleared,
    Unmounted,
}

impl PageState {
    pub fn new(
        rows: Vec<EmissionRow>,
        summary: Vec<SummaryRow>,
        asset_id: &str,
        rows_per_page: usize,
    ) -> Result<Self> {
        Ok(Self {
            table: TableView::new(rows, OrderingSpec::default(), rows_per_page)?,
            summary,
            documents: DocumentPager::default(),
            fetch: FetchState::Idle,
            asset_id: asset_id.to_owned(),
            status_line: None,
            mounted: true,
            last_request: RequestId::new(0),
        })
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn panel(&self) -> PanelState<'_> {
        panel_state(&self.fetch, &self.documents)
    }

    pub fn dispatch(&mut self, command: PageCommand) -> Vec<PageEvent> {
        match command {
            PageCommand::StartFetch => self.start_fetch(),
            PageCommand::FetchCompleted {
                request_id,
                result,
                finished_at,
            } => self.complete_fetch(request_id, result, finished_at),
            PageCommand::RequestSort(field) => {
                vec![PageEvent::SortChanged(self.table.request_sort(field))]
            }
            PageCommand::SetQuery(query) => {
                self.table.set_query(&query);
                vec![
                    PageEvent::QueryChanged(query),
                    PageEvent::TablePageChanged(self.table.page()),
                ]
            }
            PageCommand::SelectAll(checked) => {
                self.table.select_all(checked);
                vec![PageEvent::SelectionChanged(self.table.selected_count())]
            }
            PageCommand::ToggleRow { id, checked } => {
                if self.table.toggle_row(id, checked) {
                    vec![PageEvent::SelectionChanged(self.table.selected_count())]
                } else {
                    Vec::new()
                }
            }
            PageCommand::SetTablePage(page) => {
                let before = self.table.page();
                let after = self.table.set_page(page);
                if before == after {
                    Vec::new()
                } else {
                    vec![PageEvent::TablePageChanged(after)]
                }
            }
            PageCommand::SetDocumentPage(page) => {
                if self.documents.set_page(page) {
                    vec![PageEvent::DocumentPageChanged(self.documents.page())]
                } else {
                    Vec::new()
                }
            }
            PageCommand::NextDocument => {
                let len = self.fetch.documents().len();
                if self.documents.next(len) {
                    vec![PageEvent::DocumentPageChanged(self.documents.page())]
                } else {
                    Vec::new()
                }
            }
            PageCommand::PrevDocument => {
                let len = self.fetch.documents().len();
                if self.documents.prev(len) {
                    vec![PageEvent::DocumentPageChanged(self.documents.page())]
                } else {
                    Vec::new()
                }
            }
            PageCommand::SetStatus(message) => vec![self.set_status(message)],
            PageCommand::ClearStatus => {
                self.status_line = None;
                vec![PageEvent::StatusCleared]
            }
            PageCommand::Unmount => {
                self.mounted = false;
                vec![PageEvent::Unmounted]
            }
        }
    }

    fn start_fetch(&mut self) -> Vec<PageEvent> {
        if !self.mounted {
            return Vec::new();
        }
        self.last_request = self.last_request.next();
        self.fetch = FetchState::Loading {
            request_id: self.last_request,
        };
        vec![PageEvent::FetchStarted(self.last_request)]
    }

    fn complete_fetch(
        &mut self,
        request_id: RequestId,
        result: Result<Vec<CredentialDocument>, FetchError>,
        finished_at: OffsetDateTime,
    ) -> Vec<PageEvent> {
        if !self.mounted || self.fetch.in_flight() != Some(request_id) {
            return Vec::new();
        }

        match result {
            Ok(documents) => {
                let count = documents.len();
                self.fetch = FetchState::Ready {
                    documents,
                    fetched_at: finished_at,
                };
                self.documents.reset();
                vec![
                    PageEvent::FetchReady { count },
                    PageEvent::DocumentPageChanged(self.documents.page()),
                ]
            }
            Err(error) => {
                self.fetch = FetchState::Failed {
                    error: error.clone(),
                };
                vec![PageEvent::FetchFailed(error)]
            }
        }
    }

    fn set_status(&mut self, message: String) -> PageEvent {
        self.status_line = Some(message.clone());
        PageEvent::StatusUpdated(message)
    }
}
