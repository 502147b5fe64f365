// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use time::OffsetDateTime;

use crate::ids::RequestId;
use crate::model::{CREDENTIAL_LABEL, CredentialDocument};
use crate::views::DocumentPager;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("cannot reach credential service: {0}")]
    Network(String),
    #[error("credential service timed out")]
    Timeout,
    #[error("credential service returned {code}: {message}")]
    Status { code: u16, message: String },
    #[error("malformed credential payload: {0}")]
    Malformed(String),
    #[error("credential fetch cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::Status { code, .. } => *code >= 500,
            Self::Malformed(_) | Self::Cancelled => false,
        }
    }
}

/// Shared flag that stops a fetch between attempts and during backoff.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Decodes a credential-service body: a JSON array of objects.
pub fn parse_documents(body: &str) -> Result<Vec<CredentialDocument>, FetchError> {
    let value: Value =
        serde_json::from_str(body).map_err(|error| FetchError::Malformed(error.to_string()))?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(FetchError::Malformed(format!(
                "expected a JSON array, got {}",
                json_kind(&other)
            )));
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if item.is_object() {
                Ok(CredentialDocument::new(item))
            } else {
                Err(FetchError::Malformed(format!(
                    "document {index} is {}, expected an object",
                    json_kind(&item)
                )))
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    Idle,
    Loading {
        request_id: RequestId,
    },
    Ready {
        documents: Vec<CredentialDocument>,
        fetched_at: OffsetDateTime,
    },
    Failed {
        error: FetchError,
    },
}

impl FetchState {
    pub fn documents(&self) -> &[CredentialDocument] {
        match self {
            Self::Ready { documents, .. } => documents,
            _ => &[],
        }
    }

    pub fn in_flight(&self) -> Option<RequestId> {
        match self {
            Self::Loading { request_id } => Some(*request_id),
            _ => None,
        }
    }
}

/// What the credential panel shows. Loading, empty and unavailable never overlap.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelState<'a> {
    Loading,
    Empty,
    Unavailable(&'a FetchError),
    Document {
        document: &'a CredentialDocument,
        page: usize,
        count: usize,
    },
    OutOfRange {
        page: usize,
        count: usize,
    },
}

impl PanelState<'_> {
    pub fn label(&self) -> String {
        match self {
            Self::Document { document, .. } => document.label(),
            _ => CREDENTIAL_LABEL.to_owned(),
        }
    }
}

pub fn panel_state<'a>(fetch: &'a FetchState, pager: &DocumentPager) -> PanelState<'a> {
    match fetch {
        FetchState::Idle | FetchState::Loading { .. } => PanelState::Loading,
        FetchState::Failed { error } => PanelState::Unavailable(error),
        FetchState::Ready { documents, .. } if documents.is_empty() => PanelState::Empty,
        FetchState::Ready { documents, .. } => match pager.current(documents) {
            Some(document) => PanelState::Document {
                document,
                page: pager.page(),
                count: documents.len(),
            },
            None => PanelState::OutOfRange {
                page: pager.page(),
                count: documents.len(),
            },
        },
    }
}
