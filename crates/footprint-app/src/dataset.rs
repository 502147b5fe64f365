// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::fetch::{FetchError, parse_documents};
use crate::model::{CredentialDocument, EmissionRow, SummaryRow};

pub const DEFAULT_ASSET_ID: &str = "iata:Piece/KobePiece";

const DEMO_CREDENTIALS: &str = r#"[
  {
    "@context": ["https://www.w3.org/2018/credentials/v1"],
    "id": "urn:uuid:1f0c9a52-5d0e-4d4b-9c7e-3b7f0c2a9e11",
    "type": ["VerifiableCredential"],
    "issuer": "did:web:carrier.example",
    "issuanceDate": "2023-03-14T09:00:00Z",
    "credentialSubject": {
      "id": "iata:Piece/KobePiece",
      "type": "piece",
      "grossWeight": { "value": 12.5, "unit": "KGM" },
      "goodsDescription": "Wagyu beef, chilled"
    }
  },
  {
    "@context": ["https://www.w3.org/2018/credentials/v1"],
    "id": "urn:uuid:6a3e2f10-8c1b-4a57-a0de-59f1d7b6c402",
    "type": ["VerifiableCredential"],
    "issuer": "did:web:carrier.example",
    "issuanceDate": "2023-03-14T11:30:00Z",
    "credentialSubject": {
      "id": "iata:Shipment/KIX-FRA-0314",
      "type": "shipment",
      "departureLocation": "KIX",
      "arrivalLocation": "FRA"
    }
  },
  {
    "@context": ["https://www.w3.org/2018/credentials/v1"],
    "id": "urn:uuid:b7d45e09-2f6c-4e31-8d90-c1a5e3f7d8b2",
    "type": ["VerifiableCredential"],
    "issuer": "did:web:verifier.example",
    "issuanceDate": "2023-03-15T08:15:00Z",
    "credentialSubject": {
      "id": "iata:Piece/KobePiece#footprint",
      "type": "emissions",
      "co2e": { "value": 3.92, "unit": "KGM" },
      "benchmark": { "value": 5.584, "unit": "KGM" }
    }
  }
]"#;

/// Production-stage gases for one product against its category benchmark.
pub fn production_emissions() -> Vec<EmissionRow> {
    vec![
        EmissionRow::new(0, "CO2", 3.1, 4.464),
        EmissionRow::new(1, "CH4", 0.8, 1.1),
        EmissionRow::new(2, "N2O", 0.02, 0.02),
        EmissionRow::new(3, "Total production", 3.92, 5.584),
    ]
}

pub fn summary_rows() -> Vec<SummaryRow> {
    vec![
        SummaryRow::new("Processing", Some(0.2), Some(0.9)),
        SummaryRow::new("Transportation", None, None),
        SummaryRow::new("Grand Total", None, None).highlighted(),
    ]
}

pub fn demo_credentials_json() -> &'static str {
    DEMO_CREDENTIALS
}

/// Bundled documents for offline runs.
pub fn demo_credentials() -> Result<Vec<CredentialDocument>, FetchError> {
    parse_documents(DEMO_CREDENTIALS)
}
