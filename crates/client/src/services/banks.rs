//! Bank endpoints.

use crate::error::ApiError;
use crate::http::{HttpClient, send_bytes, send_empty, send_json};
use reqwest::multipart::{Form, Part};
use riskdash_cache::keys;
use riskdash_cache::{BankEntry, DomainCaches};
use riskdash_domain::entities::{Bank, BankImportReport, BankInput};
use riskdash_domain::value_objects::{BankPage, ExposureMatrix, ListQuery};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Deserialize)]
struct BankBody {
    bank: Bank,
}

/// Service for `/api/banks`.
#[derive(Clone)]
pub struct BankService {
    http: HttpClient,
    caches: Arc<DomainCaches>,
}

impl BankService {
    /// Creates a new BankService.
    pub(crate) fn new(http: HttpClient, caches: Arc<DomainCaches>) -> Self {
        Self { http, caches }
    }

    /// One page of banks.
    ///
    /// # Errors
    /// Returns the backend's error; failures are not cached.
    pub async fn list(&self, query: &ListQuery) -> Result<BankPage, ApiError> {
        let key = keys::bank_list(query);
        let entry = self
            .caches
            .banks
            .get_or_set(&key, self.caches.banks_ttl(), || async {
                let request = self.http.get("/api/banks").query(&query.to_pairs());
                let page: BankPage = send_json(request).await?;
                Ok::<_, ApiError>(BankEntry::Page(page))
            })
            .await?;
        match entry {
            BankEntry::Page(page) => Ok(page),
            _ => Err(cache_mismatch(&key)),
        }
    }

    /// A single bank.
    ///
    /// # Errors
    /// Returns [`ApiError::NotFound`] for an unknown id.
    pub async fn get(&self, id: Uuid) -> Result<Bank, ApiError> {
        let key = keys::bank(id);
        let entry = self
            .caches
            .banks
            .get_or_set(&key, self.caches.banks_ttl(), || async {
                let body: BankBody = send_json(self.http.get(&format!("/api/banks/{id}"))).await?;
                Ok::<_, ApiError>(BankEntry::Bank(body.bank))
            })
            .await?;
        match entry {
            BankEntry::Bank(bank) => Ok(bank),
            _ => Err(cache_mismatch(&key)),
        }
    }

    /// Creates a bank. Admin only.
    ///
    /// A missing capital buffer is derived from the CET1 ratio and total
    /// assets before sending.
    ///
    /// # Errors
    /// Returns a validation error before sending, or the backend's rejection
    /// ([`ApiError::Conflict`] for a duplicate name).
    pub async fn create(&self, input: &BankInput) -> Result<Bank, ApiError> {
        input.validate_for_create()?;
        let body = BankInput {
            capital_buffer: input.effective_capital_buffer(),
            ..input.clone()
        };
        let request = self.http.post("/api/banks").json(&body);
        let created: BankBody = send_json(request).await?;
        self.invalidate();
        info!(bank_id = %created.bank.id, name = %created.bank.name, "Bank created");
        Ok(created.bank)
    }

    /// Updates the fields present in `input`. Admin only.
    ///
    /// # Errors
    /// Returns a validation error before sending, or the backend's rejection.
    pub async fn update(&self, id: Uuid, input: &BankInput) -> Result<Bank, ApiError> {
        input.validate_for_update()?;
        let request = self.http.put(&format!("/api/banks/{id}")).json(input);
        let updated: BankBody = send_json(request).await?;
        self.invalidate();
        info!(bank_id = %id, "Bank updated");
        Ok(updated.bank)
    }

    /// Deletes a bank. Admin only.
    ///
    /// # Errors
    /// Returns the backend's error.
    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        send_empty(self.http.delete(&format!("/api/banks/{id}"))).await?;
        self.invalidate();
        info!(bank_id = %id, "Bank deleted");
        Ok(())
    }

    /// Uploads a CSV of banks. Admin only.
    ///
    /// Rows are upserted by name; rejected rows come back in
    /// [`BankImportReport::errors`] without failing the call.
    ///
    /// # Errors
    /// Returns a validation error for a missing or non-CSV file name before
    /// sending, or the backend's rejection.
    pub async fn import(&self, file_name: &str, csv: Vec<u8>) -> Result<BankImportReport, ApiError> {
        BankImportReport::validate_file_name(file_name)?;
        let part = Part::bytes(csv)
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let request = self
            .http
            .post("/api/banks/import")
            .multipart(Form::new().part("file", part));
        let report: BankImportReport = send_json(request).await?;
        self.invalidate();
        info!(
            created = report.created,
            updated = report.updated,
            rejected = report.errors.len(),
            "Banks imported"
        );
        Ok(report)
    }

    /// All banks as the backend's CSV export.
    ///
    /// # Errors
    /// Returns the backend's error.
    pub async fn export_csv(&self) -> Result<Vec<u8>, ApiError> {
        send_bytes(self.http.get("/api/banks/export")).await
    }

    /// Pairwise interbank exposures.
    ///
    /// # Errors
    /// Returns [`ApiError::NotFound`] when no banks exist.
    pub async fn exposure_matrix(&self) -> Result<ExposureMatrix, ApiError> {
        let entry = self
            .caches
            .banks
            .get_or_set(keys::EXPOSURE_MATRIX, self.caches.banks_ttl(), || async {
                let matrix: ExposureMatrix =
                    send_json(self.http.get("/api/banks/exposure-matrix")).await?;
                Ok::<_, ApiError>(BankEntry::Exposure(matrix))
            })
            .await?;
        match entry {
            BankEntry::Exposure(matrix) => Ok(matrix),
            _ => Err(cache_mismatch(keys::EXPOSURE_MATRIX)),
        }
    }

    fn invalidate(&self) {
        if let Some(pattern) = keys::all_banks() {
            let removed = self.caches.banks.invalidate_pattern(&pattern);
            debug!(removed, "Bank cache invalidated");
        }
    }
}

pub(crate) fn cache_mismatch(key: &str) -> ApiError {
    ApiError::Decode(format!("cache entry {key} holds an unexpected type"))
}
