use chrono::{NaiveDate, Utc};
use tracing::info;
use workreq_core::Database;

use crate::error::{RequestError, Result};
use crate::model::{LineItems, NewRequest, RequestKind, RequestStatus, StatusUpdate, WorkRequest};

const SELECT_REQUEST: &str = "SELECT * FROM request";
const NEWEST_FIRST: &str = "ORDER BY created_at DESC, id DESC";

/// Wire format of every calendar date
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` calendar date, naming `field` on failure.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    let invalid = || RequestError::InvalidDate {
        field: field.to_string(),
        value: value.to_string(),
    };

    // chrono tolerates unpadded months and days; the wire format does not
    if value.len() != 10 {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())
}

fn parse_optional_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value {
        Some(v) if !v.is_empty() => parse_date(field, v).map(Some),
        _ => Ok(None),
    }
}

fn parse_date_list(field: &str, values: &[String]) -> Result<Vec<NaiveDate>> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| parse_date(&format!("{field}[{i}]"), v))
        .collect()
}

fn validate_line_items(raw: &LineItems<String>) -> Result<LineItems<NaiveDate>> {
    Ok(LineItems {
        item_names: raw.item_names.clone(),
        type_models: raw.type_models.clone(),
        quantities: raw.quantities.clone(),
        notes: raw.notes.clone(),
        repair_item_names: raw.repair_item_names.clone(),
        repair_type_models: raw.repair_type_models.clone(),
        repair_quantities: raw.repair_quantities.clone(),
        job_descriptions: raw.job_descriptions.clone(),
        repair_locations: raw.repair_locations.clone(),
        loan_locations: raw.loan_locations.clone(),
        purposes: raw.purposes.clone(),
        borrow_dates: parse_date_list("tgl_peminjaman_array", &raw.borrow_dates)?,
        return_dates: parse_date_list("tgl_pengembalian_array", &raw.return_dates)?,
    })
}

/// Creation, listing and status transitions of work requests
#[derive(Debug, Clone)]
pub struct RequestService {
    db: Database,
}

impl RequestService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a request in status `DIAJUKAN` on behalf of `requester_id`.
    ///
    /// The requester's current display name is copied onto the request.
    pub async fn create(&self, new: &NewRequest, requester_id: &str) -> Result<WorkRequest> {
        let kind: RequestKind = new.kind.parse()?;
        if new.unit.trim().is_empty() {
            return Err(RequestError::MissingField("unit"));
        }
        if new.request_date.is_empty() {
            return Err(RequestError::MissingField("tgl_request"));
        }

        let request_date = parse_date("tgl_request", &new.request_date)?;
        let borrow_date = parse_optional_date("tgl_peminjaman", new.borrow_date.as_deref())?;
        let return_date = parse_optional_date("tgl_pengembalian", new.return_date.as_deref())?;
        let line_items = validate_line_items(&new.line_items)?;

        let requested_by = self.requester_name(requester_id).await?;
        let now = Utc::now();

        let line_items_json = serde_json::to_string(&line_items)?;

        let result = sqlx::query(
            "INSERT INTO request (
                jenis_request, unit, nama_barang, type_model, jumlah, lokasi,
                jenis_pekerjaan, kegunaan, line_items, tgl_request, tgl_peminjaman,
                tgl_pengembalian, keterangan, status_request, requested_by, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(kind.as_str())
        .bind(&new.unit)
        .bind(&new.item_name)
        .bind(&new.type_model)
        .bind(new.quantity)
        .bind(&new.location)
        .bind(&new.job_description)
        .bind(&new.purpose)
        .bind(line_items_json)
        .bind(request_date)
        .bind(borrow_date)
        .bind(return_date)
        .bind(&new.remarks)
        .bind(RequestStatus::Diajukan.as_str())
        .bind(&requested_by)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        let request = WorkRequest {
            id: result.last_insert_rowid(),
            kind,
            unit: new.unit.clone(),
            line_items,
            item_name: new.item_name.clone(),
            type_model: new.type_model.clone(),
            quantity: new.quantity,
            job_description: new.job_description.clone(),
            location: new.location.clone(),
            purpose: new.purpose.clone(),
            borrow_date,
            return_date,
            request_date,
            remarks: new.remarks.clone(),
            status: RequestStatus::Diajukan,
            requested_by,
            approved_by: None,
            accepted_by: None,
            created_at: now,
            updated_at: now,
        };

        info!(request_id = request.id, kind = %kind, requested_by = %request.requested_by, "Created work request");
        Ok(request)
    }

    pub async fn get(&self, id: i64) -> Result<WorkRequest> {
        sqlx::query_as::<_, WorkRequest>(&format!("{SELECT_REQUEST} WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or(RequestError::NotFound)
    }

    /// Every request, newest first
    pub async fn list_all(&self) -> Result<Vec<WorkRequest>> {
        let requests = sqlx::query_as::<_, WorkRequest>(&format!("{SELECT_REQUEST} {NEWEST_FIRST}"))
            .fetch_all(self.db.pool())
            .await?;
        Ok(requests)
    }

    /// Requests currently in `status`, newest first. No match is an empty list.
    pub async fn list_by_status(&self, status: RequestStatus) -> Result<Vec<WorkRequest>> {
        let requests = sqlx::query_as::<_, WorkRequest>(&format!(
            "{SELECT_REQUEST} WHERE status_request = ? {NEWEST_FIRST}"
        ))
        .bind(status.as_str())
        .fetch_all(self.db.pool())
        .await?;
        Ok(requests)
    }

    /// Requests whose requester name equals the account's current display name.
    ///
    /// Scans the full list; requests made before a rename are not matched.
    pub async fn list_by_requester(&self, account_id: &str) -> Result<Vec<WorkRequest>> {
        let name = self.requester_name(account_id).await?;

        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(|r| r.requested_by == name)
            .collect())
    }

    /// Set a new status, whatever the current one is.
    ///
    /// Approver, acceptor and remarks are replaced by the supplied values; an
    /// omitted approver or acceptor is cleared.
    pub async fn update_status(&self, id: i64, update: &StatusUpdate) -> Result<WorkRequest> {
        let result = sqlx::query(
            "UPDATE request
             SET status_request = ?,
                 approved_by = ?,
                 accepted_by = ?,
                 keterangan = ?,
                 updated_at = ?
             WHERE id = ?",
        )
        .bind(update.status.as_str())
        .bind(&update.approved_by)
        .bind(&update.accepted_by)
        .bind(&update.remarks)
        .bind(Utc::now())
        .bind(id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RequestError::NotFound);
        }

        info!(request_id = id, status = %update.status, "Updated request status");
        self.get(id).await
    }

    /// Delete a request. No ownership check happens here.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM request WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(RequestError::NotFound);
        }

        info!(request_id = id, "Deleted work request");
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM request")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    pub async fn count_by_status(&self, status: RequestStatus) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM request WHERE status_request = ?")
            .bind(status.as_str())
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    async fn requester_name(&self, account_id: &str) -> Result<String> {
        sqlx::query_scalar("SELECT name FROM users WHERE id = ?")
            .bind(account_id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or(RequestError::RequesterNotFound)
    }
}
