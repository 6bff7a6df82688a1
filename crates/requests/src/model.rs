use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::fmt;
use std::str::FromStr;

use crate::error::RequestError;

/// What a work request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// Procurement of new items
    Pengadaan,
    /// Repair of existing items
    Perbaikan,
    /// Loan of items or locations
    Peminjaman,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Pengadaan => "pengadaan",
            RequestKind::Perbaikan => "perbaikan",
            RequestKind::Peminjaman => "peminjaman",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestKind {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pengadaan" => Ok(RequestKind::Pengadaan),
            "perbaikan" => Ok(RequestKind::Perbaikan),
            "peminjaman" => Ok(RequestKind::Peminjaman),
            other => Err(RequestError::InvalidKind(other.to_string())),
        }
    }
}

/// Lifecycle stage of a work request.
///
/// Transitions are unguarded: any status may replace any other, including
/// moving a finished request back to `Diajukan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    /// Submitted; the initial status
    Diajukan,
    /// Approved
    Disetujui,
    /// Rejected
    Ditolak,
    /// In progress
    Diproses,
    /// Done
    Selesai,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 5] = [
        RequestStatus::Diajukan,
        RequestStatus::Disetujui,
        RequestStatus::Ditolak,
        RequestStatus::Diproses,
        RequestStatus::Selesai,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Diajukan => "DIAJUKAN",
            RequestStatus::Disetujui => "DISETUJUI",
            RequestStatus::Ditolak => "DITOLAK",
            RequestStatus::Diproses => "DIPROSES",
            RequestStatus::Selesai => "SELESAI",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| RequestError::InvalidStatus(s.to_string()))
    }
}

/// Batched line items, one parallel list per attribute.
///
/// `D` is the date representation: raw strings on input, calendar dates once validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItems<D> {
    // Procurement
    #[serde(rename = "nama_barang_array")]
    pub item_names: Vec<String>,
    #[serde(rename = "type_model_array")]
    pub type_models: Vec<String>,
    #[serde(rename = "jumlah_array")]
    pub quantities: Vec<i32>,
    #[serde(rename = "keterangan_array")]
    pub notes: Vec<String>,

    // Repair
    #[serde(rename = "nama_barang_perbaikan_array")]
    pub repair_item_names: Vec<String>,
    #[serde(rename = "type_model_perbaikan_array")]
    pub repair_type_models: Vec<String>,
    #[serde(rename = "jumlah_perbaikan_array")]
    pub repair_quantities: Vec<i32>,
    #[serde(rename = "jenis_pekerjaan_array")]
    pub job_descriptions: Vec<String>,
    #[serde(rename = "lokasi_perbaikan_array")]
    pub repair_locations: Vec<String>,

    // Loan
    #[serde(rename = "lokasi_peminjaman_array")]
    pub loan_locations: Vec<String>,
    #[serde(rename = "kegunaan_array")]
    pub purposes: Vec<String>,
    #[serde(rename = "tgl_peminjaman_array")]
    pub borrow_dates: Vec<D>,
    #[serde(rename = "tgl_pengembalian_array")]
    pub return_dates: Vec<D>,
}

impl<D> Default for LineItems<D> {
    fn default() -> Self {
        Self {
            item_names: Vec::new(),
            type_models: Vec::new(),
            quantities: Vec::new(),
            notes: Vec::new(),
            repair_item_names: Vec::new(),
            repair_type_models: Vec::new(),
            repair_quantities: Vec::new(),
            job_descriptions: Vec::new(),
            repair_locations: Vec::new(),
            loan_locations: Vec::new(),
            purposes: Vec::new(),
            borrow_dates: Vec::new(),
            return_dates: Vec::new(),
        }
    }
}

/// A submitted procurement, repair or loan ticket
#[derive(Debug, Clone, Serialize)]
pub struct WorkRequest {
    pub id: i64,
    #[serde(rename = "jenis_request")]
    pub kind: RequestKind,
    pub unit: String,

    #[serde(flatten)]
    pub line_items: LineItems<NaiveDate>,

    // Single-item fields
    #[serde(rename = "nama_barang")]
    pub item_name: Option<String>,
    pub type_model: Option<String>,
    #[serde(rename = "jumlah")]
    pub quantity: Option<i32>,
    #[serde(rename = "jenis_pekerjaan")]
    pub job_description: Option<String>,
    #[serde(rename = "lokasi")]
    pub location: Option<String>,
    #[serde(rename = "kegunaan")]
    pub purpose: Option<String>,
    #[serde(rename = "tgl_peminjaman")]
    pub borrow_date: Option<NaiveDate>,
    #[serde(rename = "tgl_pengembalian")]
    pub return_date: Option<NaiveDate>,

    #[serde(rename = "tgl_request")]
    pub request_date: NaiveDate,
    #[serde(rename = "keterangan")]
    pub remarks: Option<String>,
    #[serde(rename = "status_request")]
    pub status: RequestStatus,
    /// Requester's display name at creation time, not a reference to the account
    pub requested_by: String,
    pub approved_by: Option<String>,
    pub accepted_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn decode_error(column: &str, source: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}

impl<'r> FromRow<'r, SqliteRow> for WorkRequest {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let kind: String = row.try_get("jenis_request")?;
        let kind: RequestKind = kind.parse().map_err(|e| decode_error("jenis_request", e))?;

        let status: String = row.try_get("status_request")?;
        let status: RequestStatus = status.parse().map_err(|e| decode_error("status_request", e))?;

        let line_items: String = row.try_get("line_items")?;
        let line_items: LineItems<NaiveDate> = serde_json::from_str(&line_items).map_err(|e| decode_error("line_items", e))?;

        Ok(WorkRequest {
            id: row.try_get("id")?,
            kind,
            unit: row.try_get("unit")?,
            line_items,
            item_name: row.try_get("nama_barang")?,
            type_model: row.try_get("type_model")?,
            quantity: row.try_get("jumlah")?,
            job_description: row.try_get("jenis_pekerjaan")?,
            location: row.try_get("lokasi")?,
            purpose: row.try_get("kegunaan")?,
            borrow_date: row.try_get("tgl_peminjaman")?,
            return_date: row.try_get("tgl_pengembalian")?,
            request_date: row.try_get("tgl_request")?,
            remarks: row.try_get("keterangan")?,
            status,
            requested_by: row.try_get("requested_by")?,
            approved_by: row.try_get("approved_by")?,
            accepted_by: row.try_get("accepted_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Input for creating a work request, exactly as submitted.
///
/// Kind and dates stay as strings so each can be rejected with a precise error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRequest {
    #[serde(rename = "jenis_request")]
    pub kind: String,
    pub unit: String,

    #[serde(flatten)]
    pub line_items: LineItems<String>,

    #[serde(rename = "nama_barang")]
    pub item_name: Option<String>,
    pub type_model: Option<String>,
    #[serde(rename = "jumlah")]
    pub quantity: Option<i32>,
    #[serde(rename = "jenis_pekerjaan")]
    pub job_description: Option<String>,
    #[serde(rename = "lokasi")]
    pub location: Option<String>,
    #[serde(rename = "kegunaan")]
    pub purpose: Option<String>,
    #[serde(rename = "tgl_peminjaman")]
    pub borrow_date: Option<String>,
    #[serde(rename = "tgl_pengembalian")]
    pub return_date: Option<String>,

    #[serde(rename = "tgl_request")]
    pub request_date: String,
    #[serde(rename = "keterangan")]
    pub remarks: Option<String>,
}

/// New status plus the fields written alongside it; `None` clears approver or acceptor
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub status: RequestStatus,
    pub approved_by: Option<String>,
    pub accepted_by: Option<String>,
    pub remarks: String,
}

impl StatusUpdate {
    pub fn new(status: RequestStatus) -> Self {
        Self {
            status,
            approved_by: None,
            accepted_by: None,
            remarks: String::new(),
        }
    }
}
