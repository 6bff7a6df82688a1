//! Work request lifecycle
//!
//! Provides:
//! - Procurement, repair and loan requests with single-item and batched fields
//! - The unguarded status state machine (DIAJUKAN, DISETUJUI, DITOLAK, DIPROSES, SELESAI)
//! - Listing by status or requester, and offset/limit pagination

pub mod error;
pub mod model;
pub mod pagination;
pub mod service;

pub use error::{RequestError, Result};
pub use model::{LineItems, NewRequest, RequestKind, RequestStatus, StatusUpdate, WorkRequest};
pub use pagination::{paginate, Page, PageInfo};
pub use service::{parse_date, RequestService, DATE_FORMAT};
