use serde::Serialize;
use utoipa::ToSchema;

use crate::table::TablePage;

/// Paging block of the envelope. Pages are 1-based here, whatever the source counts from.
#[derive(Debug, Serialize, ToSchema, Clone, Default)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
    pub page_count: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let page_count = if per_page > 0 {
            ((total + per_page - 1) / per_page).max(1)
        } else {
            1
        };
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
            page_count: Some(page_count),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// `total` counts rows left after the table filter.
impl From<&TablePage> for Meta {
    fn from(page: &TablePage) -> Self {
        Self {
            page: Some(page.page_index as i64 + 1),
            per_page: Some(page.page_size as i64),
            total: Some(page.filtered_rows as i64),
            page_count: Some(page.page_count.max(1) as i64),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}
