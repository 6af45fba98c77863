use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    models::OrderStatus,
    table::{PageSize, SortBy, SortDirection, TableState},
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CatalogQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub q: Option<String>,
    pub category: Option<String>,
    pub sort_order: Option<SortOrder>,
}

/// Grid state carried in the query string of the vendor table endpoints.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TableQuery {
    pub q: Option<String>,
    pub sort_by: Option<String>,
    pub sort_desc: Option<bool>,
    /// Zero-based.
    pub page_index: Option<usize>,
    #[schema(value_type = Option<usize>)]
    pub page_size: Option<PageSize>,
    /// Orders table only.
    pub status: Option<OrderStatus>,
}

impl TableQuery {
    pub fn table_state(&self) -> TableState {
        let sort = self
            .sort_by
            .as_ref()
            .filter(|key| !key.is_empty())
            .map(|key| SortBy {
                key: key.clone(),
                direction: if self.sort_desc.unwrap_or(false) {
                    SortDirection::Desc
                } else {
                    SortDirection::Asc
                },
            });
        TableState {
            sort,
            filter: self.q.clone().unwrap_or_default(),
            page_index: self.page_index.unwrap_or(0),
            page_size: self.page_size.unwrap_or_default(),
        }
    }
}
