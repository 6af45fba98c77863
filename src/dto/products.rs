use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Product;

/// Ordered option list (sizes, colors) that only grows at the end or drops its last entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Vec<String>)]
pub struct OptionList(Vec<String>);

impl OptionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank entries are ignored.
    pub fn push(&mut self, value: impl Into<String>) {
        let value = value.into();
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            self.0.push(trimmed.to_string());
        }
    }

    pub fn remove_last(&mut self) -> Option<String> {
        self.0.pop()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for OptionList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = OptionList::new();
        for value in iter {
            list.push(value);
        }
        list
    }
}

/// Product add/edit form as submitted by a seller.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub price: Option<i64>,
    pub description: Option<String>,
    #[serde(default)]
    pub sizes: OptionList,
    #[serde(default)]
    pub colors: OptionList,
}

/// Image bytes received with a form, not yet written to the object store.
#[derive(Debug, Clone)]
pub struct PendingImage {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadedFile {
    pub key: String,
    pub url: String,
    pub bytes: u64,
}
