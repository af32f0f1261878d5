use serde::{Deserialize, Serialize};

/// Spring-style page envelope shared by every list endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
    #[serde(default)]
    pub empty: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_elements: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pageable: Option<Pageable>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pageable {
    pub page_number: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        !self.last && self.number + 1 < self.total_pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            size: self.size,
            number: self.number,
            first: self.first,
            last: self.last,
            empty: self.empty,
            number_of_elements: self.number_of_elements,
            pageable: self.pageable,
        }
    }
}

/// Zero-based paging parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub size: u32,
    pub search: Option<String>,
    pub sort: Option<String>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: 0, size: 10, search: None, sort: None }
    }
}

impl PageQuery {
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs =
            vec![("page".to_string(), self.page.to_string()), ("size".to_string(), self.size.to_string())];
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
            pairs.push(("search".to_string(), search.to_string()));
        }
        if let Some(sort) = self.sort.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
            pairs.push(("sort".to_string(), sort.to_string()));
        }
        pairs
    }
}
