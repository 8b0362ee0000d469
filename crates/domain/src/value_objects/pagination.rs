use crate::entities::{Bank, Simulation};
use crate::enums::{SimulationStatus, SortDirection};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Largest page size the backend honours.
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
}

impl Pagination {
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// One page of `GET /api/simulations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationPage {
    pub simulations: Vec<Simulation>,
    pub pagination: Pagination,
}

/// One page of `GET /api/banks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankPage {
    pub banks: Vec<Bank>,
    pub pagination: Pagination,
}

/// Filters, sorting and paging for list endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub per_page: u32,
    pub status: Option<SimulationStatus>,
    pub search: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<SortDirection>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
            status: None,
            search: None,
            start_date: None,
            end_date: None,
            sort_by: None,
            sort_dir: None,
        }
    }
}

impl ListQuery {
    /// Creates a query for the given page.
    #[must_use]
    pub fn page(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: SimulationStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    #[must_use]
    pub fn with_date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    #[must_use]
    pub fn sorted_by(mut self, field: impl Into<String>, dir: SortDirection) -> Self {
        self.sort_by = Some(field.into());
        self.sort_dir = Some(dir);
        self
    }

    /// Renders the query string pairs. Page size is clamped to the backend limit.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.max(1).to_string()),
            (
                "per_page".to_string(),
                self.per_page.clamp(1, MAX_PER_PAGE).to_string(),
            ),
        ];
        if let Some(status) = self.status {
            pairs.push(("status".to_string(), status.as_str().to_string()));
        }
        if let Some(search) = self.search.as_ref().filter(|s| !s.is_empty()) {
            pairs.push(("search".to_string(), search.clone()));
        }
        if let Some(start) = self.start_date {
            pairs.push(("start_date".to_string(), start.to_string()));
        }
        if let Some(end) = self.end_date {
            pairs.push(("end_date".to_string(), end.to_string()));
        }
        if let Some(sort_by) = &self.sort_by {
            pairs.push(("sort_by".to_string(), sort_by.clone()));
        }
        if let Some(dir) = self.sort_dir {
            pairs.push(("sort_dir".to_string(), dir.as_str().to_string()));
        }
        pairs
    }

    /// Stable textual form, used as part of cache keys.
    #[must_use]
    pub fn cache_fragment(&self) -> String {
        self.to_pairs()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_page_clamped() {
        let query = ListQuery {
            per_page: 500,
            ..Default::default()
        };
        assert!(
            query
                .to_pairs()
                .contains(&("per_page".to_string(), "100".to_string()))
        );
    }

    #[test]
    fn test_optional_filters_rendered() {
        let query = ListQuery::page(2, 25)
            .with_status(SimulationStatus::Running)
            .with_search("stress")
            .with_date_range(NaiveDate::from_ymd_opt(2024, 1, 31), None)
            .sorted_by("name", SortDirection::Asc);

        assert_eq!(
            query.cache_fragment(),
            "page=2&per_page=25&status=running&search=stress&start_date=2024-01-31&sort_by=name&sort_dir=asc"
        );
    }

    #[test]
    fn test_empty_search_skipped() {
        let query = ListQuery::default().with_search("");
        assert_eq!(query.cache_fragment(), "page=1&per_page=10");
    }

    #[test]
    fn test_pagination_has_next() {
        let p = Pagination {
            page: 1,
            per_page: 10,
            total_pages: 3,
            total_items: 25,
        };
        assert!(p.has_next());
    }
}
