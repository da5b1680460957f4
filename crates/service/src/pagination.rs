//! Pagination utilities for service layer
//!
//! `Pagination` normalises raw inputs; `Paginated` is the list envelope
//! `{ data, pagination: { page, limit, total, totalPages } }`.

use sea_orm::{DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, Select};
use serde::Serialize;

/// Pagination parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pagination {
    /// 1-based page index
    pub page: u64,
    /// items per page
    pub limit: u64,
}

impl Pagination {
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        let d = Self::default();
        Self { page: page.unwrap_or(d.page), limit: limit.unwrap_or(d.limit) }.clamped()
    }

    /// Page at least 1, limit within 1..=100.
    pub fn clamped(self) -> Self {
        Self { page: self.page.max(1), limit: self.limit.clamp(1, 100) }
    }

    /// Zero-based page index and page size.
    pub fn normalize(self) -> (u64, u64) {
        let c = self.clamped();
        (c.page - 1, c.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, limit: 20 } }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl PageMeta {
    pub fn new(p: Pagination, total: u64) -> Self {
        let p = p.clamped();
        Self { page: p.page, limit: p.limit, total, total_pages: total.div_ceil(p.limit) }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> Paginated<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated { data: self.data.into_iter().map(f).collect(), pagination: self.pagination }
    }
}

/// Count and fetch one page of an already filtered and ordered select.
pub async fn fetch_page<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    p: Pagination,
) -> Result<Paginated<E::Model>, DbErr>
where
    E: EntityTrait,
    E::Model: Sync + 'static,
{
    let (page_idx, per_page) = p.normalize();
    let paginator = select.paginate(db, per_page);
    let total = paginator.num_items().await?;
    let data = paginator.fetch_page(page_idx).await?;
    Ok(Paginated { data, pagination: PageMeta::new(p, total) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_clamps_zero_to_defaults() {
        let (idx, per) = Pagination { page: 0, limit: 0 }.normalize();
        assert_eq!(idx, 0);
        assert_eq!(per, 1);
    }

    #[test]
    fn normalize_clamps_upper_bound() {
        let (idx, per) = Pagination { page: 5, limit: 1000 }.normalize();
        assert_eq!(idx, 4);
        assert_eq!(per, 100);
    }

    #[test]
    fn default_values_are_sane() {
        let d = Pagination::new(None, None);
        assert_eq!(d.page, 1);
        assert_eq!(d.limit, 20);
    }

    #[test]
    fn total_pages_is_ceiling() {
        let p = Pagination::new(Some(1), Some(3));
        assert_eq!(PageMeta::new(p, 7).total_pages, 3);
        assert_eq!(PageMeta::new(p, 6).total_pages, 2);
        assert_eq!(PageMeta::new(p, 0).total_pages, 0);
    }

    #[test]
    fn meta_serializes_camel_case() {
        let v = serde_json::to_value(PageMeta::new(Pagination::default(), 41)).unwrap();
        assert_eq!(v["totalPages"], 3);
        assert_eq!(v["limit"], 20);
    }
}
