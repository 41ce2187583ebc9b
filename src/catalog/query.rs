//! Translation of catalog listing parameters into a store query.
//!
//! The builder only decides *what* to ask for; executing the query (and
//! counting for pagination) is the catalog repository's job.

use serde::{Deserialize, Serialize};

use crate::models::movie::Movie;

/// Raw query-string parameters accepted by `GET /movies`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieListParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub filter_type: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub page: Option<String>,
    pub load_all: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagField {
    Genre,
    Type,
}

/// Case-insensitive exact match against one of a movie's tag sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    pub field: TagField,
    pub value: String,
}

impl TagFilter {
    #[must_use]
    pub fn matches(&self, movie: &Movie) -> bool {
        match self.field {
            TagField::Genre => movie.has_genre(&self.value),
            TagField::Type => movie.has_type(&self.value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Insertion order.
    #[default]
    Natural,
    /// Newest release first, ties in insertion order.
    ReleaseDateDesc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page number.
    pub page: u64,
    pub page_size: u64,
}

impl Pagination {
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    #[must_use]
    pub const fn page_info(&self, total: u64) -> PageInfo {
        PageInfo {
            current_page: self.page,
            total_pages: total.div_ceil(self.page_size),
            total_movies: total,
        }
    }
}

/// Pagination metadata, present in a listing only when it was paginated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_movies: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogQuery {
    /// Substring matched against title or description, case-insensitively.
    pub search: Option<String>,
    /// All filters must match.
    pub tag_filters: Vec<TagFilter>,
    pub sort: SortOrder,
    pub pagination: Option<Pagination>,
}

impl CatalogQuery {
    #[must_use]
    pub fn matches_tags(&self, movie: &Movie) -> bool {
        self.tag_filters.iter().all(|f| f.matches(movie))
    }

    /// Plain substring match (no wildcards) with Unicode case folding.
    #[must_use]
    pub fn matches_search(&self, movie: &Movie) -> bool {
        let Some(search) = &self.search else {
            return true;
        };
        let needle = search.to_lowercase();
        movie.title.to_lowercase().contains(&needle)
            || movie.description.to_lowercase().contains(&needle)
    }

    /// Whether filtering has to happen outside SQL.
    #[must_use]
    pub fn filters_in_memory(&self) -> bool {
        self.search.is_some() || !self.tag_filters.is_empty()
    }

    #[must_use]
    pub fn matches(&self, movie: &Movie) -> bool {
        self.matches_search(movie) && self.matches_tags(movie)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder {
    page_size: u64,
    paginate_category_filters: bool,
}

impl QueryBuilder {
    #[must_use]
    pub fn new(page_size: u64, paginate_category_filters: bool) -> Self {
        Self {
            page_size: page_size.max(1),
            paginate_category_filters,
        }
    }

    #[must_use]
    pub fn build(&self, params: &MovieListParams) -> CatalogQuery {
        let mut tag_filters = Vec::new();

        let category = non_empty(params.category.as_deref());
        if let Some(category) = category {
            let field = match non_empty(params.filter_type.as_deref()) {
                Some(ft) if ft.eq_ignore_ascii_case("type") => TagField::Type,
                _ => TagField::Genre,
            };
            tag_filters.push(TagFilter {
                field,
                value: category.to_string(),
            });
        }

        if let Some(kind) = non_empty(params.kind.as_deref()) {
            tag_filters.push(TagFilter {
                field: TagField::Type,
                value: kind.to_string(),
            });
        }

        let sort = match non_empty(params.sort.as_deref()) {
            Some("latest" | "releaseDate") => SortOrder::ReleaseDateDesc,
            _ => SortOrder::Natural,
        };

        let load_all = params.load_all.as_deref() == Some("true");
        let paginate = !load_all && (category.is_none() || self.paginate_category_filters);
        let pagination = paginate.then(|| Pagination {
            page: parse_page(params.page.as_deref()),
            page_size: self.page_size,
        });

        CatalogQuery {
            search: non_empty(params.search.as_deref()).map(str::to_string),
            tag_filters,
            sort,
            pagination,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_page(raw: Option<&str>) -> u64 {
    raw.and_then(|p| p.trim().parse::<i64>().ok())
        .filter(|p| *p >= 1)
        .and_then(|p| u64::try_from(p).ok())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> MovieListParams {
        MovieListParams::default()
    }

    fn movie(genre: &[&str], kind: &[&str]) -> Movie {
        Movie {
            id: 1,
            tmdb_id: "1".to_string(),
            title: "Heat".to_string(),
            description: String::new(),
            poster_path: String::new(),
            backdrop_path: String::new(),
            video_url: String::new(),
            genre: genre.iter().map(ToString::to_string).collect(),
            kind: kind.iter().map(ToString::to_string).collect(),
            rating: 4.0,
            release_date: "1995-12-15".to_string(),
            tags: vec![],
        }
    }

    #[test]
    fn test_default_listing_is_paginated_from_page_one() {
        let query = QueryBuilder::new(10, false).build(&params());
        assert_eq!(
            query.pagination,
            Some(Pagination {
                page: 1,
                page_size: 10
            })
        );
        assert!(query.tag_filters.is_empty());
        assert_eq!(query.sort, SortOrder::Natural);
        assert!(query.search.is_none());
    }

    #[test]
    fn test_category_disables_pagination() {
        let mut p = params();
        p.category = Some("Action".to_string());
        p.page = Some("3".to_string());

        let query = QueryBuilder::new(10, false).build(&p);
        assert!(query.pagination.is_none());
        assert_eq!(
            query.tag_filters,
            vec![TagFilter {
                field: TagField::Genre,
                value: "Action".to_string()
            }]
        );

        let query = QueryBuilder::new(10, true).build(&p);
        assert_eq!(query.pagination.map(|pg| pg.page), Some(3));
    }

    #[test]
    fn test_load_all_disables_pagination() {
        let mut p = params();
        p.load_all = Some("true".to_string());
        assert!(QueryBuilder::new(10, false).build(&p).pagination.is_none());

        p.load_all = Some("yes".to_string());
        assert!(QueryBuilder::new(10, false).build(&p).pagination.is_some());
    }

    #[test]
    fn test_filter_type_redirects_category_to_type_set() {
        let mut p = params();
        p.category = Some("series".to_string());
        p.filter_type = Some("type".to_string());

        let query = QueryBuilder::new(10, false).build(&p);
        assert_eq!(query.tag_filters[0].field, TagField::Type);

        p.filter_type = Some("genre".to_string());
        let query = QueryBuilder::new(10, false).build(&p);
        assert_eq!(query.tag_filters[0].field, TagField::Genre);
    }

    #[test]
    fn test_type_param_keeps_pagination() {
        let mut p = params();
        p.kind = Some("trailer".to_string());

        let query = QueryBuilder::new(10, false).build(&p);
        assert!(query.pagination.is_some());
        assert_eq!(query.tag_filters[0].field, TagField::Type);
    }

    #[test]
    fn test_invalid_pages_fall_back_to_first() {
        for raw in ["0", "-4", "abc", "", "2.5"] {
            let mut p = params();
            p.page = Some(raw.to_string());
            let query = QueryBuilder::new(10, false).build(&p);
            assert_eq!(query.pagination.map(|pg| pg.page), Some(1), "page={raw}");
        }
    }

    #[test]
    fn test_sort_aliases() {
        for (raw, expected) in [
            ("latest", SortOrder::ReleaseDateDesc),
            ("releaseDate", SortOrder::ReleaseDateDesc),
            ("rating", SortOrder::Natural),
        ] {
            let mut p = params();
            p.sort = Some(raw.to_string());
            assert_eq!(QueryBuilder::new(10, false).build(&p).sort, expected);
        }
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let mut p = params();
        p.search = Some("   ".to_string());
        assert!(QueryBuilder::new(10, false).build(&p).search.is_none());
    }

    #[test]
    fn test_tag_filters_are_conjunctive() {
        let mut p = params();
        p.category = Some("action".to_string());
        p.kind = Some("movie".to_string());
        let query = QueryBuilder::new(10, false).build(&p);

        assert!(query.matches_tags(&movie(&["Action"], &["Movie"])));
        assert!(!query.matches_tags(&movie(&["Action"], &["series"])));
        assert!(!query.matches_tags(&movie(&["Drama"], &["movie"])));
    }

    #[test]
    fn test_search_is_literal_and_unicode_case_insensitive() {
        let mut p = params();
        let mut amelie = movie(&["Comedy"], &["movie"]);
        amelie.title = "Amélie".to_string();
        let heat = movie(&["Crime"], &["movie"]);

        p.search = Some("AMÉLIE".to_string());
        let query = QueryBuilder::new(10, false).build(&p);
        assert!(query.matches(&amelie));
        assert!(!query.matches(&heat));

        for wildcard in ["H_at", "%", "\\"] {
            p.search = Some(wildcard.to_string());
            let query = QueryBuilder::new(10, false).build(&p);
            assert!(!query.matches(&heat), "search={wildcard}");
            assert!(!query.matches(&amelie), "search={wildcard}");
        }
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let mut p = params();
        p.page = Some(i64::MAX.to_string());
        let pagination = QueryBuilder::new(10, false).build(&p).pagination.unwrap();
        assert_eq!(pagination.page, u64::try_from(i64::MAX).unwrap());
        assert_eq!(pagination.offset(), u64::MAX);
        assert_eq!(pagination.page_info(3).total_pages, 1);
    }

    #[test]
    fn test_page_info_rounds_up() {
        let pagination = Pagination {
            page: 2,
            page_size: 10,
        };
        assert_eq!(pagination.offset(), 10);
        let info = pagination.page_info(21);
        assert_eq!(info.total_pages, 3);
        assert_eq!(info.total_movies, 21);
        assert_eq!(pagination.page_info(0).total_pages, 0);
    }
}
