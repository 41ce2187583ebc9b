pub mod query;

pub use query::{CatalogQuery, MovieListParams, PageInfo, Pagination, QueryBuilder, SortOrder};
