mod import_movies;
mod promote;

pub use import_movies::cmd_import_movies;
pub use promote::cmd_promote;
