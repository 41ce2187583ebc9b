pub mod prelude;

pub mod comments;
pub mod movies;
pub mod reviews;
pub mod users;
