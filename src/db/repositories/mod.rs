pub mod engagement;
pub mod movie;
pub mod user;
