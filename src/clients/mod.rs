pub mod google;
pub mod stripe;
