pub mod api;
pub mod mon;
pub mod operator;
pub mod protocol;
