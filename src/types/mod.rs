pub mod account;
pub mod category;
pub mod feed_query;
pub mod notice;
pub mod pagination;
pub mod question;
pub mod tags;
