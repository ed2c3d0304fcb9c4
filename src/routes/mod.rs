pub mod authentication;
pub mod category;
pub mod question;
pub mod waitlist;
