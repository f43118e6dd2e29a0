pub mod faq;
pub mod game;
pub mod rating;
pub mod session;
