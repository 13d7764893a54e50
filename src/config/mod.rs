pub mod pages;
pub mod prompt;
