pub mod clustering;
pub mod handlers;
pub mod keywords;
pub mod summarizer;
pub mod textrank;
pub mod tokenizer;
pub mod vectorizer;
