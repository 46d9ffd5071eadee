//! Test harness: isolated, disposable deck storage

mod deck_store;

pub use deck_store::{DeckData, TestDeckStore};
