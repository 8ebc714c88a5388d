mod common;
mod content_hashes_tests;
