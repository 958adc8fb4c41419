//! Integration tests for Site-Harvester

mod api_tests;
mod crawl_tests;
