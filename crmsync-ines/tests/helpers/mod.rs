//! Shared test helpers for crmsync-ines integration tests

#![allow(dead_code)]

pub mod db_utils;
pub mod mock_api;
