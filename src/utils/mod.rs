// src/utils/mod.rs
//! Utility helpers

pub mod angles;
