// src/gesture/mod.rs
//! Gesture templates, persistence, classification, and capture

pub mod capture;
pub mod classifier;
pub mod store;
pub mod template;

pub use capture::{CaptureError, CaptureRequest, CaptureSettings, TemplateCapture};
pub use classifier::{Classifier, MatchingSettings};
pub use store::{StoreError, TemplateStore};
pub use template::{mask, GestureTemplate, TemplateError};
