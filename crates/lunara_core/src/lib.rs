//! # Lunara Core
//!
//! Data model and cycle prediction for Lunara.
//!
//! This crate provides:
//! - The daily-record and practice-entry model types
//! - The pure cycle predictor (period / fertile / ovulation projection)
//!
//! ## Design Principles
//!
//! - No I/O and no mutable module state - everything here is a pure
//!   function over caller-owned data
//! - Calendar dates only (`chrono::NaiveDate`), no time-of-day component,
//!   so day arithmetic never drifts across DST boundaries
//! - Practice content is a tagged sum type, one payload shape per practice
//!   kind, checked at compile time
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use lunara_core::{predict, CycleFlow, DailyRecord, Mood};
//! use std::collections::BTreeMap;
//!
//! let mut daily = BTreeMap::new();
//! for day in 1..=5 {
//!     let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
//!     daily.insert(date, DailyRecord::new(Mood::Okay).with_cycle(CycleFlow::Medium));
//! }
//!
//! let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
//! let horizon = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
//! let predictions = predict(&daily, today, horizon);
//! assert!(!predictions.period.is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod predictor;
mod types;

pub use predictor::{predict, predict_from_today, CyclePredictions};
pub use types::{CycleFlow, DailyRecord, Mood, PracticeContent, PracticeEntry, PracticeType};
