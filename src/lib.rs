//! Velocliff - velocity cliff detection for pitchers
//!
//! Given a pitcher's pitches of one type, sorted by release speed, this library
//! estimates the speed at which results start to degrade. Two independent
//! changepoint estimators run on the same series (a one-sided CUSUM and a
//! Metropolis search over a two-segment mean-shift model) and their thresholds
//! are averaged into one reported value.

pub mod analysis;
pub mod changepoint;
pub mod cli;
pub mod csv_output;
pub mod dataset;
pub mod observation;
pub mod observer;
pub mod smoothing;
pub mod summary;
