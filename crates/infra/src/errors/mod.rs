//! Conversions from external infrastructure errors into domain errors.

mod conversions;

pub(crate) use conversions::IntoSpError;
