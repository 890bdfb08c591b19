//! UNIMARC record encoding
//!
//! This module turns structured record fields into the tag-keyed document
//! persisted as record metadata, and reads display information back from it.

pub mod basic_info;
pub mod encoder;

pub use basic_info::{extract_basic_info, BasicInfo};
pub use encoder::{encode, code_for_index, EncodeOutcome, FieldValue, UnimarcDocument};
