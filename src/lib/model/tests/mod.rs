//! Tests for decoding operation calls.

mod qs;
