//! Use cases: oracle-backed decisions.

pub mod decision;
