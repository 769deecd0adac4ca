//! LCD controller drivers.

pub mod ht1621;
