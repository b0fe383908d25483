//! Used by the tests of both the [core](../pcomb_core/index.html) and the
//! [full](../pcomb/index.html) crates.  It provides test suites that can be
//! run against any [`Sweeper`](../pcomb_core/trait.Sweeper.html), and
//! utilities for comparing parse results in owned form so that expectations
//! do not depend on which sweeper produced them.


pub mod suites;
pub use suites::*;

pub mod utils;
