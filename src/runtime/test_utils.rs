//! Test utilities for runtime testing
//!
//! [`ExecutorTest`](test::ExecutorTest) wraps a list of instructions in a
//! one-function module exported as `test`, then validates, instantiates and
//! invokes it, so a test reads as the instruction sequence and its outcome.
