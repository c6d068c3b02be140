//! Transfer domain: retry policy for segment uploads

pub mod retry;

pub use retry::RetryPolicy;
