//! Lead sources.
//!
//! Each source turns public posts into [`Lead`](crate::models::Lead)s and
//! reports the sources it could not reach instead of hiding them.
//!
//! | Source | Module | Method |
//! |--------|--------|--------|
//! | Reddit | [`reddit`] | `hot.json` listing per subreddit |

pub mod reddit;
