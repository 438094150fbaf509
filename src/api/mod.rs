//! Gateway to the AI news backend.
//!
//! [`ApiClient`] owns the HTTP connection pool and exposes the backend's
//! resources as typed operation groups:
//!
//! - [`Articles`]: listing, today's picks, detail, filter options
//! - [`Users`]: register, login, profile read and update
//! - [`Admin`]: crawl, process, stats
//!
//! Failures are normalized into [`ApiError`].

mod admin;
mod articles;
mod client;
mod error;
mod models;
mod users;

pub use admin::Admin;
pub use articles::Articles;
pub use client::ApiClient;
pub use error::ApiError;
pub use models::{
    AdminStats, Article, ArticleCategory, ArticleListResponse, ArticleQuery, ArticleSource,
    CrawlAck, CrawlStats, EmailFrequency, FilterOption, ProcessAck, QualityTier, TodayQuery,
    TokenResponse, User, UserUpdate,
};
pub use users::Users;
