//! Per-page fetch, loading and error state.
//!
//! Every page owns a [`ViewController`] that turns one request at a time into
//! a [`ViewState`]. Pages hold no shared state of their own; filters and the
//! session live in the [`SessionStore`](crate::session::SessionStore).

mod articles;
mod auth;
mod controller;
mod detail;
mod messages;
mod pagination;
mod settings;
mod today;

pub use articles::{ArticlesPage, PageError};
pub use auth::{sign_in, sign_up, AuthError, AuthForm, AuthFormError, MIN_PASSWORD_LEN};
pub use controller::{Payload, Ticket, ViewController, ViewState};
pub use detail::ArticleDetailPage;
pub use messages::message_for;
pub use pagination::Pagination;
pub use settings::{PreferenceForm, SettingsError, SettingsPage};
pub use today::{TodayPage, TodaySummary};
