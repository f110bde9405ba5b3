//! Branch Check
//!
//! GitHub App webhook service that enforces a release-branch policy. For every
//! opened or reopened pull request it records one completed check run on the
//! head commit:
//!
//! - `success` when a `release/*` branch targets `main`
//! - `failure` for everything else
//!
//! ## Layout
//!
//! - [`event`]: decodes webhook deliveries and normalizes them into a
//!   [`CheckRequest`]
//! - [`engine`]: idempotency lookup, policy evaluation and the single write
//! - [`store`]: the check-run store port; [`github`] implements it over the
//!   GitHub REST API, [`fakes`] in memory
//! - [`auth`]: GitHub App JWT and installation tokens
//! - [`server`]: axum router and signature verification
//! - [`config`]: command line / environment configuration
//!
//! ## Usage
//!
//! ```bash
//! branch-check ./app.pem $GITHUB_APP_ID $GITHUB_INSTALLATION_ID \
//!   --webhook-secret $GITHUB_WEBHOOK_SECRET
//! ```

pub mod auth;
pub mod check;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod fakes;
pub mod github;
pub mod server;
pub mod store;

pub use check::{CheckOutcome, CheckRequest, ExistingCheckSummary, NewCheckRun};
pub use config::Config;
pub use engine::{CheckDecisionEngine, Evaluation};
pub use error::{CheckError, GitHubApiError};
pub use event::WebhookEvent;
pub use store::CheckRunStore;
