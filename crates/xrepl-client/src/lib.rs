//! xrepl-client — platform REST API client.
//!
//! Implements [`xrepl_editor::ReplicationApi`] and
//! [`xrepl_task::StatusSource`] over plain HTTP/1.1 using hyper. One TCP
//! connection per request; every request is bounded by the configured
//! timeout.
//!
//! # Routes
//!
//! | Method | Path | Use |
//! |---|---|---|
//! | GET | `/api/v1/customers/:c/universes/:cluster/tables` | Source catalog |
//! | GET | `/api/v1/customers/:c/xcluster_configs/:group` | Group snapshot |
//! | PUT | `/api/v1/customers/:c/xcluster_configs/:group` | Replace member tables |
//! | GET | `/api/v1/customers/:c/tasks/:task` | Task progress |

pub mod client;
pub mod wire;

pub use client::HttpClient;
