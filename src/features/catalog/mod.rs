//! Listings and services. Both families share one model and one service,
//! parameterized by [`models::ResourceFamily`].
//!
//! ## Endpoints
//!
//! `{resource}` is `listings` or `services`.
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/{resource}` | Filtered page, newest first |
//! | POST | `/api/{resource}` | Create item |
//! | GET | `/api/{resource}/stats` | Counts, average price, breakdowns |
//! | GET | `/api/{resource}/{id}` | Item with provider and category |
//! | PUT | `/api/{resource}/{id}` | Partial update |
//! | DELETE | `/api/{resource}/{id}` | Delete item |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use services::CatalogService;
