//! Category lifecycle: create, translate, nest, deactivate, restore and
//! hard delete.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/categories` | Flat list or tree (`includeChildren`) |
//! | GET | `/api/categories/paginated` | Page of categories with pagination |
//! | GET | `/api/categories/stats` | Total / active / inactive counts |
//! | GET | `/api/categories/slug/{slug}` | Active category by slug |
//! | GET | `/api/categories/{id}` | Category by ID |
//! | POST | `/api/categories` | Create category |
//! | PUT | `/api/categories/{id}` | Partial update |
//! | POST | `/api/categories/{id}/deactivate` | Soft delete |
//! | POST | `/api/categories/{id}/restore` | Undo soft delete |
//! | DELETE | `/api/categories/{id}` | Hard delete |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use services::CategoryService;
