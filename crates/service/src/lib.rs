//! Service layer providing business-oriented operations on top of models.
//! - Record services: list / get / create / update / delete per entity.
//! - Lead conversion, dashboard aggregation and email dispatch.
//! - Errors are reported as [`errors::ServiceError`]; the HTTP layer maps them to status codes.

pub mod errors;
pub mod pagination;
pub mod related;
pub mod customer_service;
pub mod lead_service;
pub mod opportunity_service;
pub mod activity_service;
pub mod conversion;
pub mod dashboard;
pub mod email;
#[cfg(test)]
pub mod test_support;
