//! Background Jobs Module
//!
//! Jobs here run on the job scheduler, independently of HTTP requests. They
//! are idempotent and log failures instead of propagating them per item.

pub mod ingestion_job;
