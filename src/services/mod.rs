pub mod ingestion_service;
pub mod job_scheduler_service;
pub mod query_service;
pub mod validation;
