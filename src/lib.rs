// Library for tests to access modules

pub mod arrival_repo;
pub mod chart;
pub mod clock;
pub mod config;
pub mod ingest_worker;
pub mod models;
pub mod relay_client;
pub mod report_worker;
pub mod scheduler;
pub mod series_repo;
pub mod upload;
pub mod zenoh_client;
