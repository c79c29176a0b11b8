pub mod pipelines;
pub mod upload_client;
