pub mod error;
pub mod kmeans;
pub mod mds;
pub mod retry;

pub mod text;
