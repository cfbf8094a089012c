//! Fetch client backends

mod reqwest_backend;

pub use reqwest_backend::ReqwestFetch;
