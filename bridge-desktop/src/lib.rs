//! Desktop adapters for the host bridges: [`ReqwestHttpClient`] for
//! `HttpClient` and [`TokioFileSystem`] for `FileSystemAccess`.
//!
//! `core-runtime` injects both when built with `desktop-shims` and the host
//! supplies nothing of its own.

mod filesystem;
mod http;

pub use filesystem::TokioFileSystem;
pub use http::ReqwestHttpClient;
