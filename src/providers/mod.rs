pub mod mfapi_provider;
pub mod util;

pub use mfapi_provider::MfApiProvider;
