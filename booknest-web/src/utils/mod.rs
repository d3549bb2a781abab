pub mod cookies;
pub mod pkce;
pub mod validation;

pub use validation::ValidatedJson;
