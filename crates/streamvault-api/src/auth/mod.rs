//! Authentication: bearer-token verification and the request identity model.

pub mod middleware;
pub mod models;
pub mod token_verifier;

pub use middleware::{auth_middleware, AuthLayerState};
pub use models::{AuthUser, IdClaims, UserRole};
pub use token_verifier::TokenVerifier;
