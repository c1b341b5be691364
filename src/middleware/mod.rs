pub mod auth;
pub mod binder;
pub mod params;
pub mod response;

pub use auth::{AuthError, AuthVerifier, JwtVerifier};
pub use binder::{bind, RequestContext, RouteOptions};
pub use params::{Body, IdBody, IdParams, LangParams, ListParams, NoParams, OperationParams, PublicIdParams, RawRequest};
pub use response::{ApiResponse, Reply};
