/// Router Module Index
///
/// The API is split by access level so the authentication layer is applied per module
/// instead of per handler. All three are nested under `/api` by `create_router`.

/// Routes open to anonymous visitors: the feed, registration, login.
pub mod public;

/// Routes wrapped by the `AuthUser` middleware. Requires a valid session.
pub mod authenticated;

/// Admin-only routes, nested under `/admin`. The role is checked in the handlers.
pub mod admin;
