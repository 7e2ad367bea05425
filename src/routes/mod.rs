/// Router Module Index
///
/// Splits the HTTP surface by the access level each route needs. Authentication is applied
/// per module with a route layer in `create_router`; role and ownership checks run inside the
/// handlers through the access policy.
///
/// Routers that share a path (e.g. `/courses`) are merged by method, so each module only
/// declares the methods it owns.

/// Anonymous, read-only catalogue routes plus login.
pub mod public;

/// Routes scoped to a student: the student themself or an administrator.
pub mod authenticated;

/// Routes restricted to administrators.
pub mod admin;
