/// Router Module Index
///
/// Routes are grouped by resource. None of the groups carries its own auth
/// layer: the identity resolver runs router-wide and every mutating blog
/// operation checks the acting user in the service layer.

/// GET/POST /blogs, GET/PUT/DELETE /blogs/{id}, GET /blogs/stats.
pub mod blogs;

/// POST/GET /users and POST /login.
pub mod users;
