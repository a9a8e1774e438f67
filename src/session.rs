use uuid::Uuid;

pub const COOKIE_NAME: &str = "session";

/// Creates a session cookie that lasts until the browser is closed.
pub fn create_cookie(session_id: Uuid, secure: bool) -> cookie::Cookie<'static> {
	cookie::Cookie::build((COOKIE_NAME, session_id.to_string()))
		.secure(secure)
		.http_only(true)
		.same_site(cookie::SameSite::Lax)
		.path("/")
		.into()
}

/// Creates an empty session cookie used to invalidate a previous one.
pub fn clear_cookie(secure: bool) -> cookie::Cookie<'static> {
	cookie::Cookie::build(COOKIE_NAME)
		.secure(secure)
		.http_only(true)
		.same_site(cookie::SameSite::Lax)
		.path("/")
		.max_age(cookie::time::Duration::ZERO)
		.into()
}
