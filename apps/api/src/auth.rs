mod callback;
mod forbidden_page;
mod login;
mod logout;

pub use callback::signin_callback_handler;
pub use login::login_handler;
pub use logout::signout_handler;

pub const SESSION_USER_KEY: &str = "user_identity";
pub(crate) const SESSION_OAUTH_STATE_KEY: &str = "oauth_state";
pub(crate) const SESSION_CSRF_TOKEN_KEY: &str = "csrf_token";

#[cfg(test)]
mod tests;
