//! Authentication use cases
//!
//! Each use case turns raw caller input into domain values and delegates to
//! the [`AuthService`](crate::domain::auth::AuthService).

mod list_users;
mod logout_user;
mod sign_in_user;
mod sign_up_user;
mod update_user;

pub use list_users::ListUsersUseCase;
pub use logout_user::LogoutUserUseCase;
pub use sign_in_user::{SignInUserCommand, SignInUserUseCase};
pub use sign_up_user::{SignUpUserCommand, SignUpUserUseCase};
pub use update_user::{UpdateUserCommand, UpdateUserUseCase};
