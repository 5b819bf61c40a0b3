//! Event handlers registered with the pipeline

mod on_user_signup;

pub use on_user_signup::{OnUserSignupHandler, WELCOME_BODY, WELCOME_SUBJECT};
