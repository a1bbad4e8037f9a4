pub mod bookmark;
pub mod career;
pub mod password_reset_token;
pub mod quiz_question;
pub mod user;

pub use bookmark::Bookmark;
pub use career::Career;
pub use password_reset_token::PasswordResetToken;
pub use quiz_question::{PublicQuizQuestion, QuizQuestion};
pub use user::{NewUser, Role, User};
