pub mod todo;
pub mod user;

pub use todo::{normalize_task, CreateTodoRequest, Todo, UpdateTodoRequest};
pub use user::{Profile, UpdateProfileRequest, User};
