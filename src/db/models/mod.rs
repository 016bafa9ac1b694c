mod certificate;
mod course;
mod notification;
mod resource;
mod sync;
mod user;

pub use certificate::*;
pub use course::*;
pub use notification::*;
pub use resource::*;
pub use sync::*;
pub use user::*;
