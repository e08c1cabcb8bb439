//! External collaborators behind narrow seams: the payment gateway,
//! the fire-and-forget task runner, the landing-page cache and the
//! recently-viewed history.

pub mod history;
pub mod landing;
pub mod payment;
pub mod tasks;
