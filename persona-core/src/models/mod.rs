pub mod persona;
pub mod schema;

pub use persona::{PersonaDraft, PersonaRecord};
pub use schema::RowSchema;
