//! Stock headless field views.
//!
//! They hold their value in memory instead of rendering it, which makes
//! them usable as the model behind a real widget or directly in tests.

mod required;
mod sub_record;
mod value;

pub use required::Required;
pub use sub_record::SubRecordView;
pub use value::{FieldKind, ValueView};
