mod local;

pub use local::{load_filters, save_filters, FilterCache};
