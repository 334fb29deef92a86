pub mod context_file;
pub mod settings;

pub use context_file::load_context;
pub use settings::EngineSettings;
