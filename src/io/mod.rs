//! Objects used to read models and instances, and to write models and explanations.

mod explanation_writer;
pub use explanation_writer::ExplanationWriter;

mod instance_reader;
pub use instance_reader::InstanceReader;

mod model_reader;
pub use model_reader::ModelReader;

mod model_writer;
pub use model_writer::ModelWriter;

mod specs;
pub use specs::WarningHandler;

mod warning_result;
