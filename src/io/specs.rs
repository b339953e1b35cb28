/// The type of callback functions to call when warnings are raised while parsing a model.
///
/// The arguments are the (1-based) line number and the warning message.
pub type WarningHandler = Box<dyn Fn(usize, String)>;
