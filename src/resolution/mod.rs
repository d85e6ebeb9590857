/// Reference resolution module.
///
/// Matches reference tokens from documentation comments against the
/// overload sets of a sealed declaration index.
mod resolver;

pub use resolver::{NarrowingStep, Resolution, ResolutionVerdict, Resolver};
