/// Declaration index module.
///
/// Groups declaration records into name-keyed overload sets, partitioned by
/// kind and, for functions, by arity.
mod declaration_index;
mod overload_set;

pub use declaration_index::{DeclId, DeclarationIndex, Redeclaration};
pub use overload_set::OverloadSet;
