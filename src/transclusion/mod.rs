//! Expansion of inclusion directives into fully resolved document text.
//!
//! Two directive forms are recognized, each on a line of its own and outside
//! fenced code:
//!
//! ```text
//! @include shared/style.md
//! ![[shared/style#Naming]]
//! ```
//!
//! References are corpus-root relative. A `#Heading` fragment narrows the
//! inclusion to one section of the target.

pub mod directive;
pub mod error;
pub mod resolver;

pub use directive::{directive_reference, segments, Reference, Segment};
pub use error::{ResolutionFailure, ResolveError};
pub use resolver::{ResolutionPass, ResolvedDocument};
