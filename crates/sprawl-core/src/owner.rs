//! Typed acquisition and release records.
//!
//! Every acquire and release of a grid carries an [`Owner`] naming the call
//! site. When a guard word is found corrupted, or a grid is released twice,
//! the owner history of the slot points straight at the offending code.

use std::fmt;

/// The call site that acquired or released a grid.
///
/// Build one with the [`owner!`](crate::owner!) macro, which fills in the
/// module path and line number automatically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Owner {
    /// Module path of the call site.
    pub module: &'static str,
    /// Function name at the call site.
    pub function: &'static str,
    /// Source line of the call site.
    pub line: u32,
}

impl Owner {
    /// Create an owner record.
    pub const fn new(module: &'static str, function: &'static str, line: u32) -> Self {
        Self {
            module,
            function,
            line,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "module {} function {} line {}",
            self.module, self.function, self.line
        )
    }
}

/// Build an [`Owner`] for the current call site.
///
/// ```
/// use sprawl_core::owner;
///
/// let who = owner!("grow_spread");
/// assert_eq!(who.function, "grow_spread");
/// assert!(who.line > 0);
/// ```
#[macro_export]
macro_rules! owner {
    ($function:expr) => {
        $crate::Owner::new(module_path!(), $function, line!())
    };
}
