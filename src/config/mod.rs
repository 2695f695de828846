mod solution_script;

pub use solution_script::{SolutionScript, SolutionScriptError};
