pub mod check;

pub use check::CodeCheckTool;
