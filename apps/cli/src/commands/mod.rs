//! 命令定义和实现

pub mod check;
pub mod idle;
pub mod run;

pub use check::CheckCommand;
pub use idle::IdleCommand;
pub use run::RunCommand;
