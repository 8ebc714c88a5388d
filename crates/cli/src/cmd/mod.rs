mod hash;
mod info;

pub use hash::{HashArgs, cmd_hash};
pub use info::cmd_info;
