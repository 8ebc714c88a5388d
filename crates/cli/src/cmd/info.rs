use cachekey_lib::consts::CACHE_VERSION;
use cachekey_lib::platform::platform_triple;

use crate::output::print_stat;

pub fn cmd_info() {
  println!("System:");
  match platform_triple() {
    Some(triple) => print_stat("Platform", &triple),
    _ => println!("Could not detect platform."),
  }
  print_stat("Cache version", CACHE_VERSION);
}
