use std::fmt;
use std::str::FromStr;

/// Operating system a node can be built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Os {
  Linux,
  MacOs,
  Windows,
  Ios,
  TvOs,
  WatchOs,
  VisionOs,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::MacOs),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  /// Returns the lowercase string identifier for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "darwin",
      Self::Windows => "windows",
      Self::Ios => "ios",
      Self::TvOs => "tvos",
      Self::WatchOs => "watchos",
      Self::VisionOs => "visionos",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Os {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "linux" => Ok(Self::Linux),
      "darwin" | "macos" => Ok(Self::MacOs),
      "windows" => Ok(Self::Windows),
      "ios" => Ok(Self::Ios),
      "tvos" => Ok(Self::TvOs),
      "watchos" => Ok(Self::WatchOs),
      "visionos" => Ok(Self::VisionOs),
      other => Err(format!("unknown operating system: {}", other)),
    }
  }
}
