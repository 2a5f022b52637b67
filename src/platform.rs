#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    MacOS,
}

impl Platform {
    /// Get the current platform
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOS
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    /// Get platform identifier as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::MacOS => "macos",
            Platform::Windows => "windows",
            Platform::Linux => "linux",
        }
    }

    /// Shell program and the arguments preceding the command line
    pub fn shell(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            // login shell so the user's PATH (Homebrew, rbenv) is visible
            Platform::MacOS => ("/bin/zsh", &["-l", "-c"]),
            Platform::Linux => ("/bin/sh", &["-c"]),
            Platform::Windows => ("cmd", &["/C"]),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
