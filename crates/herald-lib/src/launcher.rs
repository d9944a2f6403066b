//! "Open application" launcher — maps spoken app names to platform commands
//! and starts them detached.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use herald_core::types::Platform;

use crate::error::LaunchError;
use crate::process::{CommandSpec, ProcessRunner};

/// Built-in apps: (spoken name, linux, macos, windows).
const KNOWN_APPS: &[(&str, &str, &str, &str)] = &[
    ("calculator", "gnome-calculator", "open -a Calculator", "calc"),
    ("terminal", "x-terminal-emulator", "open -a Terminal", "cmd /C start cmd"),
    ("browser", "xdg-open https://www.google.com", "open https://www.google.com", "cmd /C start \"\" https://www.google.com"),
    ("editor", "gedit", "open -a TextEdit", "notepad"),
    ("files", "xdg-open .", "open -a Finder", "explorer"),
    ("music", "rhythmbox", "open -a Music", "cmd /C start \"\" spotify:"),
];

pub struct Launcher {
    runner: Arc<dyn ProcessRunner>,
    platform: Platform,
    /// User-configured aliases, checked before the built-in table.
    aliases: BTreeMap<String, String>,
}

impl Launcher {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        platform: Platform,
        aliases: BTreeMap<String, String>,
    ) -> Self {
        let aliases = aliases
            .into_iter()
            .map(|(name, program)| (normalize_app_name(&name), program))
            .collect();
        Self {
            runner,
            platform,
            aliases,
        }
    }

    /// Launch an app by its spoken name. Returns the text to speak back.
    pub async fn open_app(&self, name: &str) -> Result<String, LaunchError> {
        let name = normalize_app_name(name);
        if name.is_empty() {
            return Err(LaunchError::EmptyName);
        }
        let spec = self.resolve(&name)?;
        info!("launcher: opening {name} via {}", spec.program);
        self.runner.spawn_detached(&spec).await?;
        Ok(format!("Opening {name}"))
    }

    /// Open a URL in the default handler.
    pub async fn open_url(&self, url: &str) -> Result<(), LaunchError> {
        let spec = match &self.platform {
            Platform::Linux => CommandSpec::new("xdg-open").arg(url),
            Platform::MacOs => CommandSpec::new("open").arg(url),
            Platform::Windows => CommandSpec::new("cmd").args(["/C", "start", "", url]),
            Platform::Other(os) => return Err(LaunchError::UnsupportedPlatform(os.clone())),
        };
        info!("launcher: opening {url}");
        self.runner.spawn_detached(&spec).await?;
        Ok(())
    }

    fn resolve(&self, name: &str) -> Result<CommandSpec, LaunchError> {
        if let Some(command) = self.aliases.get(name) {
            return split_command(command).ok_or_else(|| LaunchError::UnknownApp(name.to_string()));
        }

        let (_, linux, macos, windows) = KNOWN_APPS
            .iter()
            .find(|(known, ..)| *known == name)
            .ok_or_else(|| LaunchError::UnknownApp(name.to_string()))?;

        let command = match &self.platform {
            Platform::Linux => linux,
            Platform::MacOs => macos,
            Platform::Windows => windows,
            Platform::Other(os) => return Err(LaunchError::UnsupportedPlatform(os.clone())),
        };
        split_command(command).ok_or_else(|| LaunchError::UnknownApp(name.to_string()))
    }
}

/// Lowercase, trim, and drop filler like "the" and a trailing "app".
pub fn normalize_app_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    let mut words: Vec<&str> = lower.split_whitespace().collect();
    if words.first() == Some(&"the") {
        words.remove(0);
    }
    if words.len() > 1 && matches!(words.last(), Some(&"app") | Some(&"application")) {
        words.pop();
    }
    words.join(" ")
}

/// Whitespace-split a command line; `""` stands for an empty argument.
fn split_command(command: &str) -> Option<CommandSpec> {
    let mut parts = command.split_whitespace();
    let program = parts.next()?;
    let args = parts.map(|p| if p == "\"\"" { "" } else { p });
    Some(CommandSpec::new(program).args(args))
}
