//! Console variables and command-line parsing for the host.
//!
//! Hosts record every line with [`Console::remember`], handle their own
//! commands and hand everything else to [`Console::exec_builtin`], which knows
//! `set`, `cvarlist`, `help` and bare cvar names (query, or assign when
//! followed by a value). [`Console::exec`] does both steps for callers
//! without commands of their own.

use std::collections::{BTreeMap, VecDeque};

use anyhow::bail;

/// Console variable value.
#[derive(Debug, Clone, PartialEq)]
pub enum CvarValue {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
}

impl CvarValue {
    pub fn as_float(&self) -> Option<f64> {
        match self {
            CvarValue::Float(v) => Some(*v),
            CvarValue::Int(v) => Some(*v as f64),
            CvarValue::String(s) => s.parse().ok(),
            CvarValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            CvarValue::Bool(v) => *v,
            CvarValue::Int(v) => *v != 0,
            CvarValue::Float(v) => *v != 0.0,
            CvarValue::String(s) => !s.is_empty() && s != "0" && !s.eq_ignore_ascii_case("false"),
        }
    }

    /// Parses `text` as a value of the same variant as `self`.
    pub fn parse_like(&self, text: &str) -> anyhow::Result<CvarValue> {
        let text = text.trim().trim_matches('"');
        Ok(match self {
            CvarValue::Int(_) => CvarValue::Int(text.parse()?),
            CvarValue::Float(_) => CvarValue::Float(text.parse()?),
            CvarValue::Bool(_) => match text {
                "1" | "true" | "on" => CvarValue::Bool(true),
                "0" | "false" | "off" => CvarValue::Bool(false),
                _ => bail!("expected a boolean, got '{text}'"),
            },
            CvarValue::String(_) => CvarValue::String(text.to_string()),
        })
    }
}

impl std::fmt::Display for CvarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CvarValue::Int(v) => write!(f, "{}", v),
            CvarValue::Float(v) => write!(f, "{}", v),
            CvarValue::String(v) => write!(f, "\"{}\"", v),
            CvarValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

bitflags::bitflags! {
    /// Cvar flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CvarFlags: u32 {
        const NONE = 0;
        const ARCHIVE = 1 << 0;    // Mirrors a config file field
        const READ_ONLY = 1 << 1;  // Set at startup only
    }
}

impl Default for CvarFlags {
    fn default() -> Self {
        Self::NONE
    }
}

#[derive(Debug, Clone)]
pub struct Cvar {
    pub value: CvarValue,
    pub default: CvarValue,
    pub description: String,
    pub flags: CvarFlags,
}

pub struct Console {
    cvars: BTreeMap<String, Cvar>,
    history: VecDeque<String>,
    max_history: usize,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    pub fn new() -> Self {
        Self {
            cvars: BTreeMap::new(),
            history: VecDeque::new(),
            max_history: 100,
        }
    }

    pub fn register_cvar(&mut self, name: &str, default: CvarValue, description: &str, flags: CvarFlags) {
        self.cvars.insert(
            name.to_string(),
            Cvar {
                value: default.clone(),
                default,
                description: description.to_string(),
                flags,
            },
        );
    }

    pub fn get_cvar(&self, name: &str) -> Option<&CvarValue> {
        self.cvars.get(name).map(|c| &c.value)
    }

    /// Float cvar, or `fallback` when unset or not numeric.
    pub fn float(&self, name: &str, fallback: f64) -> f64 {
        self.get_cvar(name).and_then(CvarValue::as_float).unwrap_or(fallback)
    }

    pub fn flag(&self, name: &str) -> bool {
        self.get_cvar(name).is_some_and(CvarValue::as_bool)
    }

    /// Sets a cvar from text, keeping its type.
    pub fn set(&mut self, name: &str, text: &str) -> anyhow::Result<&CvarValue> {
        let Some(cvar) = self.cvars.get_mut(name) else {
            bail!("unknown cvar: {}", name);
        };
        if cvar.flags.contains(CvarFlags::READ_ONLY) {
            bail!("cvar {} is read-only", name);
        }
        cvar.value = cvar.value.parse_like(text)?;
        Ok(&cvar.value)
    }

    /// Sets a cvar value directly, bypassing the read-only flag.
    pub fn force(&mut self, name: &str, value: CvarValue) -> anyhow::Result<()> {
        match self.cvars.get_mut(name) {
            Some(cvar) => {
                cvar.value = value;
                Ok(())
            }
            None => bail!("unknown cvar: {}", name),
        }
    }

    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    /// Records a line in the history. Blank lines and `//` comments are skipped.
    pub fn remember(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            return;
        }
        self.history.push_back(line.to_string());
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }
    }

    /// Records and executes a built-in command or cvar access, returning output lines.
    pub fn exec(&mut self, line: &str) -> anyhow::Result<Vec<String>> {
        self.remember(line);
        self.exec_builtin(line)
    }

    /// Executes a built-in command without recording it.
    pub fn exec_builtin(&mut self, line: &str) -> anyhow::Result<Vec<String>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            return Ok(Vec::new());
        }

        let tokens = parse_command_line(line);
        let Some((cmd, args)) = tokens.split_first() else {
            return Ok(Vec::new());
        };

        match (cmd.as_str(), args) {
            ("set", [name, rest @ ..]) if !rest.is_empty() => {
                let value = self.set(name, &rest.join(" "))?;
                Ok(vec![format!("{} = {}", name, value)])
            }
            ("set", _) => bail!("usage: set <cvar> <value>"),
            ("cvarlist", _) => Ok(self
                .cvars
                .iter()
                .map(|(name, c)| format!("  {} = {} (default: {}) - {}", name, c.value, c.default, c.description))
                .collect()),
            ("help", _) => Ok(vec![
                "spawn <kind> x y z [scale], move <id> x y z, group <name> <id...>".to_string(),
                "cast x y z dx dy dz".to_string(),
                "load <scene.json>, status, cvarlist, set <cvar> <value>, quit".to_string(),
            ]),
            (name, []) if self.cvars.contains_key(name) => {
                let c = &self.cvars[name];
                Ok(vec![format!("{} = {} (default: {})", name, c.value, c.default)])
            }
            (name, rest) if self.cvars.contains_key(name) => {
                let value = self.set(name, &rest.join(" "))?;
                Ok(vec![format!("{} = {}", name, value)])
            }
            (name, _) => Ok(vec![format!("Unknown command: {}", name)]),
        }
    }
}

/// Splits a command line into tokens, keeping quoted runs together.
pub fn parse_command_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console() -> Console {
        let mut console = Console::new();
        console.register_cvar("rc_max_distance", CvarValue::Float(128.0), "Max distance", CvarFlags::ARCHIVE);
        console.register_cvar("rc_first_only", CvarValue::Bool(false), "First hit only", CvarFlags::NONE);
        console
    }

    #[test]
    fn set_keeps_cvar_type() {
        let mut console = console();
        console.exec("set rc_max_distance 16").unwrap();
        assert_eq!(console.get_cvar("rc_max_distance"), Some(&CvarValue::Float(16.0)));
        assert_eq!(console.float("rc_max_distance", 0.0), 16.0);
    }

    #[test]
    fn bare_cvar_name_queries_or_assigns() {
        let mut console = console();
        let out = console.exec("rc_first_only").unwrap();
        assert_eq!(out, vec!["rc_first_only = false (default: false)"]);
        console.exec("rc_first_only on").unwrap();
        assert!(console.flag("rc_first_only"));
    }

    #[test]
    fn bad_values_are_rejected() {
        let mut console = console();
        assert!(console.exec("set rc_first_only maybe").is_err());
        assert!(console.exec("set nope 1").is_err());
        assert_eq!(console.exec("frobnicate").unwrap(), vec!["Unknown command: frobnicate"]);
    }

    #[test]
    fn read_only_cvars_resist_set() {
        let mut console = console();
        console.register_cvar("rc_tick_hz", CvarValue::Int(20), "Tick rate", CvarFlags::READ_ONLY);
        assert!(console.set("rc_tick_hz", "30").is_err());
        console.force("rc_tick_hz", CvarValue::Int(30)).unwrap();
        assert_eq!(console.get_cvar("rc_tick_hz"), Some(&CvarValue::Int(30)));
    }

    #[test]
    fn history_is_bounded() {
        let mut console = console();
        for i in 0..150 {
            console.exec(&format!("echo {i}")).unwrap();
        }
        assert_eq!(console.history().count(), 100);
        assert_eq!(console.history().next(), Some("echo 50"));
    }

    #[test]
    fn builtin_exec_skips_history() {
        let mut console = console();
        console.exec_builtin("cvarlist").unwrap();
        console.remember("  ");
        console.remember("// note");
        assert_eq!(console.history().count(), 0);
        console.exec("cvarlist").unwrap();
        assert_eq!(console.history().collect::<Vec<_>>(), vec!["cvarlist"]);
    }

    #[test]
    fn help_lists_move() {
        let out = console().exec("help").unwrap().join(" ");
        assert!(out.contains("move <id> x y z"));
    }

    #[test]
    fn parse_quoted_args() {
        let tokens = parse_command_line(r#"load "my scene.json" now"#);
        assert_eq!(tokens, vec!["load", "my scene.json", "now"]);
    }
}
