use crate::commands::CommandExecutor;
use crate::errors::{RouteError, RouteResult};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One name-mapping rule, loaded from the mapping file.
///
/// `template` may reference capture groups of `pattern` as `{0}`, `{1}`, ...
/// A rule carrying `shellCommand` resolves by running the command and using
/// its trimmed output as the device name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameMapping {
    pub pattern: String,

    #[serde(alias = "name")]
    pub template: String,

    #[serde(
        rename = "shellCommand",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub shell_command: Option<String>,
}

struct CompiledRule {
    pattern: Regex,
    template: String,
    shell_command: Option<String>,
}

/// Ordered table translating logical uplink names into OS device names.
///
/// The first rule whose pattern matches wins; a logical name matching no
/// rule maps to itself.
pub struct MappingTable {
    rules: Vec<CompiledRule>,
    cmd_regex: Regex,
}

impl MappingTable {
    pub fn new(mappings: Vec<NameMapping>) -> RouteResult<Self> {
        let mut rules = Vec::with_capacity(mappings.len());
        for mapping in mappings {
            let pattern = Regex::new(&mapping.pattern)
                .map_err(|e| RouteError::InvalidMapping(format!("{}: {}", mapping.pattern, e)))?;
            rules.push(CompiledRule {
                pattern,
                template: mapping.template,
                shell_command: mapping.shell_command,
            });
        }
        Ok(MappingTable {
            rules,
            cmd_regex: Regex::new(r"^\$\((.+)\)$").expect("static regex"),
        })
    }

    pub fn empty() -> Self {
        Self::new(Vec::new()).expect("empty table")
    }

    /// Resolve a logical name to the OS device name.
    ///
    /// `Ok(None)` means the uplink is currently unresolvable (e.g. the
    /// substitution command printed nothing because the modem is not
    /// enumerated yet); that is not an error.
    pub fn resolve(
        &self,
        logical: &str,
        executor: &dyn CommandExecutor,
    ) -> RouteResult<Option<String>> {
        for rule in &self.rules {
            let caps = match rule.pattern.captures(logical) {
                Some(caps) => caps,
                None => continue,
            };

            let expanded = expand(&rule.template, &caps);

            let command = match &rule.shell_command {
                Some(cmd) => Some(expand(cmd, &caps)),
                // the template itself may carry a $(...) marker
                None => self
                    .cmd_regex
                    .captures(&expanded)
                    .map(|c| c[1].to_string()),
            };

            let device = match command {
                Some(cmd) => executor
                    .substitute(&cmd)
                    .map_err(|e| {
                        debug!("Substitution for {} failed: {}", logical, e);
                        RouteError::UnresolvableName(logical.to_string())
                    })?,
                None => expanded,
            };

            if device.is_empty() {
                debug!("Logical name {} is currently unresolvable", logical);
                return Ok(None);
            }
            return Ok(Some(device));
        }

        // no rule matched: the logical name is the device name
        Ok(Some(logical.to_string()))
    }
}

/// Substitute `{0}`, `{1}`, ... markers with regex capture groups
fn expand(template: &str, caps: &regex::Captures) -> String {
    let mut out = template.to_string();
    for i in 1..caps.len() {
        let marker = format!("{{{}}}", i - 1);
        out = out.replace(&marker, caps.get(i).map_or("", |m| m.as_str()));
    }
    out
}
