use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{info, warn};

use crate::constants::{IFUPDOWN_FILE, NETPLAN_DIR};
use crate::engine::Apply;
use crate::error::{MtuError, MtuResult};

/// Consumer of `Apply` intents.
pub trait PersistenceGateway {
    /// Set the MTU on the live interface. Immediate, lost on reboot.
    fn apply_live(&mut self, apply: &Apply) -> MtuResult<()>;

    /// Write the MTU into durable network configuration.
    fn persist(&mut self, apply: &Apply) -> MtuResult<()>;
}

impl<G> PersistenceGateway for Box<G> where G: PersistenceGateway + ?Sized {
    fn apply_live(&mut self, apply: &Apply) -> MtuResult<()> {
        (**self).apply_live(apply)
    }

    fn persist(&mut self, apply: &Apply) -> MtuResult<()> {
        (**self).persist(apply)
    }
}

fn cmd(program: &str, args: &[&str]) -> Result<(), String> {
    let status = Command::new(program)
        .args(args)
        .status()
        .map_err(|e| format!("failed to execute {program}: {e}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("{program} {} exited with {status}", args.join(" ")))
    }
}

fn leading_ws(line: &str) -> &str {
    &line[.. line.len() - line.trim_start().len()]
}

fn join_lines(lines: Vec<String>, original: &str) -> String {
    let mut result = lines.join("\n");
    if original.ends_with('\n') {
        result.push('\n');
    }
    result
}

// `eth0:`, `"eth0":` or `'eth0':`, optionally followed by a comment
fn is_netplan_key(line: &str, interface: &str) -> bool {
    let line = line.trim_start();
    let rest = ["\"", "'"].iter()
        .find_map(|quote| {
            line.strip_prefix(*quote)?
                .strip_prefix(interface)?
                .strip_prefix(*quote)
        })
        .or_else(|| line.strip_prefix(interface));
    rest.and_then(|rest| rest.strip_prefix(':'))
        .is_some_and(|rest| rest.trim().is_empty() || rest.trim_start().starts_with('#'))
}

/// Set `mtu: <mtu>` under the `<interface>:` key of a netplan document.
/// An existing `mtu:` child is replaced. Returns None if the key is absent.
pub fn netplan_set_mtu(text: &str, interface: &str, mtu: u32) -> Option<String> {
    let mut lines: Vec<String> = text.lines().map(|x| x.to_string()).collect();

    let key_idx = lines.iter().position(|line| is_netplan_key(line, interface))?;
    let key_indent = leading_ws(&lines[key_idx]).len();

    let mut child_indent: Option<String> = None;
    for idx in key_idx + 1 .. lines.len() {
        let line = &lines[idx];
        if line.trim().is_empty() {
            continue;
        }
        let indent = leading_ws(line).to_string();
        if indent.len() <= key_indent {
            break;
        }
        let expected = child_indent.get_or_insert(indent.clone());
        if indent == *expected && line.trim_start().starts_with("mtu:") {
            lines[idx] = format!("{indent}mtu: {mtu}");
            return Some(join_lines(lines, text));
        }
    }

    let indent = child_indent.unwrap_or_else(|| " ".repeat(key_indent + 2));
    lines.insert(key_idx + 1, format!("{indent}mtu: {mtu}"));
    Some(join_lines(lines, text))
}

const IFUPDOWN_STANZAS: &[&str] = &["iface", "auto", "mapping", "source", "source-directory"];

fn is_ifupdown_stanza(line: &str) -> bool {
    line.split_whitespace().next()
        .is_some_and(|word| IFUPDOWN_STANZAS.contains(&word) || word.starts_with("allow-"))
}

/// Set `mtu <mtu>` in every `iface <interface> inet*` stanza of an
/// /etc/network/interfaces document. Returns None if no stanza matches.
pub fn ifupdown_set_mtu(text: &str, interface: &str, mtu: u32) -> Option<String> {
    let mut result: Vec<String> = Vec::new();
    let mut matched = false;
    let mut in_stanza = false;

    for line in text.lines() {
        if is_ifupdown_stanza(line) {
            in_stanza = false;
            let words: Vec<&str> = line.split_whitespace().collect();
            if words.len() >= 3 && words[0] == "iface" && words[1] == interface
                && words[2].starts_with("inet") {
                matched = true;
                result.push(line.to_string());
                result.push(format!("    mtu {mtu}"));
                in_stanza = true;
                continue;
            }
        } else if in_stanza && line.split_whitespace().next() == Some("mtu") {
            // drop the old value, the new one already follows the stanza header
            continue;
        }
        result.push(line.to_string());
    }

    if matched {
        Some(join_lines(result, text))
    } else {
        None
    }
}

/// Applies MTUs with ip(8) and persists them into netplan or ifupdown configuration.
pub struct SystemGateway {
    pub netplan_dir: PathBuf,
    pub ifupdown_file: PathBuf,
    /// Run `netplan apply` / `ifdown && ifup` after rewriting
    pub reload_networking: bool,
}

impl Default for SystemGateway {
    fn default() -> Self {
        Self {
            netplan_dir: PathBuf::from(NETPLAN_DIR),
            ifupdown_file: PathBuf::from(IFUPDOWN_FILE),
            reload_networking: true,
        }
    }
}

impl SystemGateway {
    fn netplan_file(&self) -> Option<PathBuf> {
        let entries = fs::read_dir(&self.netplan_dir).ok()?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "yaml"))
            .collect();
        files.sort();
        files.into_iter().next()
    }

    fn rewrite(path: &Path, apply: &Apply,
               f: fn(&str, &str, u32) -> Option<String>) -> Result<(), String> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        let new_text = f(&text, &apply.interface, apply.mtu)
            .ok_or_else(|| format!("{} not found in {}", apply.interface, path.display()))?;
        fs::write(path, new_text)
            .map_err(|e| format!("failed to write {}: {e}", path.display()))
    }

    fn persist_inner(&self, apply: &Apply) -> Result<(), String> {
        if let Some(path) = self.netplan_file() {
            info!("Updating {} with MTU {} for {}", path.display(), apply.mtu, apply.interface);
            Self::rewrite(&path, apply, netplan_set_mtu)?;
            if self.reload_networking {
                cmd("netplan", &["apply"])?;
            }
            return Ok(());
        }

        if self.ifupdown_file.exists() {
            info!("Updating {} with MTU {} for {}", self.ifupdown_file.display(), apply.mtu, apply.interface);
            Self::rewrite(&self.ifupdown_file, apply, ifupdown_set_mtu)?;
            if self.reload_networking {
                cmd("ifdown", &[apply.interface.as_str()])?;
                cmd("ifup", &[apply.interface.as_str()])?;
            }
            return Ok(());
        }

        Err("could not detect netplan or ifupdown configuration".into())
    }
}

impl PersistenceGateway for SystemGateway {
    fn apply_live(&mut self, apply: &Apply) -> MtuResult<()> {
        cmd("ip", &["link", "set", "dev", apply.interface.as_str(), "mtu", apply.mtu.to_string().as_str()])
            .map_err(|reason| MtuError::ApplyFailure {
                interface: apply.interface.clone(),
                mtu: apply.mtu,
                reason,
            })
    }

    fn persist(&mut self, apply: &Apply) -> MtuResult<()> {
        self.persist_inner(apply)
            .map_err(|reason| MtuError::PersistenceWriteFailure {
                interface: apply.interface.clone(),
                mtu: apply.mtu,
                reason,
            })
    }
}

/// Logs intents instead of touching the system.
#[derive(Default)]
pub struct DryRunGateway {
    pub applied: Vec<Apply>,
    pub persisted: Vec<Apply>,
}

impl PersistenceGateway for DryRunGateway {
    fn apply_live(&mut self, apply: &Apply) -> MtuResult<()> {
        info!("[dry run] ip link set dev {} mtu {}", apply.interface, apply.mtu);
        self.applied.push(apply.clone());
        Ok(())
    }

    fn persist(&mut self, apply: &Apply) -> MtuResult<()> {
        warn!("[dry run] not persisting MTU {} for {}", apply.mtu, apply.interface);
        self.persisted.push(apply.clone());
        Ok(())
    }
}
