use std::io::{BufRead, Write};

use anyhow::Result;

use crate::config::{IpVersion, RunParams};
use crate::constants::{DEFAULT_TARGET, MAX_STEP};
use crate::error::MtuError;
use crate::store::ConfigStore;

/// Print `question`, read one line. EOF is an error, so a closed stdin never loops forever.
pub fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<String> {
    write!(output, "{question}")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        anyhow::bail!("unexpected end of input");
    }
    Ok(line.trim().to_string())
}

pub fn ask_ip_version<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<IpVersion> {
    writeln!(output, "\nSelect IP type:\n1- IPv4\n2- IPv6\n")?;
    loop {
        let answer = ask(input, output, "Enter choice [1-2]: ")?;
        match IpVersion::from_choice(&answer) {
            Some(v) => return Ok(v),
            None => writeln!(output, "Invalid choice. Please enter 1 or 2.")?,
        }
    }
}

pub fn ask_target<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<String> {
    let answer = ask(input, output,
                     &format!("Enter destination IP address (default: {DEFAULT_TARGET}): "))?;
    if answer.is_empty() {
        Ok(DEFAULT_TARGET.to_string())
    } else {
        Ok(answer)
    }
}

pub fn ask_step<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<u32> {
    loop {
        let answer = ask(input, output, &format!("Enter step size (1-{MAX_STEP}): "))?;
        match answer.parse::<u32>() {
            Ok(step) if (1..=MAX_STEP).contains(&step) => return Ok(step),
            _ => writeln!(output, "Invalid step size. Enter a number between 1 and {MAX_STEP}.")?,
        }
    }
}

/// y/N question, anything but "y"/"yes" is no
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<bool> {
    let answer = ask(input, output, &format!("{question} (y/N): "))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

/// Run parameters given on the command line
#[derive(Debug, Clone, Default)]
pub struct ParamFlags {
    /// Take everything not given from the store instead of asking
    pub unattended: bool,
    pub protocol: Option<IpVersion>,
    pub target: Option<String>,
    pub step: Option<u32>,
}

/// Flags win over saved values. Unattended runs without saved parameters fail
/// with `ConfigLoadFailure`; interactive runs ask for whatever is missing.
pub fn resolve_params<S, R, W>(flags: &ParamFlags, store: &S,
                               input: &mut R, output: &mut W) -> Result<RunParams>
where S: ConfigStore + ?Sized, R: BufRead, W: Write {
    if flags.unattended {
        let saved = store.load_params()
            .map_err(|e| MtuError::ConfigLoadFailure(e.to_string()))?
            .ok_or_else(|| MtuError::ConfigLoadFailure(
                "no saved parameters, run interactively once first".into()))?;
        return Ok(RunParams {
            ip_version: flags.protocol.unwrap_or(saved.ip_version),
            target: flags.target.clone().unwrap_or(saved.target),
            step: flags.step.unwrap_or(saved.step),
        });
    }

    let ip_version = match flags.protocol {
        Some(v) => v,
        None => ask_ip_version(input, output)?,
    };
    let target = match &flags.target {
        Some(t) => t.clone(),
        None => ask_target(input, output)?,
    };
    let step = match flags.step {
        Some(s) => s,
        None => ask_step(input, output)?,
    };
    Ok(RunParams { ip_version, target, step })
}
