//! Target configuration.
//!
//! A [`TargetConfig`] is built once when the backend is selected and never
//! changes afterwards. It can come from a preset, from the `with_*` builders,
//! or from a small `key = value` file:
//!
//! ```text
//! # Comments start with #
//! arg_regs = 2
//! pic = true
//! stack_alignment = 8
//! ```

use std::str::FromStr;

use crate::abi::{DEFAULT_STACK_ALIGNMENT, MAX_ARG_REGS};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetConfig {
    /// Number of registers (starting at a0) used to pass arguments.
    arg_regs: u8,
    /// Whether position-independent code is being generated.
    pic: bool,
    /// Stack alignment at call boundaries, in bytes.
    stack_alignment: u32,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self::bonjour()
    }
}

impl TargetConfig {
    /// Standard ABI: four argument registers, absolute addressing, 8-byte stack.
    #[must_use]
    pub const fn bonjour() -> Self {
        Self {
            arg_regs: MAX_ARG_REGS,
            pic: false,
            stack_alignment: DEFAULT_STACK_ALIGNMENT,
        }
    }

    /// Every argument is passed on the stack.
    #[must_use]
    pub const fn stack_args() -> Self {
        Self {
            arg_regs: 0,
            pic: false,
            stack_alignment: DEFAULT_STACK_ALIGNMENT,
        }
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Result<Self> {
        match name {
            "bonjour" | "default" => Ok(Self::bonjour()),
            "stack-args" => Ok(Self::stack_args()),
            _ => Err(Error::InvalidConfig(format!("unknown preset '{name}'"))),
        }
    }

    #[must_use]
    pub fn with_arg_regs(mut self, count: u8) -> Self {
        self.arg_regs = count;
        self
    }

    #[must_use]
    pub fn with_pic(mut self, pic: bool) -> Self {
        self.pic = pic;
        self
    }

    #[must_use]
    pub fn with_stack_alignment(mut self, bytes: u32) -> Self {
        self.stack_alignment = bytes;
        self
    }

    #[must_use]
    pub fn arg_regs(&self) -> u8 {
        self.arg_regs
    }

    #[must_use]
    pub fn pic(&self) -> bool {
        self.pic
    }

    #[must_use]
    pub fn stack_alignment(&self) -> u32 {
        self.stack_alignment
    }

    /// Check that the configuration describes a machine the backend can generate code for.
    pub fn validate(&self) -> Result<()> {
        if self.arg_regs > MAX_ARG_REGS {
            return Err(Error::InvalidConfig(format!(
                "arg_regs = {} exceeds the {MAX_ARG_REGS} argument registers (a0-a3)",
                self.arg_regs
            )));
        }
        if !matches!(self.stack_alignment, 4 | 8) {
            return Err(Error::InvalidConfig(format!(
                "stack_alignment = {} must be 4 or 8",
                self.stack_alignment
            )));
        }
        Ok(())
    }
}

impl FromStr for TargetConfig {
    type Err = Error;

    /// Parse a configuration file on top of the default preset.
    fn from_str(contents: &str) -> Result<Self> {
        let mut config = Self::default();

        for (line_num, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line_no = line_num + 1;

            let (key, value) = line.split_once('=').ok_or_else(|| Error::Parse {
                line: line_no,
                message: "invalid format, expected 'key = value'".to_string(),
            })?;
            let key = key.trim();
            let value = value.trim();

            config = match key {
                "preset" => {
                    if config != Self::default() {
                        tracing::warn!(line = line_no, preset = value, "preset discards earlier settings");
                    }
                    Self::preset(value)?
                }
                "arg_regs" => config.with_arg_regs(parse_value(line_no, key, value)?),
                "pic" => config.with_pic(parse_value(line_no, key, value)?),
                "stack_alignment" => config.with_stack_alignment(parse_value(line_no, key, value)?),
                _ => {
                    return Err(Error::Parse {
                        line: line_no,
                        message: format!(
                            "unknown key '{key}', expected 'preset', 'arg_regs', 'pic', or 'stack_alignment'"
                        ),
                    });
                }
            };
            tracing::trace!(key, value, "target config entry");
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_value<T: FromStr>(line: usize, key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| Error::Parse {
        line,
        message: format!("invalid value '{value}' for '{key}'"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(TargetConfig::bonjour().validate().is_ok());
        assert!(TargetConfig::stack_args().validate().is_ok());
        assert_eq!(TargetConfig::stack_args().arg_regs(), 0);
        assert!(TargetConfig::preset("vax").is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let too_many = TargetConfig::bonjour().with_arg_regs(5);
        assert!(matches!(too_many.validate(), Err(Error::InvalidConfig(_))));

        let odd_stack = TargetConfig::bonjour().with_stack_alignment(6);
        assert!(matches!(odd_stack.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_parse_config_file() {
        let config: TargetConfig = "
            # two register ABI
            arg_regs = 2
            pic = true

            stack_alignment = 4
        "
        .parse()
        .expect("parse");
        assert_eq!(config.arg_regs(), 2);
        assert!(config.pic());
        assert_eq!(config.stack_alignment(), 4);
    }

    #[test]
    fn test_parse_config_reports_line() {
        let err = "pic = true\narg_regs: 2\n".parse::<TargetConfig>().unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));

        let err = "pic = maybe".parse::<TargetConfig>().unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));

        let err = "colour = blue".parse::<TargetConfig>().unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn test_parse_config_validates() {
        let err = "arg_regs = 9".parse::<TargetConfig>().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
