//! String commands and pan coordinates accepted from the host API.

use crate::error::ZpdError;
use std::fmt;
use std::str::FromStr;

/// Lifecycle commands addressed to a canvas by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZpdCommand {
    /// Detach listeners, unwrap the group and forget the canvas.
    Destroy,
    /// Return the current matrix.
    Save,
    /// Animate back to zoom 1.
    Origin,
}

impl FromStr for ZpdCommand {
    type Err = ZpdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "destroy" => Ok(ZpdCommand::Destroy),
            "save" => Ok(ZpdCommand::Save),
            "origin" => Ok(ZpdCommand::Origin),
            other => Err(ZpdError::UnknownCommand(other.to_string())),
        }
    }
}

impl fmt::Display for ZpdCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ZpdCommand::Destroy => "destroy",
            ZpdCommand::Save => "save",
            ZpdCommand::Origin => "origin",
        };
        f.write_str(name)
    }
}

/// One coordinate of a `panTo` call.
///
/// Numbers are absolute translations. Strings starting with `+` or `-`
/// move relative to the current translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanCoord {
    Absolute(f64),
    Relative(f64),
}

impl PanCoord {
    /// The translation this coordinate asks for, given the current one.
    pub fn resolve(self, current: f64) -> f64 {
        match self {
            PanCoord::Absolute(value) => value,
            PanCoord::Relative(delta) => current + delta,
        }
    }

    /// Resolve an optional coordinate; a missing one keeps `current`.
    pub fn resolve_or_keep(coord: Option<PanCoord>, current: f64) -> f64 {
        coord.map_or(current, |c| c.resolve(current))
    }
}

impl From<f64> for PanCoord {
    fn from(value: f64) -> Self {
        PanCoord::Absolute(value)
    }
}

impl FromStr for PanCoord {
    type Err = ZpdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || ZpdError::InvalidPanCoord(s.to_string());
        let parse = |text: &str| -> Result<f64, ZpdError> {
            let value: f64 = text.trim().parse().map_err(|_| invalid())?;
            if value.is_finite() { Ok(value) } else { Err(invalid()) }
        };

        if let Some(rest) = trimmed.strip_prefix('+') {
            Ok(PanCoord::Relative(parse(rest)?))
        } else if let Some(rest) = trimmed.strip_prefix('-') {
            Ok(PanCoord::Relative(-parse(rest)?))
        } else {
            Ok(PanCoord::Absolute(parse(trimmed)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("destroy".parse::<ZpdCommand>().unwrap(), ZpdCommand::Destroy);
        assert_eq!(" save ".parse::<ZpdCommand>().unwrap(), ZpdCommand::Save);
        assert_eq!("origin".parse::<ZpdCommand>().unwrap(), ZpdCommand::Origin);
        assert!(matches!("explode".parse::<ZpdCommand>(), Err(ZpdError::UnknownCommand(_))));
    }

    #[test]
    fn test_relative_coords() {
        assert_eq!("+10".parse::<PanCoord>().unwrap(), PanCoord::Relative(10.0));
        assert_eq!("-2.5".parse::<PanCoord>().unwrap(), PanCoord::Relative(-2.5));
        assert_eq!("+10".parse::<PanCoord>().unwrap().resolve(5.0), 15.0);
        assert_eq!("-10".parse::<PanCoord>().unwrap().resolve(5.0), -5.0);
    }

    #[test]
    fn test_absolute_coords() {
        assert_eq!("42".parse::<PanCoord>().unwrap(), PanCoord::Absolute(42.0));
        assert_eq!(PanCoord::from(7.0).resolve(100.0), 7.0);
        assert_eq!(PanCoord::resolve_or_keep(None, 3.0), 3.0);
    }

    #[test]
    fn test_bad_coords() {
        for input in ["", "+", "abc", "+x", "NaN", "+inf"] {
            assert!(input.parse::<PanCoord>().is_err(), "{:?} should not parse", input);
        }
    }
}
