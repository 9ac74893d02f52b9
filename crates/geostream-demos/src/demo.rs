use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use winit::keyboard::KeyCode;

/// The demo scenes selectable from the command line or with keys `1`-`4`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum DemoKind {
    Lines,
    Textured,
    Grid,
    #[default]
    Targets,
}

impl DemoKind {
    pub const ALL: [DemoKind; 4] = [
        DemoKind::Lines,
        DemoKind::Textured,
        DemoKind::Grid,
        DemoKind::Targets,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DemoKind::Lines => "lines",
            DemoKind::Textured => "textured",
            DemoKind::Grid => "grid",
            DemoKind::Targets => "targets",
        }
    }

    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::Digit1 | KeyCode::Numpad1 => Some(DemoKind::Lines),
            KeyCode::Digit2 | KeyCode::Numpad2 => Some(DemoKind::Textured),
            KeyCode::Digit3 | KeyCode::Numpad3 => Some(DemoKind::Grid),
            KeyCode::Digit4 | KeyCode::Numpad4 => Some(DemoKind::Targets),
            _ => None,
        }
    }

    pub fn window_title(self) -> String {
        format!("geostream: {self} (1-4 switch, Esc quit)")
    }
}

impl fmt::Display for DemoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DemoKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match Self::ALL.into_iter().find(|k| k.name().eq_ignore_ascii_case(s)) {
            Some(kind) => Ok(kind),
            None => bail!("unknown demo `{s}` (expected one of: lines, textured, grid, targets)"),
        }
    }
}

/// Picks the initial demo from the arguments following the program name.
pub fn parse_args<I>(mut args: I) -> anyhow::Result<DemoKind>
where
    I: Iterator<Item = String>,
{
    let kind = match args.next() {
        Some(arg) => arg.parse()?,
        None => DemoKind::default(),
    };
    if let Some(extra) = args.next() {
        bail!("unexpected argument `{extra}`");
    }
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> std::vec::IntoIter<String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn defaults_to_targets() {
        assert_eq!(parse_args(args(&[])).unwrap(), DemoKind::Targets);
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!(parse_args(args(&["grid"])).unwrap(), DemoKind::Grid);
        assert_eq!(parse_args(args(&["Lines"])).unwrap(), DemoKind::Lines);
    }

    #[test]
    fn rejects_unknown_and_extra_args() {
        assert!(parse_args(args(&["sprites"])).is_err());
        assert!(parse_args(args(&["grid", "lines"])).is_err());
    }

    #[test]
    fn digit_keys_map_in_order() {
        let keys = [KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3, KeyCode::Digit4];
        let kinds: Vec<_> = keys.into_iter().filter_map(DemoKind::from_key).collect();
        assert_eq!(kinds, DemoKind::ALL);
        assert_eq!(DemoKind::from_key(KeyCode::KeyA), None);
    }

    #[test]
    fn names_round_trip_through_display() {
        for kind in DemoKind::ALL {
            assert_eq!(kind.to_string().parse::<DemoKind>().unwrap(), kind);
        }
    }
}
