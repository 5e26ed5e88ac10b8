use anyhow::{Context, bail};

/// One line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Paint { x: u32, y: u32, color: String },
    Click { px: f64, py: f64, color: String },
    Show,
    Palette,
    Help,
    Quit,
}

pub const HELP: &str = "commands:
  paint X Y COLOR   paint canvas cell (X, Y)
  click PX PY COLOR click at screen pixel (PX, PY)
  show              print the canvas
  palette           list palette colors
  quit              end the session";

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse_command(line: &str) -> anyhow::Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let parts: Vec<&str> = line.split_whitespace().collect();
    let cmd = match parts.as_slice() {
        ["paint", x, y, color] => Command::Paint {
            x: x.parse().with_context(|| format!("invalid column '{x}'"))?,
            y: y.parse().with_context(|| format!("invalid row '{y}'"))?,
            color: color.to_string(),
        },
        ["click", px, py, color] => Command::Click {
            px: px.parse().with_context(|| format!("invalid x position '{px}'"))?,
            py: py.parse().with_context(|| format!("invalid y position '{py}'"))?,
            color: color.to_string(),
        },
        ["show"] => Command::Show,
        ["palette"] => Command::Palette,
        ["help" | "?"] => Command::Help,
        ["quit" | "exit"] => Command::Quit,
        [name, ..] => bail!("unknown command or wrong arguments: '{name}' (try 'help')"),
        [] => return Ok(None),
    };
    Ok(Some(cmd))
}
