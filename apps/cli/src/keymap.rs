//! Shell 输入解析
//!
//! 单字符小键盘按键映射到一次短时运动；也接受带名字的命令。
//!
//! ```text
//!  7 wrist up     8 shoulder fwd + elbow up    9 elbow up
//!  4 base ccw     5 stop                       6 base cw
//!  1 wrist down   2 shoulder back + elbow down 3 elbow down
//!  0 shoulder fwd . shoulder back
//!  + grip open    - grip close   * light on    / light off
//! ```

use anyhow::{Result, bail};
use robotarm_driver::{Light, MotionFlags};
use std::time::Duration;

/// 一行输入对应的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellAction {
    /// 定时运动；`duration` 为 `None` 时使用默认步长
    Move {
        motions: MotionFlags,
        duration: Option<Duration>,
    },
    Stop,
    Light(Light),
    Status,
    Help,
    Quit,
}

/// 小键盘按键
pub fn key_action(key: char) -> Option<ShellAction> {
    let motions = match key {
        '8' => MotionFlags::SHOULDER_FWD | MotionFlags::ELBOW_UP,
        '2' => MotionFlags::SHOULDER_BACK | MotionFlags::ELBOW_DOWN,
        '4' => MotionFlags::BASE_CCW,
        '6' => MotionFlags::BASE_CW,
        '7' => MotionFlags::WRIST_UP,
        '1' => MotionFlags::WRIST_DOWN,
        '9' => MotionFlags::ELBOW_UP,
        '3' => MotionFlags::ELBOW_DOWN,
        '0' => MotionFlags::SHOULDER_FWD,
        '.' => MotionFlags::SHOULDER_BACK,
        '+' => MotionFlags::GRIP_OPEN,
        '-' => MotionFlags::GRIP_CLOSE,
        '*' => return Some(ShellAction::Light(Light::On)),
        '/' => return Some(ShellAction::Light(Light::Off)),
        'q' | 'Q' => return Some(ShellAction::Quit),
        '5' => return Some(ShellAction::Stop),
        _ => return None,
    };
    Some(ShellAction::Move { motions, duration: None })
}

/// 解析一行输入
pub fn parse_line(line: &str) -> Result<ShellAction> {
    let line = line.trim();

    let mut chars = line.chars();
    if let (Some(key), None) = (chars.next(), chars.next())
        && let Some(action) = key_action(key)
    {
        return Ok(action);
    }

    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        bail!("Empty input");
    };
    let args: Vec<&str> = parts.collect();

    match (command.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("move", [flags]) => Ok(ShellAction::Move {
            motions: flags.parse()?,
            duration: None,
        }),
        ("move", [flags, ms]) => Ok(ShellAction::Move {
            motions: flags.parse()?,
            duration: Some(Duration::from_millis(ms.parse()?)),
        }),
        ("move", _) => bail!("Usage: move <FLAGS> [MS]"),
        ("stop", []) => Ok(ShellAction::Stop),
        ("light", [state]) => Ok(ShellAction::Light(state.parse()?)),
        ("light", _) => bail!("Usage: light on|off"),
        ("status", []) => Ok(ShellAction::Status),
        ("help" | "?", []) => Ok(ShellAction::Help),
        ("quit" | "exit", []) => Ok(ShellAction::Quit),
        (other, _) => bail!("Unknown command: '{}' (type 'help')", other),
    }
}

pub const HELP: &str = "\
Keypad (each motion key moves for one step):
  7 wrist up     8 shoulder fwd + elbow up     9 elbow up
  4 base ccw     5 stop                        6 base cw
  1 wrist down   2 shoulder back + elbow down  3 elbow down
  0 shoulder fwd         . shoulder back
  + grip open            - grip close
  * light on             / light off           q quit

Commands:
  move <FLAGS> [MS]   e.g. move base-cw|elbow-up 400
  stop
  light on|off
  status
  help
  quit

Ctrl-C stops the arm, Ctrl-D quits.";
