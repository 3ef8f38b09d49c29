use colored::Color;

pub const ACCENT: Color = Color::BrightYellow;
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;
pub const IPV4_ADDR: Color = Color::BrightCyan;
pub const MAC_ADDR: Color = Color::Magenta;

pub const HEALTHY: Color = Color::Green;
pub const DEGRADED: Color = Color::Yellow;
pub const DOWN: Color = Color::Red;
pub const UNKNOWN: Color = Color::BrightBlack;
