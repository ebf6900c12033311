use ratatui::style::Color;

pub const BG: Color = Color::Rgb(11, 14, 19);
pub const TEXT: Color = Color::Rgb(226, 231, 238);
pub const MUTED: Color = Color::Rgb(119, 131, 149);
pub const ACCENT: Color = Color::Rgb(105, 138, 255);
pub const HEADING: Color = Color::Rgb(212, 171, 255);
pub const OPEN: Color = Color::Rgb(74, 222, 128);
pub const CLOSED: Color = Color::Rgb(192, 153, 255);
pub const DANGER: Color = Color::Rgb(234, 92, 124);
pub const CODE_FG: Color = Color::Rgb(180, 223, 164);
pub const CODE_BG: Color = Color::Rgb(20, 26, 34);
pub const BORDER: Color = Color::Rgb(35, 50, 88);
pub const BORDER_FOCUS: Color = Color::Rgb(105, 138, 255);
pub const SELECTED_BG: Color = Color::Rgb(12, 24, 54);
