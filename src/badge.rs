use crate::score::factors::Grade;

/// Badge dimensions in px
pub const BADGE_WIDTH: u32 = 150;
pub const BADGE_HEIGHT: u32 = 20;
const LABEL_WIDTH: u32 = 80;

const LABEL: &str = "trust score";

/// Fill color for a grade: green family for A+/A, yellow, orange, red for D/F
pub fn grade_color(grade: Grade) -> &'static str {
    match grade {
        Grade::APlus => "#44cc11",
        Grade::A => "#97ca00",
        Grade::B => "#dfb317",
        Grade::C => "#fe7d37",
        Grade::D | Grade::F => "#e05d44",
    }
}

/// Render a flat shields-style SVG badge, e.g. `trust score | A 84`
pub fn render_badge(grade: Grade, score: f64) -> String {
    let value_width = BADGE_WIDTH - LABEL_WIDTH;
    let value = format!("{} {:.0}", grade, score);
    let color = grade_color(grade);
    let label_x = LABEL_WIDTH / 2;
    let value_x = LABEL_WIDTH + value_width / 2;

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" role="img" aria-label="{label}: {value}">
  <title>{label}: {value}</title>
  <linearGradient id="s" x2="0" y2="100%">
    <stop offset="0" stop-color="#bbb" stop-opacity=".1"/>
    <stop offset="1" stop-opacity=".1"/>
  </linearGradient>
  <clipPath id="r"><rect width="{w}" height="{h}" rx="3" fill="#fff"/></clipPath>
  <g clip-path="url(#r)">
    <rect width="{lw}" height="{h}" fill="#555"/>
    <rect x="{lw}" width="{vw}" height="{h}" fill="{color}"/>
    <rect width="{w}" height="{h}" fill="url(#s)"/>
  </g>
  <g fill="#fff" text-anchor="middle" font-family="Verdana,Geneva,DejaVu Sans,sans-serif" font-size="11">
    <text x="{lx}" y="14">{label}</text>
    <text x="{vx}" y="14">{value}</text>
  </g>
</svg>
"##,
        w = BADGE_WIDTH,
        h = BADGE_HEIGHT,
        lw = LABEL_WIDTH,
        vw = value_width,
        lx = label_x,
        vx = value_x,
        label = LABEL,
        value = value,
        color = color,
    )
}
